use std::fmt;

use crate::error::BridgeError;
use crate::value::ObjectIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Running,
    Completed,
    Failed,
    TornDown,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TornDown => "torn_down",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOrigin {
    /// The driver returned an error or panicked.
    Driver,
    /// A responder failed while serving a request.
    Owner { kind: String, operation: &'static str },
}

/// The single failure a run reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub origin: FailureOrigin,
    pub message: String,
}

impl Failure {
    pub fn driver(message: impl Into<String>) -> Self {
        Self {
            origin: FailureOrigin::Driver,
            message: message.into(),
        }
    }

    pub fn owner(
        kind: impl Into<String>,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            origin: FailureOrigin::Owner {
                kind: kind.into(),
                operation,
            },
            message: message.into(),
        }
    }

    pub fn into_error(self) -> BridgeError {
        match self.origin {
            FailureOrigin::Driver => BridgeError::DriverFailure {
                message: self.message,
            },
            FailureOrigin::Owner { kind, operation } => BridgeError::OwnerFault {
                kind,
                operation,
                message: self.message,
            },
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            FailureOrigin::Driver => write!(f, "driver: {}", self.message),
            FailureOrigin::Owner { kind, operation } => {
                write!(f, "{kind} {operation}: {}", self.message)
            },
        }
    }
}

/// Outcome of [`super::Controller::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Completed,
    Failed(Failure),
}

impl ExitStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Completed => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    pub fn state(&self) -> LifecycleState {
        match self {
            Self::Completed => LifecycleState::Completed,
            Self::Failed(_) => LifecycleState::Failed,
        }
    }

    pub fn into_result(self) -> Result<(), BridgeError> {
        match self {
            Self::Completed => Ok(()),
            Self::Failed(failure) => Err(failure.into_error()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindStatus {
    pub kind: String,
    pub live: usize,
    pub current: Option<ObjectIndex>,
}

/// Snapshot of the owner loop, answered between two requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerStatus {
    pub state: LifecycleState,
    pub kinds: Vec<KindStatus>,
    pub failure_recorded: bool,
}

impl OwnerStatus {
    pub fn kind(&self, kind: &str) -> Option<&KindStatus> {
        self.kinds.iter().find(|status| status.kind == kind)
    }

    pub fn live(&self, kind: &str) -> usize {
        self.kind(kind).map_or(0, |status| status.live)
    }
}
