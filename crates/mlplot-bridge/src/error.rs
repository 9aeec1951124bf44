use std::fmt;

use thiserror::Error;

use crate::object::ObjectError;
use crate::proxy::MemberKind;
use crate::value::ObjectIndex;

/// Owner-side failure while the registry served a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No live entry at the given index.
    #[error("no live {kind} entry at index {index}")]
    NotFound { kind: String, index: ObjectIndex },
    /// The object itself rejected the request.
    #[error("{kind}[{index}]: {source}")]
    Object {
        kind: String,
        index: ObjectIndex,
        #[source]
        source: ObjectError,
    },
    /// The factory refused to construct a new entry.
    #[error("failed to create {kind}: {source}")]
    Factory {
        kind: String,
        #[source]
        source: ObjectError,
    },
    /// Object code panicked; the panic was contained.
    #[error("{kind} {operation} panicked: {message}")]
    Panicked {
        kind: String,
        operation: &'static str,
        message: String,
    },
}

/// Why a two-way request produced no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoResponseReason {
    TimedOut { timeout_ms: u128 },
    OwnerClosed,
}

impl fmt::Display for NoResponseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut { timeout_ms } => write!(f, "timed out after {timeout_ms}ms"),
            Self::OwnerClosed => f.write_str("owner loop closed"),
        }
    }
}

/// Worker-side outcome of a failed round trip.
///
/// The two variants are deliberately distinct: `RemoteFailure` means the
/// owner answered with an error, `NoResponse` means nothing arrived.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteCallError {
    #[error("remote error occurred during {kind} {operation}")]
    RemoteFailure { kind: String, operation: &'static str },
    #[error("no response to {kind} {operation}: {reason}")]
    NoResponse {
        kind: String,
        operation: &'static str,
        reason: NoResponseReason,
    },
}

impl RemoteCallError {
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, Self::RemoteFailure { .. })
    }

    pub fn is_no_response(&self) -> bool {
        matches!(self, Self::NoResponse { .. })
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::RemoteFailure { operation, .. } | Self::NoResponse { operation, .. } => operation,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Remote(#[from] RemoteCallError),
    #[error("no endpoint registered for kind '{kind}'")]
    UnknownKind { kind: String },
    #[error("endpoint serves '{actual}', proxy expects '{expected}'")]
    KindMismatch { expected: String, actual: String },
    #[error("{kind} has no member '{name}'")]
    UnknownMember { kind: String, name: String },
    #[error("{kind}.{name} is {actual}, not {expected}")]
    WrongMemberKind {
        kind: String,
        name: String,
        expected: MemberKind,
        actual: MemberKind,
    },
    #[error("descriptor of {kind}.{name} belongs to another proxy class")]
    ForeignProxy { kind: String, name: String },
    #[error("{kind}[{index}] was deleted")]
    Deleted { kind: String, index: ObjectIndex },
    #[error("failed to encode {kind}.{name}: {source}")]
    Encode {
        kind: String,
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode {kind}.{name}: {source}")]
    Decode {
        kind: String,
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProxyError {
    pub fn remote(&self) -> Option<&RemoteCallError> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }
}

/// Controller-level errors.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("object kind '{kind}' is already registered")]
    DuplicateKind { kind: String },
    #[error("failed to spawn worker thread: {source}")]
    SpawnWorker {
        #[source]
        source: std::io::Error,
    },
    #[error("driver failed: {message}")]
    DriverFailure { message: String },
    #[error("owner-side {operation} on {kind} failed: {message}")]
    OwnerFault {
        kind: String,
        operation: &'static str,
        message: String,
    },
}
