use mlplot_runtime::LoopExit;
use tracing::{debug, error, info};

use super::status::{ExitStatus, Failure, KindStatus, LifecycleState, OwnerStatus};
use crate::endpoint::Responder;

/// Position of a kind in registration order.
pub(crate) type KindId = usize;

/// State of the owner event loop: every responder plus the run's failure
/// record. Lives on the thread that called [`super::Controller::run`].
pub(crate) struct OwnerLoop {
    pub(super) responders: Vec<Responder>,
    pub(super) state: LifecycleState,
    pub(super) failure: Option<Failure>,
    pub(super) driver_exited: bool,
    pub(super) stop_requested: bool,
}

impl OwnerLoop {
    pub(super) fn new(responders: Vec<Responder>) -> Self {
        Self {
            responders,
            state: LifecycleState::Idle,
            failure: None,
            driver_exited: false,
            stop_requested: false,
        }
    }

    pub(super) fn transition(&mut self, next: LifecycleState) {
        if self.state == next {
            return;
        }
        info!(from = %self.state, to = %next, "bridge state changed");
        self.state = next;
    }

    /// Keeps the first failure of the run. Returns whether this one was kept.
    pub(super) fn record_failure(&mut self, failure: Failure) -> bool {
        if let Some(first) = &self.failure {
            debug!(first = %first, suppressed = %failure, "failure already recorded");
            return false;
        }
        error!(failure = %failure, "bridge failure recorded");
        self.failure = Some(failure);
        true
    }

    pub(super) fn status(&self) -> OwnerStatus {
        OwnerStatus {
            state: self.state,
            kinds: self
                .responders
                .iter()
                .map(|responder| KindStatus {
                    kind: responder.kind().to_string(),
                    live: responder.registry().len(),
                    current: responder.registry().current(),
                })
                .collect(),
            failure_recorded: self.failure.is_some(),
        }
    }

    /// Settles the exit status once the loop has returned.
    pub(super) fn finish(&mut self, exit: LoopExit) -> ExitStatus {
        match exit {
            LoopExit::Stopped => {},
            LoopExit::Disconnected => {
                if !self.driver_exited && !self.stop_requested {
                    self.record_failure(Failure::driver("worker exited without reporting"));
                }
            },
            LoopExit::Panicked => {
                self.record_failure(Failure::owner("owner loop", "dispatch", "handler panicked"));
            },
        }
        let status = match &self.failure {
            None => ExitStatus::Completed,
            Some(failure) => ExitStatus::Failed(failure.clone()),
        };
        self.transition(status.state());
        status
    }

    /// Destroys every live entry of every kind.
    pub(super) fn teardown(&mut self) {
        for responder in &mut self.responders {
            let destroyed = responder.registry_mut().destroy_all();
            debug!(kind = %responder.kind(), destroyed, "registry torn down");
        }
        self.transition(LifecycleState::TornDown);
    }
}
