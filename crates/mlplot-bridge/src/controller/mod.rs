//! Owns the bridge lifecycle: registers kinds, spawns the worker, runs the
//! owner loop on the calling thread and tears everything down.

pub(crate) mod handlers;
pub(crate) mod owner;
mod status;
mod worker;

use mlplot_runtime::{ActorRef, Mailbox, mailbox};
use tracing::{error, info};

pub use self::status::{ExitStatus, Failure, FailureOrigin, KindStatus, LifecycleState, OwnerStatus};
pub use self::worker::WorkerContext;

use self::handlers::stop::StopMessage;
use self::owner::OwnerLoop;
use crate::config::BridgeConfig;
use crate::endpoint::{Requester, Responder};
use crate::error::BridgeError;
use crate::object::ObjectFactory;
use crate::registry::Registry;

/// Ends a running owner loop from owner-side code or another thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    owner: ActorRef<OwnerLoop>,
}

impl StopHandle {
    /// Returns `false` if the loop has already closed.
    pub fn request_stop(&self, reason: impl Into<String>) -> bool {
        self.owner
            .cast(StopMessage {
                reason: reason.into(),
            })
            .is_ok()
    }
}

pub struct Controller {
    config: BridgeConfig,
    owner: ActorRef<OwnerLoop>,
    queue: Mailbox<OwnerLoop>,
    registries: Vec<Registry>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl Controller {
    pub fn new(config: BridgeConfig) -> Self {
        let (owner, queue) = mailbox::<OwnerLoop>();
        Self {
            config,
            owner,
            queue,
            registries: Vec::new(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Registers a kind and the factory that builds its objects.
    pub fn register_kind(
        &mut self,
        kind: impl Into<String>,
        factory: impl ObjectFactory,
    ) -> Result<&mut Self, BridgeError> {
        let kind = kind.into();
        if self.registries.iter().any(|registry| registry.kind() == kind) {
            return Err(BridgeError::DuplicateKind { kind });
        }
        self.registries.push(Registry::new(kind, factory));
        Ok(self)
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            owner: self.owner.clone(),
        }
    }

    /// Runs `driver` on a worker thread while serving its requests on the
    /// current thread, then tears down every registry.
    ///
    /// The loop ends when the driver returns or a stop is requested.
    pub fn run<F>(self, driver: F) -> ExitStatus
    where
        F: FnOnce(&WorkerContext) -> anyhow::Result<()> + Send + 'static,
    {
        let Self {
            config,
            owner,
            queue,
            registries,
        } = self;

        let mut requesters = Vec::with_capacity(registries.len());
        let mut responders = Vec::with_capacity(registries.len());
        for (kind_id, registry) in registries.into_iter().enumerate() {
            requesters.push(Requester::new(
                registry.kind(),
                kind_id,
                owner.clone(),
                config.request_timeout,
            ));
            responders.push(Responder::new(registry));
        }
        let mut owner_loop = OwnerLoop::new(responders);
        owner_loop.transition(LifecycleState::Running);

        let worker = match worker::spawn_driver(&config, requesters, owner.clone(), driver) {
            Ok(worker) => worker,
            Err(source) => {
                let err = BridgeError::SpawnWorker { source };
                error!(error = %err, "bridge could not start");
                owner_loop.record_failure(Failure::driver(err.to_string()));
                let status = owner_loop.finish(mlplot_runtime::LoopExit::Stopped);
                owner_loop.teardown();
                return status;
            },
        };
        drop(owner);

        let exit = queue.run(&mut owner_loop);
        info!(?exit, pending = queue.pending(), "owner loop exited");
        let status = owner_loop.finish(exit);
        owner_loop.teardown();
        drop(queue);
        worker::join_worker(worker, config.worker_join_timeout);
        status
    }
}

#[cfg(test)]
#[path = "../tests/controller/lifecycle_integration.rs"]
mod lifecycle_integration;
