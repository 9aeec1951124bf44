use std::cell::RefCell;
use std::rc::Rc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use mlplot_runtime::{ActorRef, CallError};
use tracing::{debug, info, warn};

use super::handlers::driver_exited::{DriverExitedMessage, DriverOutcome};
use super::handlers::owner_status::OwnerStatusMessage;
use super::owner::OwnerLoop;
use super::status::OwnerStatus;
use crate::config::BridgeConfig;
use crate::endpoint::Requester;
use crate::error::{NoResponseReason, ProxyError, RemoteCallError};
use crate::fault;
use crate::proxy::{ProxyClass, ProxySchema};

const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Everything the driver function can reach from the worker thread.
///
/// Built on the worker thread and never leaves it.
pub struct WorkerContext {
    requesters: Vec<Rc<Requester>>,
    classes: RefCell<Vec<Rc<ProxyClass>>>,
    owner: ActorRef<OwnerLoop>,
    status_timeout: Duration,
}

impl WorkerContext {
    fn new(
        requesters: Vec<Requester>,
        owner: ActorRef<OwnerLoop>,
        status_timeout: Duration,
    ) -> Self {
        Self {
            requesters: requesters.into_iter().map(Rc::new).collect(),
            classes: RefCell::new(Vec::new()),
            owner,
            status_timeout,
        }
    }

    /// Registered kind names in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> + '_ {
        self.requesters.iter().map(|requester| requester.kind())
    }

    pub fn requester(&self, kind: &str) -> Result<Rc<Requester>, ProxyError> {
        self.requesters
            .iter()
            .find(|requester| requester.kind() == kind)
            .cloned()
            .ok_or_else(|| ProxyError::UnknownKind {
                kind: kind.to_string(),
            })
    }

    /// Descriptor factory for `schema`, bound once per schema and context.
    ///
    /// Schemas are matched by kind and member table, so two schemas for the
    /// same kind each keep their own class.
    pub fn class(&self, schema: &'static ProxySchema) -> Result<Rc<ProxyClass>, ProxyError> {
        if let Some(class) = self.classes.borrow().iter().find(|class| {
            class.schema().kind == schema.kind && class.schema().members == schema.members
        }) {
            return Ok(Rc::clone(class));
        }
        let class = ProxyClass::bind(schema, self.requester(schema.kind)?)?;
        self.classes.borrow_mut().push(Rc::clone(&class));
        Ok(class)
    }

    /// Sets the timeout of every endpoint.
    pub fn set_timeout(&self, timeout: Duration) {
        for requester in &self.requesters {
            requester.set_timeout(timeout);
        }
    }

    /// Waits until the owner has served everything posted so far.
    pub fn flush_all(&self) -> Result<(), RemoteCallError> {
        for requester in &self.requesters {
            requester.flush()?;
        }
        Ok(())
    }

    pub fn owner_status(&self) -> Result<OwnerStatus, RemoteCallError> {
        self.owner
            .call(OwnerStatusMessage, self.status_timeout)
            .map_err(|err| {
                let reason = match err {
                    CallError::Timeout => NoResponseReason::TimedOut {
                        timeout_ms: self.status_timeout.as_millis(),
                    },
                    CallError::MailboxClosed | CallError::ActorStopped => {
                        NoResponseReason::OwnerClosed
                    },
                };
                RemoteCallError::NoResponse {
                    kind: "owner".to_string(),
                    operation: "status",
                    reason,
                }
            })
    }
}

pub(super) fn spawn_driver<F>(
    config: &BridgeConfig,
    requesters: Vec<Requester>,
    owner: ActorRef<OwnerLoop>,
    driver: F,
) -> std::io::Result<JoinHandle<()>>
where
    F: FnOnce(&WorkerContext) -> anyhow::Result<()> + Send + 'static,
{
    let status_timeout = config.status_timeout;
    thread::Builder::new()
        .name(config.worker_thread_name.clone())
        .spawn(move || {
            let outcome = {
                let ctx = WorkerContext::new(requesters, owner.clone(), status_timeout);
                info!(kinds = ?ctx.kinds().collect::<Vec<_>>(), "driver started");
                match fault::guard(|| driver(&ctx)) {
                    Ok(Ok(())) => DriverOutcome::Returned,
                    Ok(Err(err)) => DriverOutcome::Failed(format!("{err:#}")),
                    Err(panic) => DriverOutcome::Panicked(panic),
                }
            };
            if owner.cast(DriverExitedMessage { outcome }).is_err() {
                debug!("owner loop closed before the driver finished");
            }
        })
}

/// Joins the worker, detaching it if it is still busy after `timeout`.
pub(super) fn join_worker(handle: JoinHandle<()>, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            warn!(
                timeout_ms = timeout.as_millis(),
                "worker still running after teardown, detaching"
            );
            return;
        }
        thread::sleep(JOIN_POLL_INTERVAL);
    }
    if handle.join().is_err() {
        warn!("worker thread panicked outside the driver");
    }
}
