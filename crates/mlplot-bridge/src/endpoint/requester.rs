use std::cell::Cell;
use std::fmt;
use std::time::{Duration, Instant};

use mlplot_runtime::ActorRef;
use tracing::{debug, warn};

use crate::channel::{OpaqueFault, Payload, Request, ResponseSlot, SlotWriter};
use crate::controller::handlers::bridge_request::BridgeRequestMessage;
use crate::controller::owner::{KindId, OwnerLoop};
use crate::error::{NoResponseReason, RemoteCallError};
use crate::value::{CallArgs, ObjectIndex, Value};

/// Worker-side half of an endpoint pair.
///
/// A requester is `Send` but not `Sync`: it may move to the worker thread
/// but cannot be shared, so each endpoint has at most one request in flight.
pub struct Requester {
    kind: String,
    kind_id: KindId,
    owner: ActorRef<OwnerLoop>,
    slot: ResponseSlot,
    seq: Cell<u64>,
    timeout: Cell<Duration>,
}

impl fmt::Debug for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requester")
            .field("kind", &self.kind)
            .field("seq", &self.seq.get())
            .field("timeout", &self.timeout.get())
            .finish()
    }
}

impl Requester {
    pub(crate) fn new(
        kind: impl Into<String>,
        kind_id: KindId,
        owner: ActorRef<OwnerLoop>,
        timeout: Duration,
    ) -> Self {
        Self {
            kind: kind.into(),
            kind_id,
            owner,
            slot: ResponseSlot::new(),
            seq: Cell::new(0),
            timeout: Cell::new(timeout),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn timeout(&self) -> Duration {
        self.timeout.get()
    }

    /// Applies to every request issued after this call.
    pub fn set_timeout(&self, timeout: Duration) {
        self.timeout.set(timeout);
    }

    pub fn create(&self, args: CallArgs) -> Result<ObjectIndex, RemoteCallError> {
        match self.round_trip(Request::Create { args })? {
            Payload::Created { index } => Ok(index),
            other => Err(self.unexpected("create", &other)),
        }
    }

    pub fn modify(
        &self,
        index: ObjectIndex,
        attr: impl Into<String>,
        value: Value,
    ) -> Result<(), RemoteCallError> {
        self.post(
            Request::Modify {
                index,
                attr: attr.into(),
                value,
            },
            None,
        )
    }

    /// Values come back in the order of `names`.
    pub fn read<I, S>(&self, index: ObjectIndex, names: I) -> Result<Vec<Value>, RemoteCallError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let expected = names.len();
        match self.round_trip(Request::ReadAttrs { index, names })? {
            Payload::Values(values) if values.len() == expected => Ok(values),
            other => Err(self.unexpected("read", &other)),
        }
    }

    pub fn invoke(
        &self,
        index: ObjectIndex,
        method: impl Into<String>,
        args: CallArgs,
    ) -> Result<Value, RemoteCallError> {
        let request = Request::Invoke {
            index,
            method: method.into(),
            args,
        };
        match self.round_trip(request)? {
            Payload::Returned(value) => Ok(value),
            other => Err(self.unexpected("invoke", &other)),
        }
    }

    pub fn delete(&self, index: ObjectIndex) -> Result<(), RemoteCallError> {
        self.post(Request::Delete { index }, None)
    }

    /// Waits until the owner has served every earlier request of this
    /// endpoint, including one-way ones.
    pub fn flush(&self) -> Result<(), RemoteCallError> {
        match self.round_trip(Request::Flush)? {
            Payload::Flushed => Ok(()),
            other => Err(self.unexpected("flush", &other)),
        }
    }

    fn round_trip(&self, request: Request) -> Result<Payload, RemoteCallError> {
        let operation = request.operation();
        let seq = self.seq.get().wrapping_add(1);
        self.seq.set(seq);
        let dropped = self.slot.reset();
        if dropped > 0 {
            debug!(kind = %self.kind, operation, dropped, "discarded late responses");
        }

        let timeout = self.timeout.get();
        let deadline = Instant::now() + timeout;
        self.post(request, Some(self.slot.writer(seq)))?;

        match self.slot.wait(seq, deadline) {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(OpaqueFault)) => Err(RemoteCallError::RemoteFailure {
                kind: self.kind.clone(),
                operation,
            }),
            None => {
                let timeout_ms = timeout.as_millis();
                warn!(kind = %self.kind, operation, timeout_ms, "no response from owner");
                Err(RemoteCallError::NoResponse {
                    kind: self.kind.clone(),
                    operation,
                    reason: NoResponseReason::TimedOut { timeout_ms },
                })
            },
        }
    }

    fn post(&self, request: Request, reply: Option<SlotWriter>) -> Result<(), RemoteCallError> {
        let operation = request.operation();
        self.owner
            .cast(BridgeRequestMessage {
                kind: self.kind_id,
                request,
                reply,
            })
            .map_err(|_| {
                debug!(kind = %self.kind, operation, "owner mailbox closed");
                RemoteCallError::NoResponse {
                    kind: self.kind.clone(),
                    operation,
                    reason: NoResponseReason::OwnerClosed,
                }
            })
    }

    fn unexpected(&self, operation: &'static str, payload: &Payload) -> RemoteCallError {
        warn!(kind = %self.kind, operation, ?payload, "unexpected response payload");
        RemoteCallError::RemoteFailure {
            kind: self.kind.clone(),
            operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use mlplot_runtime::mailbox;

    use super::Requester;
    use crate::controller::owner::OwnerLoop;
    use crate::error::{NoResponseReason, RemoteCallError};
    use crate::value::{CallArgs, ObjectIndex};

    const SHORT: Duration = Duration::from_millis(40);

    #[test]
    fn undrained_owner_yields_no_response_after_timeout() {
        let (owner, queue) = mailbox::<OwnerLoop>();
        let requester = Requester::new("figure", 0, owner, SHORT);

        let started = Instant::now();
        let err = requester
            .create(CallArgs::new())
            .expect_err("nobody serves the mailbox");
        assert!(started.elapsed() >= SHORT);
        assert_eq!(
            err,
            RemoteCallError::NoResponse {
                kind: "figure".to_string(),
                operation: "create",
                reason: NoResponseReason::TimedOut { timeout_ms: 40 },
            }
        );
        assert_eq!(queue.pending(), 1);
    }

    #[test]
    fn one_way_requests_return_immediately() {
        let (owner, queue) = mailbox::<OwnerLoop>();
        let requester = Requester::new("figure", 0, owner, Duration::from_secs(5));
        let started = Instant::now();
        requester
            .modify(ObjectIndex(0), "title", "a".into())
            .expect("modify is posted");
        requester.delete(ObjectIndex(0)).expect("delete is posted");
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(queue.pending(), 2);
    }

    #[test]
    fn closed_owner_is_reported_as_owner_closed() {
        let (owner, queue) = mailbox::<OwnerLoop>();
        drop(queue);
        let requester = Requester::new("axis", 1, owner, SHORT);
        let err = requester
            .invoke(ObjectIndex(0), "grid", CallArgs::new())
            .expect_err("mailbox is gone");
        assert!(matches!(
            err,
            RemoteCallError::NoResponse {
                reason: NoResponseReason::OwnerClosed,
                ..
            }
        ));
        assert!(requester.modify(ObjectIndex(0), "x", 1.into()).is_err());
    }

    #[test]
    fn timeout_override_applies_to_next_call() {
        let (owner, _queue) = mailbox::<OwnerLoop>();
        let requester = Requester::new("figure", 0, owner, Duration::from_secs(30));
        requester.set_timeout(SHORT);
        assert_eq!(requester.timeout(), SHORT);
        assert!(requester.flush().expect_err("no owner").is_no_response());
    }
}
