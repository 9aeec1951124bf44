//! Request vocabulary and the per-endpoint response register.

use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use tracing::trace;

use crate::value::{CallArgs, ObjectIndex, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Create { args: CallArgs },
    Modify { index: ObjectIndex, attr: String, value: Value },
    ReadAttrs { index: ObjectIndex, names: Vec<String> },
    Invoke { index: ObjectIndex, method: String, args: CallArgs },
    Delete { index: ObjectIndex },
    /// Answered once every earlier request of the endpoint has been served.
    Flush,
}

impl Request {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Modify { .. } => "modify",
            Self::ReadAttrs { .. } => "read",
            Self::Invoke { .. } => "invoke",
            Self::Delete { .. } => "delete",
            Self::Flush => "flush",
        }
    }

    pub fn index(&self) -> Option<ObjectIndex> {
        match self {
            Self::Modify { index, .. }
            | Self::ReadAttrs { index, .. }
            | Self::Invoke { index, .. }
            | Self::Delete { index } => Some(*index),
            Self::Create { .. } | Self::Flush => None,
        }
    }

    /// Whether the requester waits for an answer.
    pub fn expects_response(&self) -> bool {
        !matches!(self, Self::Modify { .. } | Self::Delete { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Created { index: ObjectIndex },
    Values(Vec<Value>),
    Returned(Value),
    Flushed,
}

/// The owner failed to serve a request. Carries no detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpaqueFault;

pub type Response = Result<Payload, OpaqueFault>;

#[derive(Debug)]
struct Delivery {
    seq: u64,
    response: Response,
}

/// One-slot register holding at most one undelivered response.
#[derive(Debug)]
pub struct ResponseSlot {
    tx: Sender<Delivery>,
    rx: Receiver<Delivery>,
}

impl Default for ResponseSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSlot {
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }

    /// Empties the slot and returns how many stale responses were dropped.
    pub fn reset(&self) -> usize {
        self.rx.try_iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Writer the owner uses to answer the request tagged `seq`.
    pub fn writer(&self, seq: u64) -> SlotWriter {
        SlotWriter {
            seq,
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }

    /// Blocks until the response tagged `seq` arrives or `deadline` passes.
    ///
    /// Responses to earlier requests are dropped on the way.
    pub fn wait(&self, seq: u64, deadline: Instant) -> Option<Response> {
        loop {
            match self.rx.recv_deadline(deadline) {
                Ok(delivery) if delivery.seq == seq => return Some(delivery.response),
                Ok(stale) => {
                    trace!(expected = seq, stale = stale.seq, "dropped late response");
                },
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

/// Owner-side handle for exactly one response.
#[derive(Debug)]
pub struct SlotWriter {
    seq: u64,
    tx: Sender<Delivery>,
    rx: Receiver<Delivery>,
}

impl SlotWriter {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Stores the response without blocking. A stale response still sitting
    /// in the slot is evicted.
    pub fn deliver(self, response: Response) {
        let mut delivery = Delivery {
            seq: self.seq,
            response,
        };
        loop {
            match self.tx.try_send(delivery) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    if let Ok(evicted) = self.rx.try_recv() {
                        trace!(seq = self.seq, evicted = evicted.seq, "evicted stale response");
                    }
                    delivery = rejected;
                },
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}
