use std::fmt;
use std::marker::PhantomData;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

/// State owned by exactly one loop. Actors driven by [`Mailbox::run`] never
/// leave the thread that runs the loop, so they need not be `Send`.
pub trait Actor: 'static {}

impl<T> Actor for T where T: 'static {}

pub trait Message: Send + 'static {
    type Response: Send + 'static;
}

/// Per-loop control handed to every handler.
pub struct ActorContext<A: Actor> {
    stop_requested: bool,
    _marker: PhantomData<fn() -> A>,
}

impl<A: Actor> ActorContext<A> {
    fn new() -> Self {
        Self {
            stop_requested: false,
            _marker: PhantomData,
        }
    }

    /// Ends the loop once the current message has been handled.
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested
    }
}

pub trait Handler<M>: Actor + Sized
where
    M: Message,
{
    fn handle(&mut self, message: M, ctx: &mut ActorContext<Self>) -> M::Response;
}

trait Envelope<A: Actor>: Send + 'static {
    fn dispatch(self: Box<Self>, actor: &mut A, ctx: &mut ActorContext<A>);
}

struct Cast<M> {
    message: M,
}

impl<M, A> Envelope<A> for Cast<M>
where
    M: Message<Response = ()>,
    A: Handler<M>,
{
    fn dispatch(self: Box<Self>, actor: &mut A, ctx: &mut ActorContext<A>) {
        actor.handle(self.message, ctx);
    }
}

struct Call<M: Message> {
    message: M,
    reply: Sender<M::Response>,
}

impl<M, A> Envelope<A> for Call<M>
where
    M: Message,
    A: Handler<M>,
{
    fn dispatch(self: Box<Self>, actor: &mut A, ctx: &mut ActorContext<A>) {
        let response = actor.handle(self.message, ctx);
        // The caller may have timed out and dropped its receiver.
        let _ = self.reply.try_send(response);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastError {
    MailboxClosed,
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MailboxClosed => f.write_str("mailbox closed"),
        }
    }
}

impl std::error::Error for CastError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallError {
    MailboxClosed,
    Timeout,
    /// The loop dropped the message without answering it.
    ActorStopped,
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MailboxClosed => f.write_str("mailbox closed"),
            Self::Timeout => f.write_str("call timed out"),
            Self::ActorStopped => f.write_str("loop ended before replying"),
        }
    }
}

impl std::error::Error for CallError {}

/// Sending half of a mailbox. Cheap to clone and usable from any thread.
pub struct ActorRef<A: Actor> {
    tx: Sender<Box<dyn Envelope<A>>>,
}

impl<A: Actor> Clone for ActorRef<A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<A: Actor> fmt::Debug for ActorRef<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRef")
            .field("queued", &self.tx.len())
            .finish()
    }
}

impl<A: Actor> ActorRef<A> {
    /// Queues a one-way message.
    pub fn cast<M>(&self, message: M) -> Result<(), CastError>
    where
        M: Message<Response = ()>,
        A: Handler<M>,
    {
        self.tx
            .send(Box::new(Cast { message }))
            .map_err(|_| CastError::MailboxClosed)
    }

    /// Queues a message and blocks until it is answered or `timeout` passes.
    pub fn call<M>(&self, message: M, timeout: Duration) -> Result<M::Response, CallError>
    where
        M: Message,
        A: Handler<M>,
    {
        let (reply, response_rx) = crossbeam_channel::bounded(1);
        self.tx
            .send(Box::new(Call { message, reply }))
            .map_err(|_| CallError::MailboxClosed)?;
        response_rx.recv_timeout(timeout).map_err(|error| match error {
            RecvTimeoutError::Timeout => CallError::Timeout,
            RecvTimeoutError::Disconnected => CallError::ActorStopped,
        })
    }
}

/// Why [`Mailbox::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// A handler called [`ActorContext::stop`].
    Stopped,
    /// Every [`ActorRef`] was dropped and the queue is empty.
    Disconnected,
    /// A handler panicked; the envelope was discarded and the loop ended.
    Panicked,
}

/// Receiving half of an actor queue, drained by whichever thread calls
/// [`Mailbox::run`]. Dropping it closes the queue for all senders.
pub struct Mailbox<A: Actor> {
    rx: Receiver<Box<dyn Envelope<A>>>,
}

impl<A: Actor> Mailbox<A> {
    /// Dispatches queued messages to `actor` on the current thread, in the
    /// order they were sent, until a stop, disconnect or panic.
    pub fn run(&self, actor: &mut A) -> LoopExit {
        let mut ctx = ActorContext::<A>::new();
        while let Ok(envelope) = self.rx.recv() {
            let dispatched = catch_unwind(AssertUnwindSafe(|| envelope.dispatch(actor, &mut ctx)));
            if dispatched.is_err() {
                return LoopExit::Panicked;
            }
            if ctx.is_stop_requested() {
                return LoopExit::Stopped;
            }
        }
        LoopExit::Disconnected
    }

    /// Messages queued but not yet dispatched.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

pub fn mailbox<A: Actor>() -> (ActorRef<A>, Mailbox<A>) {
    let (tx, rx) = crossbeam_channel::unbounded::<Box<dyn Envelope<A>>>();
    (ActorRef { tx }, Mailbox { rx })
}
