//! Minimal typed actor runtime.
//!
//! An actor is plain state plus one [`actor::Handler`] impl per message type.
//! Any thread can post to it through an [`actor::ActorRef`]; the thread that
//! owns the actor drains its [`actor::Mailbox`] with [`actor::Mailbox::run`].

pub mod actor;

pub use actor::{
    Actor, ActorContext, ActorRef, CallError, CastError, Handler, LoopExit, Mailbox, Message,
    mailbox,
};
