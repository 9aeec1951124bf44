//! The requester/responder pair connecting one worker to one registry.

mod requester;
mod responder;

pub use requester::Requester;
pub use responder::Responder;
