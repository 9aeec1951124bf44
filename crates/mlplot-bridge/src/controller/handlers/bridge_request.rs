use mlplot_runtime::{ActorContext, Handler, Message};
use tracing::warn;

use crate::channel::{OpaqueFault, Request, SlotWriter};
use crate::controller::owner::{KindId, OwnerLoop};
use crate::controller::status::Failure;

pub(crate) struct BridgeRequestMessage {
    pub(crate) kind: KindId,
    pub(crate) request: Request,
    pub(crate) reply: Option<SlotWriter>,
}

impl Message for BridgeRequestMessage {
    type Response = ();
}

impl Handler<BridgeRequestMessage> for OwnerLoop {
    fn handle(&mut self, message: BridgeRequestMessage, _ctx: &mut ActorContext<Self>) {
        let BridgeRequestMessage {
            kind,
            request,
            reply,
        } = message;
        let operation = request.operation();
        let Some(responder) = self.responders.get_mut(kind) else {
            warn!(kind, operation, "request for unregistered kind");
            if let Some(reply) = reply {
                reply.deliver(Err(OpaqueFault));
            }
            return;
        };
        if let Some(err) = responder.respond(request, reply) {
            let kind = responder.kind().to_string();
            self.record_failure(Failure::owner(kind, operation, err.to_string()));
        }
    }
}
