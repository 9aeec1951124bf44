use mlplot_runtime::{ActorContext, Handler, Message};

use crate::controller::owner::OwnerLoop;
use crate::controller::status::OwnerStatus;

pub(crate) struct OwnerStatusMessage;

impl Message for OwnerStatusMessage {
    type Response = OwnerStatus;
}

impl Handler<OwnerStatusMessage> for OwnerLoop {
    fn handle(
        &mut self,
        _message: OwnerStatusMessage,
        _ctx: &mut ActorContext<Self>,
    ) -> OwnerStatus {
        self.status()
    }
}
