use mlplot_runtime::{ActorContext, Handler, Message};
use tracing::info;

use crate::controller::owner::OwnerLoop;

pub(crate) struct StopMessage {
    pub(crate) reason: String,
}

impl Message for StopMessage {
    type Response = ();
}

impl Handler<StopMessage> for OwnerLoop {
    fn handle(&mut self, message: StopMessage, ctx: &mut ActorContext<Self>) {
        info!(reason = %message.reason, "owner loop stop requested");
        self.stop_requested = true;
        ctx.stop();
    }
}
