use mlplot_runtime::{ActorContext, Handler, Message};
use tracing::info;

use crate::controller::owner::OwnerLoop;
use crate::controller::status::Failure;

#[derive(Debug)]
pub(crate) enum DriverOutcome {
    Returned,
    Failed(String),
    Panicked(String),
}

pub(crate) struct DriverExitedMessage {
    pub(crate) outcome: DriverOutcome,
}

impl Message for DriverExitedMessage {
    type Response = ();
}

impl Handler<DriverExitedMessage> for OwnerLoop {
    fn handle(&mut self, message: DriverExitedMessage, ctx: &mut ActorContext<Self>) {
        self.driver_exited = true;
        match message.outcome {
            DriverOutcome::Returned => info!("driver returned"),
            DriverOutcome::Failed(error) => {
                self.record_failure(Failure::driver(error));
            },
            DriverOutcome::Panicked(panic) => {
                self.record_failure(Failure::driver(format!("driver panicked: {panic}")));
            },
        }
        ctx.stop();
    }
}
