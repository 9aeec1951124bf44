use tracing::{debug, error};

use crate::channel::{OpaqueFault, Payload, Request, SlotWriter};
use crate::error::RegistryError;
use crate::fault;
use crate::registry::Registry;

/// Owner-side half of an endpoint pair: executes requests against one
/// registry and answers through the requester's slot.
pub struct Responder {
    registry: Registry,
}

impl Responder {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn kind(&self) -> &str {
        self.registry.kind()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Serves one request. Never panics and never blocks.
    ///
    /// Two-way requests get exactly one response. A failure is logged and
    /// returned so the caller can record it; the requester only sees an
    /// opaque fault.
    pub fn respond(
        &mut self,
        request: Request,
        reply: Option<SlotWriter>,
    ) -> Option<RegistryError> {
        let operation = request.operation();
        let index = request.index();
        let outcome = match fault::guard(|| self.execute(request)) {
            Ok(outcome) => outcome,
            Err(message) => Err(RegistryError::Panicked {
                kind: self.registry.kind().to_string(),
                operation,
                message,
            }),
        };

        match outcome {
            Ok(payload) => {
                debug!(kind = %self.registry.kind(), operation, ?index, "request served");
                if let Some(reply) = reply {
                    reply.deliver(Ok(payload));
                }
                None
            },
            Err(err) => {
                error!(
                    kind = %self.registry.kind(),
                    operation,
                    ?index,
                    error = %err,
                    "request failed on owner"
                );
                if let Some(reply) = reply {
                    reply.deliver(Err(OpaqueFault));
                }
                Some(err)
            },
        }
    }

    fn execute(&mut self, request: Request) -> Result<Payload, RegistryError> {
        match request {
            Request::Create { args } => self
                .registry
                .create(args)
                .map(|index| Payload::Created { index }),
            Request::Modify { index, attr, value } => self
                .registry
                .write(index, &attr, value)
                .map(|()| Payload::Flushed),
            Request::ReadAttrs { index, names } => {
                self.registry.read(index, &names).map(Payload::Values)
            },
            Request::Invoke {
                index,
                method,
                args,
            } => self
                .registry
                .invoke(index, &method, args)
                .map(Payload::Returned),
            Request::Delete { index } => self.registry.destroy(index).map(|()| Payload::Flushed),
            Request::Flush => Ok(Payload::Flushed),
        }
    }
}
