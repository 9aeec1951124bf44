use thiserror::Error;

use crate::value::{CallArgs, ObjectIndex, Value};

/// Failure raised by an owner-side object.
///
/// These never cross the bridge. The responder logs them and the worker only
/// learns that its request failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    #[error("unknown attribute '{name}'")]
    UnknownAttribute { name: String },
    #[error("attribute '{name}' is read-only")]
    ReadOnlyAttribute { name: String },
    #[error("unknown method '{name}'")]
    UnknownMethod { name: String },
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },
    #[error("{0}")]
    Failed(String),
}

impl ObjectError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// A stateful object living on the owner thread.
///
/// Implementations are never touched from any other thread, so they are free
/// to hold `Rc`, `RefCell` and other thread-affine state.
pub trait RemoteObject: 'static {
    fn get_attr(&self, name: &str) -> Result<Value, ObjectError>;

    fn set_attr(&mut self, name: &str, value: Value) -> Result<(), ObjectError>;

    fn call_method(&mut self, name: &str, args: CallArgs) -> Result<Value, ObjectError>;

    /// Runs once, right before the registry drops the entry.
    fn teardown(&mut self) {}
}

/// What a factory hands back for a new entry.
pub type ObjectResult = Result<Box<dyn RemoteObject>, ObjectError>;

/// Builds owner objects for one kind.
pub trait ObjectFactory: 'static {
    fn create(&mut self, index: ObjectIndex, args: CallArgs) -> ObjectResult;
}

impl<F> ObjectFactory for F
where
    F: FnMut(ObjectIndex, CallArgs) -> ObjectResult + 'static,
{
    fn create(&mut self, index: ObjectIndex, args: CallArgs) -> ObjectResult {
        self(index, args)
    }
}
