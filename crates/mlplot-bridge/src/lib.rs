//! Drive single-threaded owner objects from a worker thread.
//!
//! The owner side registers object kinds with a [`Controller`] and runs its
//! event loop on the current thread. The driver function runs on a worker
//! thread and talks to owner objects only through proxies, which turn member
//! access into requests and block until the owner answers or the request
//! times out.

pub mod channel;
pub mod config;
pub mod controller;
pub mod endpoint;
pub mod error;
mod fault;
mod logging;
pub mod object;
pub mod proxy;
pub mod registry;
pub mod value;

pub use config::{BridgeConfig, default_request_timeout, set_default_request_timeout};
pub use controller::{
    Controller, ExitStatus, Failure, FailureOrigin, KindStatus, LifecycleState, OwnerStatus,
    StopHandle, WorkerContext,
};
pub use endpoint::Requester;
pub use error::{BridgeError, NoResponseReason, ProxyError, RegistryError, RemoteCallError};
pub use logging::init_tracing;
pub use object::{ObjectError, ObjectFactory, ObjectResult, RemoteObject};
pub use proxy::{Proxy, ProxyClass, ProxyContainer, ProxyHandle, ProxySchema};
pub use value::{CallArgs, Kwargs, ObjectIndex, Value, arg, decode, encode, opt_kwarg};
