pub(crate) mod bridge_request;
pub(crate) mod driver_exited;
pub(crate) mod owner_status;
pub(crate) mod stop;
