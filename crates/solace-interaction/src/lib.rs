pub mod http_remote;
pub mod probe;

pub use crate::http_remote::HttpRemoteService;
pub use crate::probe::{EndpointHealth, EndpointProbe};
