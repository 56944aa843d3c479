mod models;
mod runner;
mod transport;

pub use models::{HttpCall, RawResponse, ResponseBody, ResponseEnvelope};
pub use runner::RequestExecutor;
#[cfg(feature = "cli")]
pub use transport::ReqwestTransport;
pub use transport::{HttpTransport, TransportError};

#[cfg(test)]
pub(crate) mod testing;
