//! Gateway pipeline types

mod error;
mod request;
mod response;

pub use error::PipelineError;
pub use request::GatewayRequest;
pub use response::GatewayResponse;
