//! Client-side adapters for the ports in `domain_port`.

mod http_transport_fake;
mod http_transport_reqwest;
mod navigator_headless;
mod push_connector_fake;
mod push_connector_sse;
mod sse_decoder;
mod token_store_file;
mod token_store_memory;

pub use http_transport_fake::*;
pub use http_transport_reqwest::*;
pub use navigator_headless::*;
pub use push_connector_fake::*;
pub use push_connector_sse::*;
pub use sse_decoder::*;
pub use token_store_file::*;
pub use token_store_memory::*;
