//! Bootstrap logging before settings are read, then reload the filter from them.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
