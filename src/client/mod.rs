//! Client side of the session and like-sync protocol.

mod api_client;
mod api_error;
mod context;
mod like_board;
mod like_toggle;
mod realtime_sync;
mod recent_actions;
mod session_manager;
mod token_vault;

pub use api_client::*;
pub use api_error::*;
pub use context::*;
pub use like_board::*;
pub use like_toggle::*;
pub use realtime_sync::*;
pub use recent_actions::*;
pub use session_manager::*;
pub use token_vault::*;

#[cfg(test)]
pub(crate) mod test_support;
