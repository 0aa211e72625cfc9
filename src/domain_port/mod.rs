// client

mod http_transport;
mod navigator;
mod push_stream;
mod token_store;

pub use http_transport::*;
pub use navigator::*;
pub use push_stream::*;
pub use token_store::*;

// server

mod hub_publisher;
mod like_repo;
mod refresh_token_repo;
mod tweet_repo;

pub use hub_publisher::*;
pub use like_repo::*;
pub use refresh_token_repo::*;
pub use tweet_repo::*;
