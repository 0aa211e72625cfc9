mod broadcast_hub;
mod dispatcher;
mod like_broadcast_subscriber;
mod like_count_subscriber;
mod port;
mod server;
mod token_sweeper;

pub use broadcast_hub::*;
pub use dispatcher::*;
pub use like_broadcast_subscriber::*;
pub use like_count_subscriber::*;
pub use port::*;
pub use server::*;
pub use token_sweeper::*;
