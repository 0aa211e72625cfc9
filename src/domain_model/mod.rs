mod connection;
mod session;
mod tweet;
mod user;

pub use connection::*;
pub use session::*;
pub use tweet::*;
pub use user::*;
