mod like_repo_memory;
mod refresh_token_repo_memory;
mod tweet_repo_memory;

pub use like_repo_memory::*;
pub use refresh_token_repo_memory::*;
pub use tweet_repo_memory::*;
