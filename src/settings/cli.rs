use super::{Parser, Subcommand};
use crate::domain_model::{TweetId, UserId};

#[derive(Parser, Debug)]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API and the push hub (default).
    Serve,
    /// Open a session through the dev login endpoint and store it locally.
    Login {
        #[arg(long)]
        user: UserId,
    },
    /// Follow like counts for the given tweets until interrupted.
    Watch { tweets: Vec<TweetId> },
    /// Toggle the like on one tweet.
    Toggle { tweet: TweetId },
    /// Revoke the stored session and forget it.
    Logout,
}
