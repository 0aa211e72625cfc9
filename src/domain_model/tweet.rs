use crate::domain_model::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TweetId(pub uuid::Uuid);

impl fmt::Display for TweetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TweetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(TweetId)
    }
}

/// Server-side tweet with its materialized like counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tweet {
    pub id: TweetId,
    pub likes_count: u64,
}

impl Tweet {
    pub fn new(id: TweetId) -> Self {
        Self { id, likes_count: 0 }
    }

    pub fn like(&mut self) {
        self.likes_count = self.likes_count.saturating_add(1);
    }

    /// No-op at zero, so duplicated or reordered unlike events cannot go negative.
    pub fn unlike(&mut self) {
        self.likes_count = self.likes_count.saturating_sub(1);
    }
}

/// Authoritative counter pushed through the hub after every like change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeCountUpdate {
    pub tweet_id: TweetId,
    pub likes_count: u64,
    pub triggered_by: UserId,
}

/// Per-user local cache of liked tweets. Absence means "not liked".
pub type LikeMarks = BTreeMap<TweetId, bool>;

/// Builds the hub topic for like updates from a public origin.
///
/// Default ports are dropped so that `https://host:443` and `https://host`
/// name the same topic.
pub fn likes_topic(origin: &str) -> String {
    let origin = origin.trim_end_matches('/');
    let (scheme, rest) = origin.split_once("://").unwrap_or(("https", origin));
    let authority = rest.split('/').next().unwrap_or(rest);

    let authority = match (scheme, authority.rsplit_once(':')) {
        ("https", Some((host, "443"))) | ("http", Some((host, "80"))) => host,
        _ => authority,
    };

    format!("{scheme}://{authority}/tweets/likes")
}
