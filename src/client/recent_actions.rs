use crate::domain_model::TweetId;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_ECHO_WINDOW: Duration = Duration::from_millis(2000);

/// Tweets this client toggled a moment ago, used to recognise the push echo
/// of its own action.
pub struct RecentActions {
    marks: DashMap<TweetId, Instant>,
    ttl: Duration,
}

impl RecentActions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            marks: DashMap::new(),
            ttl,
        }
    }

    /// Records a toggle on `tweet_id` and drops every expired marker.
    pub fn mark(&self, tweet_id: TweetId) {
        let now = Instant::now();
        self.marks.retain(|_, at| now.duration_since(*at) < self.ttl);
        self.marks.insert(tweet_id, now);
    }

    /// True while the marker is younger than the ttl. Stale markers are dropped.
    pub fn is_recent(&self, tweet_id: TweetId) -> bool {
        let now = Instant::now();
        let fresh = self
            .marks
            .get(&tweet_id)
            .is_some_and(|at| now.duration_since(*at) < self.ttl);
        if !fresh {
            self.marks.remove_if(&tweet_id, |_, at| now.duration_since(*at) >= self.ttl);
        }
        fresh
    }
}

impl Default for RecentActions {
    fn default() -> Self {
        Self::new(DEFAULT_ECHO_WINDOW)
    }
}
