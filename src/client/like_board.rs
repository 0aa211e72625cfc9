use crate::domain_model::*;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ButtonId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeButtonState {
    pub tweet_id: TweetId,
    pub liked: bool,
    pub count: u64,
    /// Set while a toggle request is in flight.
    pub disabled: bool,
    pub guest: bool,
}

impl LikeButtonState {
    pub fn new(tweet_id: TweetId, liked: bool, count: u64) -> Self {
        Self {
            tweet_id,
            liked,
            count,
            disabled: false,
            guest: false,
        }
    }
}

/// Every like button currently on screen. A tweet can be rendered more than
/// once, e.g. in a list and in a detail view.
#[derive(Default)]
pub struct LikeBoard {
    buttons: DashMap<ButtonId, LikeButtonState>,
    next_id: AtomicU64,
}

impl LikeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self, state: LikeButtonState) -> ButtonId {
        let id = ButtonId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.buttons.insert(id, state);
        id
    }

    pub fn remove(&self, id: ButtonId) -> Option<LikeButtonState> {
        self.buttons.remove(&id).map(|(_, state)| state)
    }

    pub fn get(&self, id: ButtonId) -> Option<LikeButtonState> {
        self.buttons.get(&id).map(|entry| entry.value().clone())
    }

    pub fn renderings_of(&self, tweet_id: TweetId) -> Vec<ButtonId> {
        let mut ids: Vec<ButtonId> = self
            .buttons
            .iter()
            .filter(|entry| entry.value().tweet_id == tweet_id)
            .map(|entry| *entry.key())
            .collect();
        ids.sort();
        ids
    }

    /// Runs `f` on one rendering under its shard lock and returns its result.
    pub fn update<R>(&self, id: ButtonId, f: impl FnOnce(&mut LikeButtonState) -> R) -> Option<R> {
        self.buttons.get_mut(&id).map(|mut entry| f(entry.value_mut()))
    }

    /// Writes an authoritative count to every rendering of the tweet.
    /// Returns how many renderings actually changed.
    pub fn apply_count(&self, tweet_id: TweetId, count: u64) -> usize {
        let mut changed = 0;
        for mut entry in self.buttons.iter_mut() {
            let state = entry.value_mut();
            if state.tweet_id == tweet_id && state.count != count {
                state.count = count;
                changed += 1;
            }
        }
        changed
    }

    /// Marks every rendering of a tweet found in `marks` as liked. A liked
    /// tweet shows at least one like; other counts are left alone.
    pub fn apply_liked_marks(&self, marks: &LikeMarks) {
        for mut entry in self.buttons.iter_mut() {
            let state = entry.value_mut();
            if marks.get(&state.tweet_id).copied().unwrap_or(false) {
                state.liked = true;
                state.count = state.count.max(1);
            }
        }
    }

    pub fn set_guest(&self, guest: bool) {
        for mut entry in self.buttons.iter_mut() {
            entry.value_mut().guest = guest;
        }
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }
}
