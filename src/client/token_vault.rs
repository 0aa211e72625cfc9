use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_ID_KEY: &str = "userId";
pub const LIKE_MARKS_KEY: &str = "tweet_likes";

/// Typed view over the client's `TokenStore`.
pub struct TokenVault {
    store: Arc<dyn TokenStore>,
}

impl TokenVault {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    fn read(&self, key: &str) -> Option<String> {
        self.store.get(key).filter(|value| !value.is_empty())
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.read(USER_ID_KEY)?.parse().ok()
    }

    /// Also caches the user id carried by the token, when it has one.
    pub fn set_access_token(&self, token: &str) -> Result<(), StoreError> {
        self.store.set(ACCESS_TOKEN_KEY, token)?;
        if let Some(user_id) = TokenPayload::decode(token).and_then(|payload| payload.id) {
            self.store.set(USER_ID_KEY, &user_id.to_string())?;
        }
        Ok(())
    }

    pub fn set_refresh_token(&self, token: &str) -> Result<(), StoreError> {
        self.store.set(REFRESH_TOKEN_KEY, token)
    }

    pub fn set_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), StoreError> {
        self.set_access_token(access_token)?;
        self.set_refresh_token(refresh_token)
    }

    /// Forgets the whole session. Like marks stay, they are keyed per user.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)?;
        self.store.remove(USER_ID_KEY)
    }

    fn like_marks_key(&self) -> String {
        match self.user_id() {
            Some(user_id) => format!("{LIKE_MARKS_KEY}_{user_id}"),
            None => LIKE_MARKS_KEY.to_string(),
        }
    }

    pub fn like_marks(&self) -> LikeMarks {
        let Some(raw) = self.read(&self.like_marks_key()) else {
            return LikeMarks::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "discarding unreadable like marks");
            LikeMarks::new()
        })
    }

    pub fn set_like_mark(&self, tweet_id: TweetId, liked: bool) -> Result<(), StoreError> {
        let mut marks = self.like_marks();
        if liked {
            marks.insert(tweet_id, true);
        } else {
            marks.remove(&tweet_id);
        }
        self.store
            .set(&self.like_marks_key(), &serde_json::to_string(&marks)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MemoryTokenStore;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

    fn token_for(user: UserId) -> String {
        let claims = AccessClaims {
            sub: user.to_string(),
            id: user,
            exp: 4_000_000_000,
            iat: 0,
            jti: "j".to_string(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"k"),
        )
        .unwrap()
    }

    #[test]
    fn setting_access_token_caches_user_id() {
        let vault = TokenVault::new(Arc::new(MemoryTokenStore::new()));
        let user = UserId(uuid::Uuid::new_v4());

        vault.set_tokens(&token_for(user), "refresh").unwrap();

        assert_eq!(vault.user_id(), Some(user));
        assert_eq!(vault.refresh_token().as_deref(), Some("refresh"));
    }

    #[test]
    fn clear_removes_tokens_and_user() {
        let store = Arc::new(MemoryTokenStore::new());
        let vault = TokenVault::new(store.clone());
        vault
            .set_tokens(&token_for(UserId(uuid::Uuid::new_v4())), "r")
            .unwrap();

        vault.clear().unwrap();

        assert!(vault.access_token().is_none());
        assert!(vault.refresh_token().is_none());
        assert!(vault.user_id().is_none());
    }

    #[test]
    fn empty_values_read_as_absent() {
        let store = Arc::new(MemoryTokenStore::new());
        store.set(REFRESH_TOKEN_KEY, "").unwrap();
        let vault = TokenVault::new(store);
        assert!(vault.refresh_token().is_none());
    }

    #[test]
    fn like_marks_are_namespaced_per_user() {
        let store = Arc::new(MemoryTokenStore::new());
        let vault = TokenVault::new(store.clone());
        let tweet = TweetId(uuid::Uuid::new_v4());

        vault.set_like_mark(tweet, true).unwrap();
        assert!(store.get(LIKE_MARKS_KEY).is_some());

        let user = UserId(uuid::Uuid::new_v4());
        vault.set_access_token(&token_for(user)).unwrap();
        assert!(vault.like_marks().is_empty());

        vault.set_like_mark(tweet, true).unwrap();
        let key = format!("{LIKE_MARKS_KEY}_{user}");
        let raw = store.get(&key).unwrap();
        assert_eq!(raw, format!("{{\"{tweet}\":true}}"));

        vault.set_like_mark(tweet, false).unwrap();
        assert_eq!(store.get(&key).unwrap(), "{}");
    }
}
