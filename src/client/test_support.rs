use crate::client::*;
use crate::domain_model::*;
use crate::infra::*;
use crate::settings::Settings;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use std::sync::Arc;

pub fn access_token_for(user: UserId, expires_in_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = AccessClaims {
        sub: user.to_string(),
        id: user,
        exp: now + expires_in_secs,
        iat: now,
        jti: nanoid::nanoid!(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"test-only"),
    )
    .unwrap()
}

pub fn access_token_expiring_in(expires_in_secs: i64) -> String {
    access_token_for(UserId(uuid::Uuid::new_v4()), expires_in_secs)
}

/// A client over the given fake transport, with an in-memory store, a fake
/// push connector and a navigator that starts at `current_path`.
pub fn test_client(transport: Arc<FakeTransport>, current_path: &str) -> ClientContext {
    let mut settings = Settings::default();
    settings.client.base_url = "http://api.test".to_string();

    ClientContext::new(
        &settings,
        ClientPorts {
            store: Arc::new(MemoryTokenStore::new()),
            transport,
            connector: Arc::new(FakePushConnector::new()),
            navigator: Arc::new(HeadlessNavigator::new(current_path)),
        },
    )
}
