use crate::domain_model::UserId;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token. `id` duplicates `sub` so that clients can
/// read the user without knowing the subject format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub id: UserId,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// The part of an access token a client can read without the signing key.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPayload {
    pub exp: i64,
    #[serde(default)]
    pub id: Option<UserId>,
}

impl TokenPayload {
    /// Reads the payload without checking the signature or the expiry.
    /// Anything that is not a well-formed JWT with an `exp` claim yields `None`.
    pub fn decode(token: &str) -> Option<Self> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        jsonwebtoken::decode::<TokenPayload>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .map(|data| data.claims)
    }
}
