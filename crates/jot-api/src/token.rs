use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use jot_types::api::Claims;

/// Tokens live for one hour from issuance.
const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("no token supplied")]
    Missing,
    #[error("token malformed or signature invalid")]
    Invalid,
    #[error("token expired")]
    Expired,
}

/// Stateless HS256 token issuance and verification. The signing secret is
/// handed in once at construction; rotating it invalidates every outstanding
/// token, which is the intended operational behavior.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Default leeway is 60s; expiry here is exact.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            iat: now as usize,
            exp: (now + TOKEN_TTL_SECS) as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Signature and expiry are the whole check — there is no revocation
    /// list. Expired is reported apart from Invalid so callers can log the
    /// difference, but both must surface identically to clients.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        Ok(data.claims.sub)
    }
}
