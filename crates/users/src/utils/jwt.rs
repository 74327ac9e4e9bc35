//! Session token issuance and validation (HS256 JWT).

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use roster_config::AuthConfig;
use serde::{Deserialize, Serialize};

use crate::entities::Role;
use crate::types::{TokenError, TokenResult, UserId};

/// Default session lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub user_email: String,
    pub user_role: Role,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Random per-token id, empty for tokens minted without one
    #[serde(default)]
    pub jti: String,
}

impl Claims {
    /// `exp` strictly in the past.
    pub fn is_expired(&self) -> bool {
        self.exp < Utc::now().timestamp()
    }
}

/// Issues and checks session tokens for one application identity.
///
/// Validation never looks at `exp`; callers that care ask [`is_expired`]
/// separately, so an expired token can still be decoded.
///
/// [`is_expired`]: JwtManager::is_expired
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtManager {
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// Set a custom token lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn from_config(config: &AuthConfig, issuer: impl Into<String>) -> Self {
        Self::new(&config.jwt_secret, issuer).with_ttl(Duration::from_secs(config.token_ttl_seconds))
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a fresh token for the given identity.
    pub fn issue(&self, user_id: UserId, email: &str, role: Role) -> TokenResult<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);

        let claims = Claims {
            user_id,
            user_email: email.to_string(),
            user_role: role,
            iss: self.issuer.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| TokenError::TokenCreationFailed(err.to_string()))
    }

    /// Check signature, structure and issuer, and return the claims.
    pub fn validate(&self, token: &str) -> TokenResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| TokenError::InvalidToken(err.to_string()))
    }

    /// Validate, then compare `exp` against the current time.
    pub fn is_expired(&self, token: &str) -> TokenResult<bool> {
        Ok(self.validate(token)?.is_expired())
    }
}

impl fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
