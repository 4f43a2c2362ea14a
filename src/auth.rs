// src/auth.rs

//! Bearer-token identity.
//!
//! Tokens are HS256 JWTs whose subject is the owner id. Tokens minted by the
//! account service carry the owner in a `userId` claim instead of `sub`;
//! both are accepted.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{Result, RunboxError};
use crate::types::OwnerId;

/// Maps a bearer token to the owner it identifies.
pub trait IdentityService: Send + Sync {
    fn owner_of(&self, token: &str) -> Result<OwnerId>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(alias = "userId")]
    pub sub: String,
    pub exp: u64,
}

pub struct JwtIdentity {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentity {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Mint a token for `owner` valid for `ttl`.
    pub fn issue(&self, owner: &str, ttl: Duration) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| RunboxError::Other(e.into()))?;

        let claims = Claims {
            sub: owner.to_string(),
            exp: (now + ttl).as_secs(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| RunboxError::Other(e.into()))
    }
}

impl IdentityService for JwtIdentity {
    fn owner_of(&self, token: &str) -> Result<OwnerId> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!(error = %e, "rejecting bearer token");
            RunboxError::Unauthorized("Please authenticate".to_string())
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(RunboxError::Unauthorized(
                "token has no subject".to_string(),
            ));
        }

        Ok(data.claims.sub)
    }
}
