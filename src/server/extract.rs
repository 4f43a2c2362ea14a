// src/server/extract.rs

use axum::extract::{FromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::Deserialize;

use crate::errors::RunboxError;
use crate::server::AppState;
use crate::types::OwnerId;

/// The authenticated caller.
///
/// Taken from `Authorization: Bearer <token>`, or from `?token=` for clients
/// (browser WebSockets) that cannot set headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub OwnerId);

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl FromRequestParts<AppState> for Owner {
    type Rejection = RunboxError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| {
                Query::<TokenQuery>::try_from_uri(&parts.uri)
                    .ok()
                    .and_then(|Query(q)| q.token)
                    .filter(|t| !t.is_empty())
            })
            .ok_or_else(|| RunboxError::Unauthorized("Please authenticate".to_string()))?;

        state.identity.owner_of(&token).map(Owner)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}
