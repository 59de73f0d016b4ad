use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, warn};

use super::AppContext;
use super::error::ApiError;
use crate::model::api_key::hash_key;
use crate::model::now_millis;

/// The identity behind an API key.
///
/// Taken from `Authorization: Bearer <key>` or `x-api-key: <key>`. Add it
/// as a handler parameter to require authentication.
#[derive(Debug, Clone)]
pub struct Caller {
    pub owner_id: String,
    pub api_key_id: String,
}

fn presented_key(parts: &Parts) -> Option<&str> {
    let bearer = parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let header = || {
        parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
    };
    bearer.or_else(header).map(str::trim).filter(|k| !k.is_empty())
}

impl FromRequestParts<Arc<AppContext>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let raw = presented_key(parts).ok_or_else(|| ApiError::unauthorized("API key required"))?;

        let key = ctx
            .store
            .find_api_key(&hash_key(raw))?
            .ok_or_else(|| ApiError::unauthorized("Invalid API key"))?;

        if let Err(e) = ctx.store.touch_api_key(&key.id, now_millis()) {
            warn!(key_id = %key.id, error = %e, "failed to record key use");
        }
        debug!(key_id = %key.id, owner = %key.owner_id, "authenticated");

        Ok(Self {
            owner_id: key.owner_id,
            api_key_id: key.id,
        })
    }
}
