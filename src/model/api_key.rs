//! API key model.
//!
//! Keys are opaque bearer secrets. Only their SHA256 hash is stored; the
//! raw key is returned once, at creation.

use serde::{Deserialize, Serialize};

use super::{new_id, now_millis};
use crate::sync::content_hash;

/// Prefix that makes raw keys easy to recognize in configs and logs.
pub const KEY_PREFIX: &str = "hub_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub created_at: i64,
    pub last_used_at: Option<i64>,
}

impl ApiKey {
    /// Generate a key for `owner_id`, returning the record and the raw secret.
    #[must_use]
    pub fn generate(owner_id: &str, name: &str) -> (Self, String) {
        let raw = format!(
            "{KEY_PREFIX}{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        );
        let key = Self {
            id: new_id("key"),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            key_hash: hash_key(&raw),
            created_at: now_millis(),
            last_used_at: None,
        };
        (key, raw)
    }
}

/// Hash a raw key for lookup.
#[must_use]
pub fn hash_key(raw: &str) -> String {
    content_hash(raw.trim())
}
