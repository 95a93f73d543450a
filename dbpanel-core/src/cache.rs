//! Session-scoped memoization of expensive server facts.
//!
//! Facts like the current user identity or whether the server runs on
//! Amazon RDS cost a round trip to compute and never change within one
//! login session. The cache stores them under stable string keys; once a
//! key is populated it is never silently recomputed, callers must
//! [`remove`](SessionCache::remove) it to force a fresh query.
//!
//! The cache belongs to a single facade, so entries never leak between
//! sessions or between connection roles.

use serde_json::Value;
use std::collections::HashMap;

/// Cache key for the `user@host` identity of the logged-in user.
pub const KEY_CURRENT_USER: &str = "current_user";
/// Cache key for the Amazon RDS detection result.
pub const KEY_IS_AMAZON_RDS: &str = "is_amazon_rds";
/// Cache key for the server's identifier case-folding mode.
pub const KEY_LOWER_CASE_TABLE_NAMES: &str = "lower_case_table_names";

/// Key/value store scoped to the lifetime of one database session.
#[derive(Debug, Default)]
pub struct SessionCache {
    entries: HashMap<String, Value>,
}

impl SessionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    /// Whether `key` has been populated.
    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes `key`, forcing the next read to recompute.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Drops every entry. Used on logout/session teardown.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
