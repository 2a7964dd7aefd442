//! Content-addressed cache of per-user recommendation results.
//!
//! Each user's entry is tagged with the hash of the [`Preferences`] it was
//! computed from. A lookup with different preferences misses, so an entry
//! goes stale exactly when the preferences change. There is no expiry.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::Preferences;

/// Lowercase hex SHA-256 of the preferences' JSON encoding.
///
/// Lists are hashed in the order given; reordering neighbourhoods changes
/// the hash.
pub fn preferences_hash(preferences: &Preferences) -> String {
    // Serializing plain owned fields into a Vec cannot fail.
    let encoded = serde_json::to_vec(preferences).unwrap_or_default();
    hex::encode(Sha256::digest(&encoded))
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    preferences_hash: String,
    value: T,
}

#[derive(Debug)]
pub struct RecommendationCache<T> {
    entries: RwLock<HashMap<i64, CacheEntry<T>>>,
}

impl<T: Clone> RecommendationCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached value for `user_id`, if it was computed from `preferences`.
    pub fn get(
        &self,
        user_id: i64,
        preferences: &Preferences,
    ) -> Option<T> {
        let hash = preferences_hash(preferences);
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match entries.get(&user_id) {
            Some(entry) if entry.preferences_hash == hash => Some(entry.value.clone()),
            Some(_) => {
                debug!(user_id, "recommendations stale, preferences changed");
                None
            }
            None => None,
        }
    }

    /// Stores `value` for `user_id`, replacing any previous entry.
    pub fn put(
        &self,
        user_id: i64,
        preferences: &Preferences,
        value: T,
    ) {
        let entry = CacheEntry {
            preferences_hash: preferences_hash(preferences),
            value,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id, entry);
    }

    /// Returns the cached value or computes, stores and returns a fresh one.
    pub fn get_or_insert_with<F>(
        &self,
        user_id: i64,
        preferences: &Preferences,
        compute: F,
    ) -> T
    where
        F: FnOnce() -> T,
    {
        if let Some(value) = self.get(user_id, preferences) {
            return value;
        }
        let value = compute();
        self.put(user_id, preferences, value.clone());
        value
    }

    pub fn invalidate(
        &self,
        user_id: i64,
    ) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user_id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for RecommendationCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
