//! Cross-application shared state: a process-wide keyed store readable
//! and writable by the shell and every mounted screen.
//!
//! Writes are whole-value replacements per key, last writer wins. There
//! is no deeper merge; callers wanting one read, modify and write back.
//! The store is passed explicitly into the shell so tests control its
//! lifetime and can reset it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Closed key space of the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppStateKey {
    User,
    Theme,
    Notifications,
    Settings,
    Navigation,
}

#[derive(Clone, Default)]
pub struct SharedAppState {
    inner: Arc<Mutex<HashMap<AppStateKey, Value>>>,
}

impl SharedAppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value stored under `key`.
    pub fn update<T: Serialize>(&self, key: AppStateKey, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => {
                self.inner
                    .lock()
                    .expect("app state poisoned")
                    .insert(key, json);
            }
            Err(err) => tracing::warn!(?key, error = %err, "failed to serialize app state value"),
        }
    }

    /// Raw JSON value under `key`, if any.
    pub fn get(&self, key: AppStateKey) -> Option<Value> {
        self.inner
            .lock()
            .expect("app state poisoned")
            .get(&key)
            .cloned()
    }

    /// Typed read; `None` when the key is absent or the shape does not
    /// match.
    pub fn get_as<T: DeserializeOwned>(&self, key: AppStateKey) -> Option<T> {
        let value = self.get(key)?;
        serde_json::from_value(value).ok()
    }

    pub fn has(&self, key: AppStateKey) -> bool {
        self.inner
            .lock()
            .expect("app state poisoned")
            .contains_key(&key)
    }

    /// Clear one key, or the entire store when `key` is `None`.
    pub fn clear(&self, key: Option<AppStateKey>) {
        let mut map = self.inner.lock().expect("app state poisoned");
        match key {
            Some(key) => {
                map.remove(&key);
            }
            None => map.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserProfile;

    #[test]
    fn whole_value_replacement_last_writer_wins() {
        let state = SharedAppState::new();
        state.update(AppStateKey::Settings, &serde_json::json!({"a": 1, "b": 2}));
        state.update(AppStateKey::Settings, &serde_json::json!({"a": 3}));
        let value = state.get(AppStateKey::Settings).unwrap();
        assert_eq!(value, serde_json::json!({"a": 3}));
    }

    #[test]
    fn typed_round_trip() {
        let state = SharedAppState::new();
        let profile = UserProfile {
            tenant_id: "t1".into(),
            ad_group_ids: vec![10, 20],
            ..Default::default()
        };
        state.update(AppStateKey::User, &profile);
        let read: UserProfile = state.get_as(AppStateKey::User).unwrap();
        assert_eq!(read, profile);
    }

    #[test]
    fn clear_scopes_to_key_or_all() {
        let state = SharedAppState::new();
        state.update(AppStateKey::Theme, &"dark");
        state.update(AppStateKey::Navigation, &"/rates");
        state.clear(Some(AppStateKey::Theme));
        assert!(!state.has(AppStateKey::Theme));
        assert!(state.has(AppStateKey::Navigation));
        state.clear(None);
        assert!(!state.has(AppStateKey::Navigation));
    }
}
