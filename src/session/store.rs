//! In-memory session table, one live record per user.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::models::SessionRecord;

/// Process-wide map of user id to [`SessionRecord`]
///
/// Every operation takes the lock for a single map access only.
#[derive(Default)]
pub struct SessionStore {
    records: RwLock<HashMap<String, SessionRecord>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `record.user_id`
    ///
    /// Returns the record that was replaced, if any.
    pub fn put(&self, record: SessionRecord) -> Option<SessionRecord> {
        self.records.write().insert(record.user_id.clone(), record)
    }

    #[must_use]
    pub fn get(&self, user_id: &str) -> Option<SessionRecord> {
        self.records.read().get(user_id).cloned()
    }

    pub fn delete(&self, user_id: &str) -> Option<SessionRecord> {
        self.records.write().remove(user_id)
    }

    /// Replace the record for `next.user_id` only while it still carries
    /// `expected_session_id`
    ///
    /// Returns `false`, leaving the store untouched, if the user has no record or
    /// the stored session id has moved on.
    pub fn replace_if_current(&self, expected_session_id: &str, next: SessionRecord) -> bool {
        let mut records = self.records.write();
        match records.get_mut(&next.user_id) {
            Some(current) if current.session_id == expected_session_id => {
                *current = next;
                true
            }
            _ => false,
        }
    }

    /// Remove the record for `user_id` only while it still carries `session_id`
    pub fn delete_if_current(&self, user_id: &str, session_id: &str) -> Option<SessionRecord> {
        let mut records = self.records.write();
        if records.get(user_id)?.session_id != session_id {
            return None;
        }
        records.remove(user_id)
    }

    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.records.read().contains_key(user_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}
