//! Individual session records.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// Session payload: string keys to arbitrary JSON values.
///
/// The store never interprets it.
pub type Payload = HashMap<String, serde_json::Value>;

/// A single session entry in the store's table.
///
/// Payload and timestamp change together through [`SessionRecord::replace`],
/// so no reader ever sees a new payload next to a stale timestamp.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    data: Payload,
    created_at: Instant,
    last_updated: Instant,
}

impl SessionRecord {
    /// Create an empty record stamped with the current time.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            data: Payload::new(),
            created_at: now,
            last_updated: now,
        }
    }

    /// The current payload.
    pub fn data(&self) -> &Payload {
        &self.data
    }

    /// When this record was created.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When this record was last created or updated.
    pub fn last_updated(&self) -> Instant {
        self.last_updated
    }

    /// Replace the payload wholesale and renew the TTL.
    pub fn replace(&mut self, data: Payload) {
        self.data = data;
        self.last_updated = Instant::now();
    }

    /// Time since the last update, as seen at `now`.
    pub fn idle(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_updated)
    }

    /// Time since the record was created, as seen at `now`.
    pub fn lifetime(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    /// Whether the record has been idle for at least `max_age`.
    pub fn is_expired(&self, now: Instant, max_age: Duration) -> bool {
        self.idle(now) >= max_age
    }
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self::new()
    }
}
