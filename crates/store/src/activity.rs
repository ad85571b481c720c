//! Append-only activity log for accepted commands.
//!
//! Best-effort observability: the log lives in a bounded in-memory ring
//! under the store's lock, so an append is O(1) and can never fail or
//! block the mutation path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of entries retained.
pub const DEFAULT_CAPACITY: usize = 64;

/// One accepted command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// When the command was accepted.
    pub timestamp: DateTime<Utc>,
    /// The resulting intent.
    pub unlock: bool,
    /// Caller identity, if the command carried one.
    pub user: Option<String>,
}

/// Bounded ring of [`ActivityEntry`] values, oldest evicted first.
#[derive(Debug)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest when at capacity.
    pub fn record(&mut self, unlock: bool, user: Option<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ActivityEntry {
            timestamp: Utc::now(),
            unlock,
            user,
        });
    }

    /// All retained entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
