//! # Exchange History
//!
//! Records the HTTP exchanges a single test performs, so a failing report can
//! show exactly which calls were made and what came back.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::http::HttpMethod;

/// Maximum number of exchanges retained per test.
const MAX_HISTORY_ENTRIES: usize = 100;

/// A single request and its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub method: HttpMethod,
    pub url: String,
    /// `None` when the request never produced a response.
    pub status: Option<u16>,
    pub duration_ms: Option<u128>,
    pub size_bytes: Option<usize>,
}

/// Chronological exchange log, oldest first.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Append an entry, evicting the oldest one once the log is full.
    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() >= MAX_HISTORY_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn entries(&self) -> &VecDeque<HistoryEntry> {
        &self.entries
    }
}
