//! Engine types

use std::collections::BTreeMap;

/// Statistics from a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Records emitted, per stream
    pub records: BTreeMap<String, u64>,
    /// Pages fetched across all sweeps
    pub pages_fetched: u64,
    /// Pagination sweeps started
    pub sweeps: u64,
    /// HTTP requests sent, retries included
    pub requests_sent: u64,
    /// Records skipped because their primary key was already emitted
    pub duplicates_skipped: u64,
    /// Records skipped because a primary-key field was missing or null
    pub missing_keys_skipped: u64,
    /// Parent records that yielded no child context
    pub contexts_skipped: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one emitted record
    pub fn add_record(&mut self, stream: &str) {
        *self.records.entry(stream.to_string()).or_default() += 1;
    }

    /// Count one fetched page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Count one started sweep
    pub fn add_sweep(&mut self) {
        self.sweeps += 1;
    }

    /// Count one skipped duplicate
    pub fn add_duplicate(&mut self) {
        self.duplicates_skipped += 1;
    }

    /// Count one record skipped for a missing primary key
    pub fn add_missing_key(&mut self) {
        self.missing_keys_skipped += 1;
    }

    /// Count one parent record without child context
    pub fn add_skipped_context(&mut self) {
        self.contexts_skipped += 1;
    }

    /// Records emitted for one stream
    pub fn records_for(&self, stream: &str) -> u64 {
        self.records.get(stream).copied().unwrap_or(0)
    }

    /// Records emitted across all streams
    pub fn total_records(&self) -> u64 {
        self.records.values().sum()
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
