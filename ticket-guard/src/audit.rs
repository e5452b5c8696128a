//! Append-only audit logs.
//!
//! Insertion order is the chronological order of validation attempts.
//! Entries cannot be removed or edited once appended.

use crate::types::{CheckInLogEntry, FraudLogEntry, FraudReason};
use serde::{Deserialize, Serialize};

/// Default number of rows for the recent check-ins view
pub const DEFAULT_RECENT_CHECK_INS: usize = 10;

/// Default number of rows for the fraud alerts view
pub const DEFAULT_FRAUD_ALERTS: usize = 5;

/// Ordered, append-only sequence of audit records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLog<T> {
    entries: Vec<T>,
}

impl<T> Default for AuditLog<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> AuditLog<T> {
    /// Creates an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the end
    pub fn append(&mut self, entry: T) {
        self.entries.push(entry);
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recently appended entry
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.entries.last()
    }

    /// Entries in insertion order
    #[must_use]
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }
}

impl<T> FromIterator<T> for AuditLog<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a AuditLog<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Successful validations
pub type CheckInLog = AuditLog<CheckInLogEntry>;

/// Rejected validations
pub type FraudLog = AuditLog<FraudLogEntry>;

impl CheckInLog {
    /// Newest check-ins first
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<&CheckInLogEntry> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        // Stable sort keeps insertion order for equal timestamps; reversing
        // first makes later appends win ties.
        entries.reverse();
        entries.sort_by(|a, b| b.check_in_time.cmp(&a.check_in_time));
        entries.truncate(limit);
        entries
    }
}

impl FraudLog {
    /// Newest attempts first
    #[must_use]
    pub fn alerts(&self, limit: usize) -> Vec<&FraudLogEntry> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.reverse();
        entries.sort_by(|a, b| b.attempt_time.cmp(&a.attempt_time));
        entries.truncate(limit);
        entries
    }

    /// Number of entries with the given reason
    #[must_use]
    pub fn count_by_reason(&self, reason: FraudReason) -> usize {
        self.entries.iter().filter(|e| e.reason == reason).count()
    }
}
