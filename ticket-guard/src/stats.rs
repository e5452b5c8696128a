//! Summary statistics over the ticket store and fraud log.
//!
//! Everything here is recomputed from current state on request; nothing is
//! cached, so the figures can never drift from the logs.

use crate::audit::FraudLog;
use crate::ticket_store::TicketStore;
use crate::types::FraudReason;
use serde::{Serialize, Serializer};
use std::fmt;
use std::num::NonZeroU32;

/// Attendance at or above this share of capacity is a warning
pub const WARNING_THRESHOLD: f64 = 70.0;

/// Attendance at or above this share of capacity is critical
pub const CRITICAL_THRESHOLD: f64 = 90.0;

/// A percentage shown with one decimal place
///
/// Keeps the exact value for comparisons; `Display` and serialization round
/// to one decimal (`"30.0"`), matching what the dashboard renders.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Percentage(f64);

impl Percentage {
    /// `part / whole × 100`, or 0 when `whole` is 0
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Ticket counts are far below 2^52
    pub fn of(part: usize, whole: usize) -> Self {
        if whole == 0 {
            return Self(0.0);
        }
        Self(part as f64 * 100.0 / whole as f64)
    }

    /// Unrounded value
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Value rounded to one decimal place
    #[must_use]
    pub fn rounded(self) -> f64 {
        (self.0 * 10.0).round() / 10.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.rounded())
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ticket and fraud counters for the gate dashboard
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    /// All tickets in the store
    pub total_tickets: usize,
    /// Admitted tickets
    pub used_tickets: usize,
    /// Not yet admitted
    pub unused_tickets: usize,
    /// Fraud entries for re-used tickets
    pub duplicate_attempts: usize,
    /// Fraud entries for unknown codes
    pub invalid_attempts: usize,
    /// `duplicate_attempts + invalid_attempts`
    pub fraud_attempts: usize,
    /// Share of tickets admitted
    pub check_in_rate: Percentage,
}

impl TicketStats {
    /// Compute the counters from current state
    #[must_use]
    pub fn compute(tickets: &TicketStore, fraud_log: &FraudLog) -> Self {
        let total_tickets = tickets.len();
        let used_tickets = tickets.used_count();
        let duplicate_attempts = fraud_log.count_by_reason(FraudReason::DuplicateScan);
        let invalid_attempts = fraud_log.count_by_reason(FraudReason::InvalidTicket);

        Self {
            total_tickets,
            used_tickets,
            unused_tickets: total_tickets - used_tickets,
            duplicate_attempts,
            invalid_attempts,
            fraud_attempts: duplicate_attempts + invalid_attempts,
            check_in_rate: Percentage::of(used_tickets, total_tickets),
        }
    }

    /// Venue utilization for the given capacity
    #[must_use]
    pub fn capacity_info(&self, capacity: NonZeroU32) -> CapacityInfo {
        CapacityInfo::compute(self.used_tickets, capacity)
    }
}

/// Utilization band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityStatus {
    /// Below 70%
    Normal,
    /// 70% up to 90%
    Warning,
    /// 90% and above
    Critical,
}

impl CapacityStatus {
    /// Band for an unrounded percentage
    #[must_use]
    pub fn for_percentage(percentage: Percentage) -> Self {
        let value = percentage.value();
        if value >= CRITICAL_THRESHOLD {
            Self::Critical
        } else if value >= WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

/// Attendance against venue capacity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityInfo {
    /// Admitted tickets
    pub current_attendance: usize,
    /// Venue capacity
    pub capacity: NonZeroU32,
    /// `current_attendance / capacity × 100`
    pub percentage: Percentage,
    /// Utilization band
    pub status: CapacityStatus,
    /// Places left; negative once the venue is over capacity
    pub remaining: i64,
}

impl CapacityInfo {
    /// Compute utilization for `used` admitted tickets
    #[must_use]
    pub fn compute(used: usize, capacity: NonZeroU32) -> Self {
        let limit = usize::try_from(capacity.get()).unwrap_or(usize::MAX);
        let percentage = Percentage::of(used, limit);
        let used_signed = i64::try_from(used).unwrap_or(i64::MAX);

        Self {
            current_attendance: used,
            capacity,
            percentage,
            status: CapacityStatus::for_percentage(percentage),
            remaining: i64::from(capacity.get()) - used_signed,
        }
    }
}
