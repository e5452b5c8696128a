//! Business metrics for the gate.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `ticket_guard_scans_total{status}` - Scans by outcome (VALID, DUPLICATE, INVALID)
//! - `ticket_guard_fraud_attempts_total{reason}` - Rejected scans by reason
//! - `ticket_guard_checked_in_total` - Tickets admitted
//!
//! Store-level metrics (`store_actions_total`, reducer and effect timings)
//! come from [`ticket_guard_runtime::metrics`].

use crate::types::FraudReason;
use crate::validation::ValidationStatus;
use metrics::describe_counter;

/// Initialize and register all business metrics descriptions.
///
/// Call once at startup, after the recorder is installed.
pub fn register_business_metrics() {
    describe_counter!(
        "ticket_guard_scans_total",
        "Total number of scans by outcome (VALID, DUPLICATE, INVALID)"
    );
    describe_counter!(
        "ticket_guard_fraud_attempts_total",
        "Total number of rejected scans by reason (duplicate_scan, invalid_ticket)"
    );
    describe_counter!(
        "ticket_guard_checked_in_total",
        "Total number of tickets admitted"
    );

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record one scan outcome.
pub fn record_scan(status: ValidationStatus) {
    metrics::counter!("ticket_guard_scans_total", "status" => status.as_str()).increment(1);
    tracing::trace!(status = status.as_str(), "Recorded scan metric");
}

/// Record a rejected scan.
///
/// Counted whether or not the fraud entry was appended to the log.
pub fn record_fraud_attempt(reason: FraudReason) {
    metrics::counter!("ticket_guard_fraud_attempts_total", "reason" => reason.as_str())
        .increment(1);
    tracing::trace!(reason = reason.as_str(), "Recorded fraud attempt metric");
}

/// Record an admitted ticket.
pub fn record_check_in() {
    metrics::counter!("ticket_guard_checked_in_total").increment(1);
    tracing::trace!("Recorded check-in metric");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_a_recorder_is_a_no_op() {
        register_business_metrics();
        record_scan(ValidationStatus::Valid);
        record_fraud_attempt(FraudReason::InvalidTicket);
        record_check_in();
    }
}
