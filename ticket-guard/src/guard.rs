//! The gate application root.
//!
//! [`TicketGuard`] owns the [`Store`] running the [`ValidationEngine`] and is
//! the only way in for callers. Clones share the same state, so several
//! scanner tasks can hold one each.

use crate::stats::{CapacityInfo, TicketStats};
use crate::ticket_store::TypeBreakdown;
use crate::types::{CheckInLogEntry, FraudLogEntry, QrCode, Ticket};
use crate::validation::{
    GuardAction, GuardEnvironment, GuardState, ValidationEngine, ValidationResult,
};
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use ticket_guard_runtime::{Store, StoreError};

/// Errors from [`TicketGuard::validate`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// The store refused the scan
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The engine left no result for the scan
    #[error("Validation produced no result")]
    MissingResult,
}

/// Store type behind the gate
pub type GuardStore = Store<GuardState, GuardAction, GuardEnvironment, ValidationEngine>;

/// Handle to a running gate
#[derive(Clone)]
pub struct TicketGuard {
    store: GuardStore,
}

impl TicketGuard {
    /// Start a gate over the given state
    #[must_use]
    pub fn new(state: GuardState, environment: GuardEnvironment) -> Self {
        Self {
            store: Store::new(state, ValidationEngine::new(), environment),
        }
    }

    /// Validate a scanned code
    ///
    /// The decision, its mutation and the returned result happen under one
    /// store lock, so concurrent scans of the same code admit it once.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::Store`] after [`TicketGuard::shutdown`].
    #[tracing::instrument(skip(self, qr_code), fields(qr_code = %qr_code))]
    pub async fn validate(&self, qr_code: QrCode) -> Result<ValidationResult, GuardError> {
        let result = self
            .store
            .send_and_read(GuardAction::ScanTicket { qr_code }, |state| {
                state.last_result.clone()
            })
            .await?;

        result.ok_or(GuardError::MissingResult)
    }

    /// Replay an event onto the gate state
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TicketGuard::shutdown`].
    pub async fn replay(&self, event: GuardAction) -> Result<(), StoreError> {
        self.store.send(event).await
    }

    /// Summary counters
    pub async fn stats(&self) -> TicketStats {
        self.store.state(GuardState::stats).await
    }

    /// Venue utilization
    pub async fn capacity_info(&self, capacity: NonZeroU32) -> CapacityInfo {
        self.store.state(|s| s.capacity_info(capacity)).await
    }

    /// Newest check-ins first
    pub async fn recent_check_ins(&self, limit: usize) -> Vec<CheckInLogEntry> {
        self.store
            .state(|s| s.check_ins.recent(limit).into_iter().cloned().collect())
            .await
    }

    /// Newest fraud attempts first
    pub async fn fraud_alerts(&self, limit: usize) -> Vec<FraudLogEntry> {
        self.store
            .state(|s| s.fraud_log.alerts(limit).into_iter().cloned().collect())
            .await
    }

    /// Tickets whose attendee name, email or id contains `query`
    pub async fn search(&self, query: &str) -> Vec<Ticket> {
        self.store
            .state(|s| s.tickets.search(query).into_iter().cloned().collect())
            .await
    }

    /// Used/total per ticket type
    pub async fn tickets_by_type(&self) -> BTreeMap<String, TypeBreakdown> {
        self.store.state(|s| s.tickets.by_type()).await
    }

    /// Result of the most recent scan
    pub async fn last_result(&self) -> Option<ValidationResult> {
        self.store.state(|s| s.last_result.clone()).await
    }

    /// Stop accepting scans and wait for metric effects to finish
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
    /// after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }
}
