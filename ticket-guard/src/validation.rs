//! The validation engine.
//!
//! Decides the outcome of every scan and performs the matching mutation:
//! nothing, one fraud entry, or one ticket admission plus its check-in entry.
//! Written as a [`Reducer`] so the [`Store`](ticket_guard_runtime::Store)
//! runs it one action at a time under its state lock.

use crate::audit::{CheckInLog, FraudLog};
use crate::metrics;
use crate::stats::{CapacityInfo, TicketStats};
use crate::ticket_store::{CheckIn, TicketStore};
use crate::types::{
    CheckInLogEntry, FraudId, FraudLogEntry, FraudReason, FraudStatus, QrCode, Ticket, TicketRef,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use ticket_guard_core::{
    SmallVec, async_effect,
    effect::Effect,
    environment::{Clock, IdGenerator},
    reducer::Reducer,
    smallvec,
};

/// Message for a first, successful scan
pub const MSG_VALID: &str = "Ticket validated successfully";

/// Message for a ticket that was admitted before
pub const MSG_DUPLICATE: &str = "Ticket has already been used";

/// Message for a code that matches no ticket
pub const MSG_INVALID: &str = "Ticket not found in system";

// ============================================================================
// Results
// ============================================================================

/// Outcome category of a scan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    /// First scan of an unused ticket
    Valid,
    /// The ticket was already used
    Duplicate,
    /// No ticket carries the code
    Invalid,
}

impl ValidationStatus {
    /// The wire spelling, also used as a metrics label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::Duplicate => "DUPLICATE",
            Self::Invalid => "INVALID",
        }
    }
}

/// What the gate reports back for one scan
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True only for [`ValidationStatus::Valid`]
    pub is_valid: bool,
    /// Outcome category
    pub status: ValidationStatus,
    /// Human-readable outcome
    pub message: String,
    /// The matched ticket, after any update
    pub ticket: Option<Ticket>,
    /// Fraud entry built for a rejected scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud_log: Option<FraudLogEntry>,
    /// Check-in entry for an admitted ticket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_log: Option<CheckInLogEntry>,
}

impl ValidationResult {
    fn valid(ticket: Ticket, entry: CheckInLogEntry) -> Self {
        Self {
            is_valid: true,
            status: ValidationStatus::Valid,
            message: MSG_VALID.to_string(),
            ticket: Some(ticket),
            fraud_log: None,
            check_in_log: Some(entry),
        }
    }

    fn duplicate(ticket: Ticket, entry: FraudLogEntry) -> Self {
        Self {
            is_valid: false,
            status: ValidationStatus::Duplicate,
            message: MSG_DUPLICATE.to_string(),
            ticket: Some(ticket),
            fraud_log: Some(entry),
            check_in_log: None,
        }
    }

    fn invalid(entry: FraudLogEntry) -> Self {
        Self {
            is_valid: false,
            status: ValidationStatus::Invalid,
            message: MSG_INVALID.to_string(),
            ticket: None,
            fraud_log: Some(entry),
            check_in_log: None,
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// Everything the gate knows
#[derive(Clone, Debug, Default)]
pub struct GuardState {
    /// Authoritative ticket set
    pub tickets: TicketStore,
    /// Successful validations
    pub check_ins: CheckInLog,
    /// Rejected validations
    pub fraud_log: FraudLog,
    /// Result of the most recent scan
    pub last_result: Option<ValidationResult>,
}

impl GuardState {
    /// State with the given tickets and empty logs
    #[must_use]
    pub fn new(tickets: TicketStore) -> Self {
        Self {
            tickets,
            ..Self::default()
        }
    }

    /// Summary counters
    #[must_use]
    pub fn stats(&self) -> TicketStats {
        TicketStats::compute(&self.tickets, &self.fraud_log)
    }

    /// Venue utilization
    #[must_use]
    pub fn capacity_info(&self, capacity: NonZeroU32) -> CapacityInfo {
        CapacityInfo::compute(self.tickets.used_count(), capacity)
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Commands and events of the validation engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardAction {
    // Commands
    /// Validate a scanned code
    ScanTicket {
        /// Code as read by the scanner
        qr_code: QrCode,
    },

    // Events
    /// A ticket was admitted
    TicketCheckedIn {
        /// Code of the admitted ticket
        qr_code: QrCode,
        /// Check-in record
        entry: CheckInLogEntry,
    },
    /// A rejected attempt was logged
    FraudAttemptRecorded {
        /// Fraud record
        entry: FraudLogEntry,
    },
}

// ============================================================================
// Environment
// ============================================================================

/// What to do with scans of unknown codes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidScanPolicy {
    /// Append the fraud entry to the fraud log
    #[default]
    Record,
    /// Return the fraud entry in the result without logging it
    Discard,
}

/// Dependencies and gate settings for [`ValidationEngine`]
#[derive(Clone)]
pub struct GuardEnvironment {
    /// Source of timestamps
    pub clock: Arc<dyn Clock>,
    /// Source of fraud entry ids
    pub ids: Arc<dyn IdGenerator>,
    /// Entrance written into check-in entries
    pub entrance: String,
    /// Location written into fraud entries
    pub location: String,
    /// Handling of unknown codes
    pub invalid_scan_policy: InvalidScanPolicy,
}

impl GuardEnvironment {
    /// Default entrance name
    pub const DEFAULT_ENTRANCE: &'static str = "Main";

    /// Default location name
    pub const DEFAULT_LOCATION: &'static str = "Main Entrance";

    /// Creates an environment for the main entrance
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            clock,
            ids,
            entrance: Self::DEFAULT_ENTRANCE.to_string(),
            location: Self::DEFAULT_LOCATION.to_string(),
            invalid_scan_policy: InvalidScanPolicy::default(),
        }
    }

    /// Set the entrance name
    #[must_use]
    pub fn with_entrance(mut self, entrance: impl Into<String>) -> Self {
        self.entrance = entrance.into();
        self
    }

    /// Set the location name
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set how unknown codes are handled
    #[must_use]
    pub const fn with_invalid_scan_policy(mut self, policy: InvalidScanPolicy) -> Self {
        self.invalid_scan_policy = policy;
        self
    }
}

impl std::fmt::Debug for GuardEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardEnvironment")
            .field("entrance", &self.entrance)
            .field("location", &self.location)
            .field("invalid_scan_policy", &self.invalid_scan_policy)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer that validates scans
#[derive(Clone, Debug, Default)]
pub struct ValidationEngine;

impl ValidationEngine {
    /// Creates a new `ValidationEngine`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn fraud_entry(
        env: &GuardEnvironment,
        qr_code: QrCode,
        ticket_id: TicketRef,
        reason: FraudReason,
        status: FraudStatus,
    ) -> FraudLogEntry {
        FraudLogEntry {
            id: FraudId::from_uuid(env.ids.next_id()),
            ticket_id,
            qr_code,
            attempt_time: env.clock.now(),
            reason,
            location: env.location.clone(),
            status,
        }
    }

    /// Applies an event to state
    fn apply_event(state: &mut GuardState, action: &GuardAction) {
        match action {
            GuardAction::TicketCheckedIn { qr_code, entry } => {
                match state.tickets.mark_used(qr_code, entry.check_in_time) {
                    Ok(_) => state.check_ins.append(entry.clone()),
                    Err(error) => {
                        tracing::warn!(%error, "Ignoring check-in event");
                    },
                }
            },
            GuardAction::FraudAttemptRecorded { entry } => {
                state.fraud_log.append(entry.clone());
            },
            // Commands are not applied to state
            GuardAction::ScanTicket { .. } => {},
        }
    }

    fn scan(state: &mut GuardState, qr_code: QrCode, env: &GuardEnvironment) -> ValidationResult {
        let now = env.clock.now();

        match state.tickets.check_in(&qr_code, now) {
            CheckIn::Admitted(ticket) => {
                let ticket = ticket.clone();
                let entry = CheckInLogEntry {
                    ticket_id: ticket.id.clone(),
                    attendee_name: ticket.attendee_name.clone(),
                    check_in_time: now,
                    entrance: env.entrance.clone(),
                };
                state.check_ins.append(entry.clone());

                tracing::info!(
                    ticket_id = %ticket.id,
                    attendee = %ticket.attendee_name,
                    entrance = %entry.entrance,
                    "Ticket checked in"
                );
                ValidationResult::valid(ticket, entry)
            },
            CheckIn::AlreadyUsed(ticket) => {
                let ticket = ticket.clone();
                let entry = Self::fraud_entry(
                    env,
                    qr_code,
                    TicketRef::Known(ticket.id.clone()),
                    FraudReason::DuplicateScan,
                    FraudStatus::Flagged,
                );
                Self::apply_event(
                    state,
                    &GuardAction::FraudAttemptRecorded {
                        entry: entry.clone(),
                    },
                );

                tracing::warn!(
                    ticket_id = %ticket.id,
                    fraud_id = %entry.id,
                    "Duplicate scan flagged"
                );
                ValidationResult::duplicate(ticket, entry)
            },
            CheckIn::NotFound => {
                let entry = Self::fraud_entry(
                    env,
                    qr_code,
                    TicketRef::Unknown,
                    FraudReason::InvalidTicket,
                    FraudStatus::Blocked,
                );
                let recorded = env.invalid_scan_policy == InvalidScanPolicy::Record;
                if recorded {
                    Self::apply_event(
                        state,
                        &GuardAction::FraudAttemptRecorded {
                            entry: entry.clone(),
                        },
                    );
                }

                tracing::warn!(
                    qr_code = %entry.qr_code,
                    fraud_id = %entry.id,
                    recorded,
                    "Unknown ticket blocked"
                );
                ValidationResult::invalid(entry)
            },
        }
    }
}

impl Reducer for ValidationEngine {
    type State = GuardState;
    type Action = GuardAction;
    type Environment = GuardEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            GuardAction::ScanTicket { qr_code } => {
                let result = Self::scan(state, qr_code, env);

                let status = result.status;
                let reason = result.fraud_log.as_ref().map(|entry| entry.reason);
                state.last_result = Some(result);

                smallvec![async_effect! {
                    metrics::record_scan(status);
                    match reason {
                        Some(reason) => metrics::record_fraud_attempt(reason),
                        None => metrics::record_check_in(),
                    }
                    None
                }]
            },

            // ========== Events ==========
            GuardAction::TicketCheckedIn { .. } | GuardAction::FraudAttemptRecorded { .. } => {
                // Replayed from an export or another gate
                Self::apply_event(state, &action);
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::types::{TicketId, TicketStatus};
    use ticket_guard_testing::{ReducerTest, SequentialIdGenerator, assertions, test_clock};

    fn code(s: &str) -> QrCode {
        QrCode::parse(s).unwrap()
    }

    fn test_env() -> GuardEnvironment {
        GuardEnvironment::new(Arc::new(test_clock()), Arc::new(SequentialIdGenerator::new()))
    }

    fn seeded() -> GuardState {
        Dataset::seed().unwrap().into_state().unwrap()
    }

    fn scan(s: &str) -> GuardAction {
        GuardAction::ScanTicket { qr_code: code(s) }
    }

    #[test]
    fn first_scan_admits_ticket() {
        ReducerTest::new(ValidationEngine::new())
            .with_env(test_env())
            .given_state(seeded())
            .when_action(scan("QR001"))
            .then_state(|state| {
                let ticket = state.tickets.find(&code("QR001")).unwrap();
                assert_eq!(ticket.status, TicketStatus::Used);
                assert_eq!(ticket.checked_in_at, Some(test_clock().now()));

                let result = state.last_result.as_ref().unwrap();
                assert!(result.is_valid);
                assert_eq!(result.status, ValidationStatus::Valid);
                assert_eq!(result.message, MSG_VALID);
                assert_eq!(result.ticket.as_ref().unwrap().status, TicketStatus::Used);

                let entry = state.check_ins.last().unwrap();
                assert_eq!(entry.ticket_id, TicketId::new("TKT001"));
                assert_eq!(entry.attendee_name, "John Doe");
                assert_eq!(entry.entrance, "Main");
                assert_eq!(result.check_in_log.as_ref(), Some(entry));
                assert_eq!(state.check_ins.len(), 4);
                assert_eq!(state.fraud_log.len(), 3);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn second_scan_is_flagged_duplicate() {
        ReducerTest::new(ValidationEngine::new())
            .with_env(test_env())
            .given_state(seeded())
            .when_action(scan("QR001"))
            .when_action(scan("QR001"))
            .then_state(|state| {
                let result = state.last_result.as_ref().unwrap();
                assert!(!result.is_valid);
                assert_eq!(result.status, ValidationStatus::Duplicate);
                assert_eq!(result.message, MSG_DUPLICATE);
                assert_eq!(result.ticket.as_ref().unwrap().id, TicketId::new("TKT001"));

                let entry = state.fraud_log.last().unwrap();
                assert_eq!(entry.ticket_id, TicketRef::Known(TicketId::new("TKT001")));
                assert_eq!(entry.reason, FraudReason::DuplicateScan);
                assert_eq!(entry.status, FraudStatus::Flagged);
                assert_eq!(entry.location, "Main Entrance");
                assert_eq!(entry.id.as_str(), "FRD-00000000000000000000000000000001");
                assert_eq!(result.fraud_log.as_ref(), Some(entry));

                assert_eq!(state.fraud_log.len(), 4);
                assert_eq!(state.check_ins.len(), 4);
                assert_eq!(state.tickets.used_count(), 4);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn already_used_seed_ticket_is_duplicate() {
        ReducerTest::new(ValidationEngine::new())
            .with_env(test_env())
            .given_state(seeded())
            .when_action(scan("QR006"))
            .then_state(|state| {
                let result = state.last_result.as_ref().unwrap();
                assert_eq!(result.status, ValidationStatus::Duplicate);
                // The original admission time is kept
                assert_eq!(
                    result.ticket.as_ref().unwrap().checked_in_at,
                    Some(state.check_ins.entries()[0].check_in_time)
                );
                assert_eq!(state.tickets.used_count(), 3);
            })
            .run();
    }

    #[test]
    fn unknown_code_is_blocked_and_recorded() {
        ReducerTest::new(ValidationEngine::new())
            .with_env(test_env())
            .given_state(seeded())
            .when_action(scan("INVALID001"))
            .then_state(|state| {
                let result = state.last_result.as_ref().unwrap();
                assert!(!result.is_valid);
                assert_eq!(result.status, ValidationStatus::Invalid);
                assert_eq!(result.message, MSG_INVALID);
                assert!(result.ticket.is_none());
                assert!(result.check_in_log.is_none());

                let entry = result.fraud_log.as_ref().unwrap();
                assert_eq!(entry.ticket_id, TicketRef::Unknown);
                assert_eq!(entry.reason, FraudReason::InvalidTicket);
                assert_eq!(entry.status, FraudStatus::Blocked);
                assert_eq!(state.fraud_log.last(), Some(entry));

                assert_eq!(state.tickets.used_count(), 3);
                assert_eq!(state.check_ins.len(), 3);
            })
            .run();
    }

    #[test]
    fn discard_policy_returns_entry_without_logging() {
        ReducerTest::new(ValidationEngine::new())
            .with_env(test_env().with_invalid_scan_policy(InvalidScanPolicy::Discard))
            .given_state(seeded())
            .when_action(scan("NOPE"))
            .then_state(|state| {
                let result = state.last_result.as_ref().unwrap();
                assert_eq!(result.status, ValidationStatus::Invalid);
                assert!(result.fraud_log.is_some());
                assert_eq!(state.fraud_log.len(), 3);
            })
            .run();
    }

    #[test]
    fn entrance_and_location_come_from_environment() {
        ReducerTest::new(ValidationEngine::new())
            .with_env(test_env().with_entrance("VIP").with_location("VIP Entrance"))
            .given_state(seeded())
            .when_action(scan("QR004"))
            .when_action(scan("QR004"))
            .then_state(|state| {
                assert_eq!(state.check_ins.last().unwrap().entrance, "VIP");
                assert_eq!(state.fraud_log.last().unwrap().location, "VIP Entrance");
            })
            .run();
    }

    #[test]
    fn check_in_event_replays_onto_state() {
        let entry = CheckInLogEntry {
            ticket_id: TicketId::new("TKT002"),
            attendee_name: "Jane Smith".to_string(),
            check_in_time: test_clock().now(),
            entrance: "Side".to_string(),
        };

        ReducerTest::new(ValidationEngine::new())
            .with_env(test_env())
            .given_state(seeded())
            .when_action(GuardAction::TicketCheckedIn {
                qr_code: code("QR002"),
                entry: entry.clone(),
            })
            .then_state(move |state| {
                assert!(state.tickets.find(&code("QR002")).unwrap().is_used());
                assert_eq!(state.check_ins.last(), Some(&entry));
                assert!(state.last_result.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn replayed_check_in_for_used_ticket_is_ignored() {
        let entry = CheckInLogEntry {
            ticket_id: TicketId::new("TKT006"),
            attendee_name: "Alice Davis".to_string(),
            check_in_time: test_clock().now(),
            entrance: "Main".to_string(),
        };

        ReducerTest::new(ValidationEngine::new())
            .with_env(test_env())
            .given_state(seeded())
            .when_action(GuardAction::TicketCheckedIn {
                qr_code: code("QR006"),
                entry,
            })
            .then_state(|state| {
                assert_eq!(state.check_ins.len(), 3);
                assert_eq!(state.tickets.used_count(), 3);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn fraud_event_replays_onto_state() {
        let entry = FraudLogEntry {
            id: FraudId::new("FRD900"),
            ticket_id: TicketRef::Unknown,
            qr_code: code("FAKE"),
            attempt_time: test_clock().now(),
            reason: FraudReason::InvalidTicket,
            location: "Gate B".to_string(),
            status: FraudStatus::Blocked,
        };

        ReducerTest::new(ValidationEngine::new())
            .with_env(test_env())
            .given_state(seeded())
            .when_action(GuardAction::FraudAttemptRecorded {
                entry: entry.clone(),
            })
            .then_state(move |state| {
                assert_eq!(state.fraud_log.last(), Some(&entry));
                assert_eq!(state.stats().invalid_attempts, 2);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn result_serializes_for_the_dashboard() {
        let mut state = seeded();
        let env = test_env();
        let _ = ValidationEngine::new().reduce(&mut state, scan("INVALID001"), &env);

        let json = serde_json::to_value(state.last_result.as_ref().unwrap()).unwrap();
        assert_eq!(json["isValid"], false);
        assert_eq!(json["status"], "INVALID");
        assert_eq!(json["message"], "Ticket not found in system");
        assert!(json["ticket"].is_null());
        assert_eq!(json["fraudLog"]["ticketId"], "UNKNOWN");
        assert_eq!(json["fraudLog"]["reason"], "invalid_ticket");
        assert!(json.get("checkInLog").is_none());
    }
}
