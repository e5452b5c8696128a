//! Domain types for the gate.
//!
//! Value objects for tickets and the two audit records the validation engine
//! produces. Every type serializes with the field names and enum spellings
//! the dashboard front-end consumes (`qrCode`, `duplicate_scan`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Ticket identifier (`TKT001`)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Wrap an identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error for scanner input rejected before it reaches the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanInputError {
    /// Input was empty or whitespace only
    #[error("Scanned code is blank")]
    Blank,
}

/// Scannable ticket code (`QR001`)
///
/// Always trimmed and never blank, so the engine never sees empty input.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QrCode(String);

impl QrCode {
    /// Trim scanner input and reject blank codes
    ///
    /// # Errors
    ///
    /// Returns [`ScanInputError::Blank`] if nothing is left after trimming.
    pub fn parse(input: &str) -> Result<Self, ScanInputError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ScanInputError::Blank);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The code text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for QrCode {
    type Error = ScanInputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<QrCode> for String {
    fn from(code: QrCode) -> Self {
        code.0
    }
}

impl fmt::Display for QrCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fraud log entry identifier
///
/// Generated entries read `FRD-<32 hex digits>`; seeded entries keep the
/// identifiers they were loaded with.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FraudId(String);

impl FraudId {
    /// Wrap an existing identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build an identifier from a generated UUID
    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(format!("FRD-{}", id.simple()))
    }

    /// The identifier text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FraudId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// Ticket lifecycle: `Unused` → `Used`, once, never back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Not scanned in yet
    Unused,
    /// Admitted
    Used,
}

/// An admission record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Unique identifier
    pub id: TicketId,
    /// Scannable code, one-to-one with `id`
    pub qr_code: QrCode,
    /// Lifecycle status
    pub status: TicketStatus,
    /// Attendee full name
    pub attendee_name: String,
    /// Attendee email
    pub email: String,
    /// Category label (`VIP`, `Regular`, ...)
    #[serde(rename = "type")]
    pub ticket_type: String,
    /// Set exactly once, on the first successful validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Creates a new unused ticket
    #[must_use]
    pub fn new(
        id: TicketId,
        qr_code: QrCode,
        attendee_name: impl Into<String>,
        email: impl Into<String>,
        ticket_type: impl Into<String>,
    ) -> Self {
        Self {
            id,
            qr_code,
            status: TicketStatus::Unused,
            attendee_name: attendee_name.into(),
            email: email.into(),
            ticket_type: ticket_type.into(),
            checked_in_at: None,
        }
    }

    /// Whether the ticket has already been admitted
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.status == TicketStatus::Used
    }
}

// ============================================================================
// Audit records
// ============================================================================

/// One successful validation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInLogEntry {
    /// Admitted ticket
    pub ticket_id: TicketId,
    /// Attendee name copied from the ticket
    pub attendee_name: String,
    /// When the ticket was admitted
    pub check_in_time: DateTime<Utc>,
    /// Entrance that admitted the ticket
    pub entrance: String,
}

/// Why a scan was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudReason {
    /// The ticket had already been used
    DuplicateScan,
    /// The code is not in the ticket store
    InvalidTicket,
}

impl FraudReason {
    /// The wire spelling, also used as a metrics label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateScan => "duplicate_scan",
            Self::InvalidTicket => "invalid_ticket",
        }
    }
}

/// How the gate handled a rejected attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudStatus {
    /// A real ticket scanned again; the holder gets a second look
    Flagged,
    /// Unknown code; entry refused
    Blocked,
}

/// Sentinel used on the wire for fraud entries with no matching ticket
pub const UNKNOWN_TICKET: &str = "UNKNOWN";

/// Ticket a fraud entry points at
///
/// Serialized as the ticket id, or `UNKNOWN` when the code matched nothing.
/// Any id starting with `UNKNOWN` (older exports use `UNKNOWN001`) reads back
/// as [`TicketRef::Unknown`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TicketRef {
    /// A ticket in the store
    Known(TicketId),
    /// No ticket matched the scanned code
    Unknown,
}

impl From<String> for TicketRef {
    fn from(value: String) -> Self {
        if value.starts_with(UNKNOWN_TICKET) {
            Self::Unknown
        } else {
            Self::Known(TicketId(value))
        }
    }
}

impl From<TicketRef> for String {
    fn from(value: TicketRef) -> Self {
        match value {
            TicketRef::Known(id) => id.0,
            TicketRef::Unknown => UNKNOWN_TICKET.to_string(),
        }
    }
}

impl fmt::Display for TicketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(id) => id.fmt(f),
            Self::Unknown => f.write_str(UNKNOWN_TICKET),
        }
    }
}

/// One rejected validation attempt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudLogEntry {
    /// Entry identifier
    pub id: FraudId,
    /// Ticket the code belongs to, if any
    pub ticket_id: TicketRef,
    /// Code as scanned
    pub qr_code: QrCode,
    /// When the attempt happened
    pub attempt_time: DateTime<Utc>,
    /// Why it was rejected
    pub reason: FraudReason,
    /// Where it was scanned
    pub location: String,
    /// How it was handled
    pub status: FraudStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn qr_code_is_trimmed() {
        let code = QrCode::parse("  QR001\n").unwrap();
        assert_eq!(code.as_str(), "QR001");
    }

    #[test]
    fn blank_qr_code_is_rejected() {
        assert_eq!(QrCode::parse(""), Err(ScanInputError::Blank));
        assert_eq!(QrCode::parse(" \t "), Err(ScanInputError::Blank));
    }

    #[test]
    fn fraud_id_from_uuid() {
        let id = FraudId::from_uuid(Uuid::from_u128(1));
        assert_eq!(id.as_str(), "FRD-00000000000000000000000000000001");
    }

    #[test]
    fn ticket_serializes_with_dashboard_field_names() {
        let ticket = Ticket::new(
            TicketId::new("TKT001"),
            QrCode::parse("QR001").unwrap(),
            "John Doe",
            "john@example.com",
            "VIP",
        );
        let json = serde_json::to_value(&ticket).unwrap();

        assert_eq!(json["qrCode"], "QR001");
        assert_eq!(json["status"], "unused");
        assert_eq!(json["attendeeName"], "John Doe");
        assert_eq!(json["type"], "VIP");
        assert!(json.get("checkedInAt").is_none());
    }

    #[test]
    fn unknown_ticket_ref_round_trips_through_sentinel() {
        let json = serde_json::to_value(TicketRef::Unknown).unwrap();
        assert_eq!(json, "UNKNOWN");

        let legacy: TicketRef = serde_json::from_str("\"UNKNOWN001\"").unwrap();
        assert_eq!(legacy, TicketRef::Unknown);

        let known: TicketRef = serde_json::from_str("\"TKT006\"").unwrap();
        assert_eq!(known, TicketRef::Known(TicketId::new("TKT006")));
    }

    #[test]
    fn blank_qr_code_fails_to_deserialize() {
        let result: Result<QrCode, _> = serde_json::from_str("\"   \"");
        assert!(result.is_err());
    }
}
