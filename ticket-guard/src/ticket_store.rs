//! The authoritative set of tickets.
//!
//! Tickets are kept in dataset order and indexed by code and by id. The only
//! mutation is the one-way `Unused → Used` transition.

use crate::dataset::DatasetError;
use crate::types::{QrCode, Ticket, TicketId, TicketStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Broken precondition on [`TicketStore::mark_used`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TicketStoreError {
    /// No ticket carries this code
    #[error("No ticket with code {0}")]
    NotFound(QrCode),

    /// The ticket was admitted before
    #[error("Ticket {0} has already been used")]
    AlreadyUsed(TicketId),
}

/// Outcome of the compare-and-set check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckIn<'a> {
    /// The ticket was unused and is now used
    Admitted(&'a Ticket),
    /// The ticket had been used already; nothing changed
    AlreadyUsed(&'a Ticket),
    /// No ticket carries this code; nothing changed
    NotFound,
}

/// Used/total counts for one ticket category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeBreakdown {
    /// Tickets of this type
    pub total: usize,
    /// Of which admitted
    pub used: usize,
}

/// In-memory ticket store
#[derive(Debug, Clone, Default)]
pub struct TicketStore {
    tickets: Vec<Ticket>,
    by_code: HashMap<QrCode, usize>,
    by_id: HashMap<TicketId, usize>,
}

impl TicketStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from loaded tickets, rejecting corrupt data
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if two tickets share a code or an id, or if a
    /// used ticket has no check-in time.
    pub fn from_tickets(tickets: Vec<Ticket>) -> Result<Self, DatasetError> {
        let mut store = Self::new();
        for ticket in tickets {
            store.insert(ticket)?;
        }
        Ok(store)
    }

    fn insert(&mut self, ticket: Ticket) -> Result<(), DatasetError> {
        if self.by_code.contains_key(&ticket.qr_code) {
            return Err(DatasetError::DuplicateQrCode(ticket.qr_code));
        }
        if self.by_id.contains_key(&ticket.id) {
            return Err(DatasetError::DuplicateTicketId(ticket.id));
        }
        if ticket.is_used() && ticket.checked_in_at.is_none() {
            return Err(DatasetError::MissingCheckInTime(ticket.id));
        }

        let index = self.tickets.len();
        self.by_code.insert(ticket.qr_code.clone(), index);
        self.by_id.insert(ticket.id.clone(), index);
        self.tickets.push(ticket);
        Ok(())
    }

    /// Look up a ticket by code
    #[must_use]
    pub fn find(&self, qr_code: &QrCode) -> Option<&Ticket> {
        self.by_code.get(qr_code).map(|&i| &self.tickets[i])
    }

    /// Look up a ticket by id
    #[must_use]
    pub fn find_by_id(&self, id: &TicketId) -> Option<&Ticket> {
        self.by_id.get(id).map(|&i| &self.tickets[i])
    }

    /// Mark an unused ticket as used
    ///
    /// # Errors
    ///
    /// Returns [`TicketStoreError`] if the code is unknown or the ticket is
    /// already used. Neither happens when the caller checked first.
    pub fn mark_used(
        &mut self,
        qr_code: &QrCode,
        at: DateTime<Utc>,
    ) -> Result<&Ticket, TicketStoreError> {
        let index = *self
            .by_code
            .get(qr_code)
            .ok_or_else(|| TicketStoreError::NotFound(qr_code.clone()))?;

        let ticket = &mut self.tickets[index];
        if ticket.is_used() {
            return Err(TicketStoreError::AlreadyUsed(ticket.id.clone()));
        }

        ticket.status = TicketStatus::Used;
        ticket.checked_in_at = Some(at);
        Ok(ticket)
    }

    /// Find a ticket and admit it if it is unused, as one step
    pub fn check_in(&mut self, qr_code: &QrCode, at: DateTime<Utc>) -> CheckIn<'_> {
        let Some(&index) = self.by_code.get(qr_code) else {
            return CheckIn::NotFound;
        };

        let ticket = &mut self.tickets[index];
        if ticket.is_used() {
            return CheckIn::AlreadyUsed(ticket);
        }

        ticket.status = TicketStatus::Used;
        ticket.checked_in_at = Some(at);
        CheckIn::Admitted(ticket)
    }

    /// Number of tickets
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// Whether the store holds no tickets
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Number of admitted tickets
    #[must_use]
    pub fn used_count(&self) -> usize {
        self.tickets.iter().filter(|t| t.is_used()).count()
    }

    /// Tickets in dataset order
    pub fn iter(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.iter()
    }

    /// Case-insensitive match on attendee name, email or ticket id
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Ticket> {
        let needle = query.to_lowercase();
        self.tickets
            .iter()
            .filter(|t| {
                t.attendee_name.to_lowercase().contains(&needle)
                    || t.email.to_lowercase().contains(&needle)
                    || t.id.as_str().to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Used/total per ticket type, ordered by type name
    #[must_use]
    pub fn by_type(&self) -> BTreeMap<String, TypeBreakdown> {
        let mut breakdown: BTreeMap<String, TypeBreakdown> = BTreeMap::new();
        for ticket in &self.tickets {
            let entry = breakdown.entry(ticket.ticket_type.clone()).or_default();
            entry.total += 1;
            if ticket.is_used() {
                entry.used += 1;
            }
        }
        breakdown
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn code(s: &str) -> QrCode {
        QrCode::parse(s).unwrap()
    }

    fn ticket(id: &str, qr: &str, name: &str, kind: &str) -> Ticket {
        Ticket::new(
            TicketId::new(id),
            code(qr),
            name,
            format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            kind,
        )
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
    }

    fn store() -> TicketStore {
        TicketStore::from_tickets(vec![
            ticket("TKT001", "QR001", "John Doe", "VIP"),
            ticket("TKT002", "QR002", "Jane Smith", "Regular"),
            ticket("TKT003", "QR003", "Mike Johnson", "Regular"),
        ])
        .unwrap()
    }

    #[test]
    fn find_by_code_and_id() {
        let store = store();
        assert_eq!(store.find(&code("QR002")).unwrap().id, TicketId::new("TKT002"));
        assert_eq!(
            store.find_by_id(&TicketId::new("TKT003")).unwrap().qr_code,
            code("QR003")
        );
        assert!(store.find(&code("QR999")).is_none());
    }

    #[test]
    fn mark_used_sets_status_and_time_once() {
        let mut store = store();
        let ticket = store.mark_used(&code("QR001"), at()).unwrap();
        assert_eq!(ticket.status, TicketStatus::Used);
        assert_eq!(ticket.checked_in_at, Some(at()));

        let again = store.mark_used(&code("QR001"), at());
        assert_eq!(again, Err(TicketStoreError::AlreadyUsed(TicketId::new("TKT001"))));
    }

    #[test]
    fn mark_used_unknown_code() {
        let mut store = store();
        assert_eq!(
            store.mark_used(&code("NOPE"), at()),
            Err(TicketStoreError::NotFound(code("NOPE")))
        );
    }

    #[test]
    fn check_in_admits_then_reports_used() {
        let mut store = store();
        assert!(matches!(store.check_in(&code("QR002"), at()), CheckIn::Admitted(_)));
        assert!(matches!(store.check_in(&code("QR002"), at()), CheckIn::AlreadyUsed(_)));
        assert_eq!(store.check_in(&code("QR404"), at()), CheckIn::NotFound);
        assert_eq!(store.used_count(), 1);
    }

    #[test]
    fn check_in_keeps_first_admission_time() {
        let mut store = store();
        let later = at() + chrono::Duration::minutes(5);

        let CheckIn::Admitted(ticket) = store.check_in(&code("QR003"), at()) else {
            panic!("unused ticket was not admitted");
        };
        assert_eq!(ticket.id, TicketId::new("TKT003"));
        assert_eq!(ticket.status, TicketStatus::Used);
        assert_eq!(ticket.checked_in_at, Some(at()));

        let CheckIn::AlreadyUsed(ticket) = store.check_in(&code("QR003"), later) else {
            panic!("used ticket was admitted again");
        };
        assert_eq!(ticket.checked_in_at, Some(at()));
        assert_eq!(store.find(&code("QR003")).unwrap().checked_in_at, Some(at()));
        assert_eq!(store.used_count(), 1);
    }

    #[test]
    fn duplicate_code_is_rejected_at_load() {
        let result = TicketStore::from_tickets(vec![
            ticket("TKT001", "QR001", "John Doe", "VIP"),
            ticket("TKT002", "QR001", "Jane Smith", "Regular"),
        ]);
        assert!(matches!(result, Err(DatasetError::DuplicateQrCode(_))));
    }

    #[test]
    fn duplicate_id_is_rejected_at_load() {
        let result = TicketStore::from_tickets(vec![
            ticket("TKT001", "QR001", "John Doe", "VIP"),
            ticket("TKT001", "QR002", "Jane Smith", "Regular"),
        ]);
        assert!(matches!(result, Err(DatasetError::DuplicateTicketId(_))));
    }

    #[test]
    fn used_ticket_without_time_is_rejected_at_load() {
        let mut used = ticket("TKT001", "QR001", "John Doe", "VIP");
        used.status = TicketStatus::Used;
        let result = TicketStore::from_tickets(vec![used]);
        assert!(matches!(result, Err(DatasetError::MissingCheckInTime(_))));
    }

    #[test]
    fn search_matches_name_email_and_id() {
        let store = store();
        assert_eq!(store.search("jane").len(), 1);
        assert_eq!(store.search("EXAMPLE.COM").len(), 3);
        assert_eq!(store.search("tkt003")[0].attendee_name, "Mike Johnson");
        assert!(store.search("nobody").is_empty());
    }

    #[test]
    fn by_type_counts_used() {
        let mut store = store();
        store.mark_used(&code("QR003"), at()).unwrap();

        let breakdown = store.by_type();
        assert_eq!(breakdown["VIP"], TypeBreakdown { total: 1, used: 0 });
        assert_eq!(breakdown["Regular"], TypeBreakdown { total: 2, used: 1 });
    }
}
