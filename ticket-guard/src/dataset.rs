//! Loading the gate's starting state.
//!
//! A dataset is the JSON export the dashboard works from: tickets plus the
//! check-in and fraud history recorded so far. Loading fails fast on
//! corrupt data instead of letting the engine run on it.

use crate::audit::{CheckInLog, FraudLog};
use crate::ticket_store::TicketStore;
use crate::types::{CheckInLogEntry, FraudLogEntry, QrCode, Ticket, TicketId, TicketRef};
use crate::validation::GuardState;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Bundled demo dataset: ten tickets, three of them already admitted
const SEED_JSON: &str = include_str!("../data/seed.json");

/// Errors raised while loading a dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The file could not be read
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The content is not a valid dataset document
    #[error("Invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Two tickets share a scannable code
    #[error("Duplicate QR code in dataset: {0}")]
    DuplicateQrCode(QrCode),

    /// Two tickets share an id
    #[error("Duplicate ticket id in dataset: {0}")]
    DuplicateTicketId(TicketId),

    /// A used ticket carries no check-in time
    #[error("Ticket {0} is used but has no check-in time")]
    MissingCheckInTime(TicketId),

    /// A log entry points at a ticket that does not exist
    #[error("Log entry references unknown ticket {0}")]
    UnknownTicketReference(TicketId),
}

/// Tickets plus audit history, as exported by the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// All issued tickets
    pub tickets: Vec<Ticket>,
    /// Check-ins recorded so far, oldest first
    #[serde(default, rename = "checkInLogs")]
    pub check_ins: Vec<CheckInLogEntry>,
    /// Rejected attempts recorded so far, oldest first
    #[serde(default, rename = "fraudLogs")]
    pub fraud_attempts: Vec<FraudLogEntry>,
}

impl Dataset {
    /// The bundled demo dataset
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Json`] if the bundled file is malformed.
    pub fn seed() -> Result<Self, DatasetError> {
        Self::from_json(SEED_JSON)
    }

    /// Parse a dataset document
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Json`] if `json` is not a dataset document.
    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a dataset file
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Io`] if the file cannot be read and
    /// [`DatasetError::Json`] if it is not a dataset document.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_json(&json)?;
        tracing::debug!(
            path = %path.display(),
            tickets = dataset.tickets.len(),
            "Loaded dataset"
        );
        Ok(dataset)
    }

    /// Check integrity and build the initial gate state
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] on duplicate codes or ids, used tickets with
    /// no check-in time, or log entries naming tickets that do not exist.
    pub fn into_state(self) -> Result<GuardState, DatasetError> {
        let tickets = TicketStore::from_tickets(self.tickets)?;

        let mut referenced = self
            .check_ins
            .iter()
            .map(|entry| &entry.ticket_id)
            .chain(self.fraud_attempts.iter().filter_map(|entry| match &entry.ticket_id {
                TicketRef::Known(id) => Some(id),
                TicketRef::Unknown => None,
            }));

        if let Some(missing) = referenced.find(|id| tickets.find_by_id(id).is_none()) {
            return Err(DatasetError::UnknownTicketReference(missing.clone()));
        }

        Ok(GuardState {
            tickets,
            check_ins: self.check_ins.into_iter().collect::<CheckInLog>(),
            fraud_log: self.fraud_attempts.into_iter().collect::<FraudLog>(),
            last_result: None,
        })
    }
}
