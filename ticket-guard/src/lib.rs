//! Ticket validation and fraud flagging for event entrances.
//!
//! A gate scans ticket codes; each scan is decided by the
//! [`ValidationEngine`]:
//!
//! - first scan of an unused ticket: **VALID**, the ticket becomes used and a
//!   check-in entry is appended
//! - any later scan of that ticket: **DUPLICATE**, a flagged fraud entry
//! - a code that matches no ticket: **INVALID**, a blocked fraud entry
//!
//! Statistics and the capacity view are recomputed from state on request.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::num::NonZeroU32;
//! use std::sync::Arc;
//! use ticket_guard::{Dataset, GuardEnvironment, QrCode, TicketGuard};
//! use ticket_guard_core::environment::{RandomIdGenerator, SystemClock};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = Dataset::seed()?.into_state()?;
//! let env = GuardEnvironment::new(Arc::new(SystemClock), Arc::new(RandomIdGenerator));
//! let guard = TicketGuard::new(state, env);
//!
//! let result = guard.validate(QrCode::parse("QR001")?).await?;
//! println!("{}: {}", result.status.as_str(), result.message);
//!
//! let stats = guard.stats().await;
//! println!("Checked in: {}%", stats.check_in_rate);
//!
//! let venue = NonZeroU32::new(5000).ok_or("capacity must be positive")?;
//! let capacity = guard.capacity_info(venue).await;
//! println!("Capacity: {}%", capacity.percentage);
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod config;
pub mod dataset;
pub mod guard;
pub mod metrics;
pub mod presentation;
pub mod stats;
pub mod ticket_store;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use audit::{AuditLog, CheckInLog, FraudLog};
pub use config::{Config, ConfigError};
pub use dataset::{Dataset, DatasetError};
pub use guard::{GuardError, TicketGuard};
pub use presentation::StatusPresentation;
pub use stats::{CapacityInfo, CapacityStatus, Percentage, TicketStats};
pub use ticket_store::{TicketStore, TicketStoreError, TypeBreakdown};
pub use types::{
    CheckInLogEntry, FraudId, FraudLogEntry, FraudReason, FraudStatus, QrCode, ScanInputError,
    Ticket, TicketId, TicketRef, TicketStatus,
};
pub use validation::{
    GuardAction, GuardEnvironment, GuardState, InvalidScanPolicy, ValidationEngine,
    ValidationResult, ValidationStatus,
};
