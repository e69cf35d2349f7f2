//! Shared types for the tutoring booking engine
//!
//! Domain models, the booking ledger contract and the error types used by
//! both the ledger client and the slot engine.

pub mod error;
pub mod ledger;
pub mod models;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use http;
pub use ledger::BookingLedger;
pub use serde::{Deserialize, Serialize};
