//! Slot Engine - tutoring slot capacity and deferred rating prompts
//!
//! # Module layout
//!
//! ```text
//! slot-engine/src/
//! ├── core/          # config, clock, background tasks, busy guards
//! ├── capacity/      # slot occupancy and admission status
//! ├── ledger/        # in-process booking ledger
//! ├── rating/        # rating prompt scheduler and its async driver
//! ├── alerts/        # modified/cancelled banner dedup
//! ├── events.rs      # session event channel
//! ├── session.rs     # per-learner facade
//! └── utils/         # logging, reference-timezone helpers
//! ```
//!
//! The ledger itself is pluggable through [`shared::BookingLedger`]:
//! `tutor_client::HttpLedger` talks to the booking API, [`InMemoryLedger`]
//! keeps everything in process.

pub mod alerts;
pub mod capacity;
pub mod core;
pub mod events;
pub mod ledger;
pub mod rating;
pub mod session;
pub mod utils;

pub use alerts::{AlertBanners, AlertDedupTracker, AlertKind, AlertStore, JsonFileAlertStore};
pub use capacity::{SlotCapacityResolver, SlotStatusMap, admission_status};
pub use core::{Clock, EngineConfig, ManualClock, SystemClock};
pub use events::SessionEvent;
pub use ledger::InMemoryLedger;
pub use rating::{PromptConfig, PromptOutcome, PromptService, RatingPromptScheduler};
pub use session::BookingSession;

pub use shared::{AppError, AppResult, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
