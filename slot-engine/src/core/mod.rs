//! Core module - configuration, clock and background task lifecycle
//!
//! - [`EngineConfig`] - engine configuration
//! - [`Clock`] - injectable time source
//! - [`InFlight`] - per-gesture re-entry guard
//! - [`BackgroundTasks`] - background task registry

pub mod clock;
pub mod config;
pub mod gesture;
pub mod tasks;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use gesture::{InFlight, InFlightGuard};
pub use tasks::{BackgroundTasks, TaskKind};
