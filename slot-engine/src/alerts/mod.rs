//! Booking change banners
//!
//! "Your booking was modified / cancelled" banners, deduplicated against the
//! ids the learner already acknowledged.

mod store;
mod tracker;

pub use store::{AlertStore, JsonFileAlertStore, MemoryAlertStore};
pub use tracker::{AlertBanners, AlertDedupTracker, AlertKind};
