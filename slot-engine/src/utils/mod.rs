//! Utility module - logging and reference-timezone helpers

pub mod logger;
pub mod time;
