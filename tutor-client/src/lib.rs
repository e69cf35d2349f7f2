//! Tutor Client - HTTP client for the booking ledger API
//!
//! Provides the network-backed [`shared::BookingLedger`] implementation.

pub mod config;
pub mod error;
pub mod http;
pub mod ledger;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use ledger::HttpLedger;
