//! Ledger implementations local to the engine

pub mod memory;

pub use memory::InMemoryLedger;
