//! Deferred rating prompts
//!
//! - [`SessionState`] - dedup sets for the current session
//! - [`RatingPromptScheduler`] - synchronous prompt state machine
//! - [`PromptService`] - async driver publishing prompt events

mod scheduler;
mod service;
mod state;

pub use scheduler::{PromptState, RatingPromptScheduler, Resolution};
pub use service::{PromptConfig, PromptOutcome, PromptService, StepFailure};
pub use state::SessionState;
