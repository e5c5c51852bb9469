//! Core types for the agent
//!
//! This module provides the fundamental types used throughout the crate:
//! - `AgentError` - Fatal error taxonomy
//! - `SessionOutcome` / `TaskOutcome` - Terminal states of a run

pub mod error;
pub mod outcome;

pub use error::AgentError;
pub use outcome::{SessionOutcome, TaskOutcome};
