//! Agent error types

use thiserror::Error;

use crate::llm::ModelError;

/// Errors that terminate an agent session early
///
/// Tool failures, invalid arguments, permission denials, and prompt
/// failures are never represented here - they are fed back to the model
/// as failure tool results and the session continues. Only unrecoverable
/// conditions surface as `AgentError`.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The model interface failed fatally (auth, quota, malformed response)
    /// or exhausted its transient-retry budget
    #[error("model interface failure: {0}")]
    Model(#[from] ModelError),
}
