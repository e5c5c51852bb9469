//! Session state and conversation persistence

mod state;
mod store;

pub use state::SessionState;
pub use store::{ConversationStore, SessionSummary};
