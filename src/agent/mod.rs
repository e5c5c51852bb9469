//! Agent execution loop

mod agent_loop;
mod config;
mod observer;

pub use agent_loop::Agent;
pub use config::{AgentConfig, DEFAULT_MAX_TURNS};
pub use observer::{AgentObserver, NullObserver};
