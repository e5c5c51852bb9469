//! Korvo - an autonomous coding assistant for the terminal
//!
//! The agent loop in [`agent`] drives a model provider ([`llm`]) against a
//! registry of tools ([`tools`]); every mutating tool call passes through the
//! permission engine ([`permissions`]) first. Sessions persist under
//! `~/.korvo` ([`session`]).

pub mod agent;
pub mod cli;
pub mod context;
pub mod core;
pub mod llm;
pub mod logging;
pub mod permissions;
pub mod session;
pub mod tools;
