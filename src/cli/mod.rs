//! CLI command handlers

pub mod commands;

pub use commands::{audit, load_config, patch, reschedule, retime, verify};
