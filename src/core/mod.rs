//! # Core Module
//!
//! Configuration and outbound-response plumbing shared by every layer.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0
//! - **Toggleable**: false

pub mod config;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use response::{chunk_for_message, chunk_text, Button, Reply, MESSAGE_LIMIT};
