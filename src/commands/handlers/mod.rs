//! Per-domain flow handlers
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

pub mod chats;
pub mod notifications;
pub mod users;
