//! Commands module
//!
//! Typed inbound boundary (commands and callback tokens), the shared
//! handler context, and the per-domain flow handlers.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

pub mod callback;
pub mod command;
pub mod context;
pub mod handlers;

pub use callback::CallbackAction;
pub use command::Command;
pub use context::CommandContext;
