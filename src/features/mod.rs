//! # Features Layer
//!
//! Domain features of the admin assistant.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

pub mod assistant;
pub mod recurrence;
pub mod roster;
pub mod scheduler;

// Re-export feature items
pub use assistant::AssistantService;
pub use recurrence::{
    is_excluded, ExclusionRule, Frequency, Notification, ParseError, SkipDay,
};
pub use roster::{draw_winner, Participant};
pub use scheduler::DeliveryScheduler;
