// Core layer - shared types and configuration
pub mod core;

// Features layer - domain features
pub mod features;

// Infrastructure - persistence and outbound messaging
pub mod database;
pub mod messaging;

// Conversation state - per-user pending actions
pub mod conversation;

// Application layer
pub mod command_handler;
pub mod commands;

// Re-export core config
pub use core::Config;

// Re-export the pieces embedders wire together
pub use command_handler::CommandHandler;
pub use commands::{CallbackAction, Command, CommandContext};
pub use conversation::{PendingAction, SessionStore};
pub use database::{
    Authorizer, Chat, ChatStore, MemoryDatabase, NotificationStore, ParticipantStore,
    SqliteDatabase,
};
pub use features::{
    AssistantService, DeliveryScheduler, ExclusionRule, Frequency, Notification, Participant,
};
pub use messaging::{ConsoleMessenger, Messenger, NullMessenger};
