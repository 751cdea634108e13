//! Messaging gateway
//!
//! Outbound delivery seam. Sends are fire-and-forget from the
//! conversation layer's perspective; implementations log their own
//! failures and never surface them back into conversation state.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use async_trait::async_trait;
use log::info;

use crate::core::response::{chunk_for_message, Reply};

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, chat_id: i64, reply: Reply);
}

/// Logs deliveries instead of transporting them
///
/// The stand-in gateway used by the binary; a platform adapter replaces
/// it in a real deployment.
pub struct ConsoleMessenger;

#[async_trait]
impl Messenger for ConsoleMessenger {
    async fn send(&self, chat_id: i64, reply: Reply) {
        for chunk in chunk_for_message(&reply.text) {
            info!("-> chat {chat_id}: {chunk}");
        }
        if reply.has_buttons() {
            let tokens: Vec<&str> = reply.buttons.iter().map(|b| b.token).collect();
            info!("-> chat {chat_id}: menu {tokens:?}");
        }
    }
}

/// Discards everything; for tests and headless embedding
pub struct NullMessenger;

#[async_trait]
impl Messenger for NullMessenger {
    async fn send(&self, _chat_id: i64, _reply: Reply) {}
}
