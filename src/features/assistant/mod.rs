//! # Assistant Feature
//!
//! Free-form Q&A relay behind the `/ask` flow: single-turn completion
//! with a hard timeout, logged under a per-request id.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0
//! - **Toggleable**: true

use anyhow::Result;
use log::{debug, info};
use openai::chat::{ChatCompletion, ChatCompletionMessage, ChatCompletionMessageRole};
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant for a group chat. Answer concisely and stay on topic.";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Single-turn assistant backed by the chat-completions API
#[derive(Clone)]
pub struct AssistantService {
    model: String,
}

impl AssistantService {
    pub fn new(model: impl Into<String>) -> Self {
        AssistantService {
            model: model.into(),
        }
    }

    pub async fn ask(&self, question: &str) -> Result<String> {
        let request_id = Uuid::new_v4();
        debug!("[{request_id}] assistant query: {} chars", question.len());

        let messages = vec![
            ChatCompletionMessage {
                role: ChatCompletionMessageRole::System,
                content: Some(SYSTEM_PROMPT.to_string()),
                name: None,
                function_call: None,
                tool_call_id: None,
                tool_calls: None,
            },
            ChatCompletionMessage {
                role: ChatCompletionMessageRole::User,
                content: Some(question.to_string()),
                name: None,
                function_call: None,
                tool_call_id: None,
                tool_calls: None,
            },
        ];

        let completion = timeout(
            REQUEST_TIMEOUT,
            ChatCompletion::builder(&self.model, messages).create(),
        )
        .await
        .map_err(|_| anyhow::anyhow!("assistant request timed out after 45 seconds"))??;

        let answer = completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default()
            .trim()
            .to_string();

        info!("[{request_id}] assistant answered with {} chars", answer.len());
        Ok(answer)
    }
}
