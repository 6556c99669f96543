//! Chat completion request envelope
//!
//! Only the fields the governor needs are modelled; everything else in an
//! OpenAI-shaped body is ignored.

use serde::Deserialize;

use crate::error::GovernError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Parse a request body
    pub fn from_slice(body: &[u8]) -> Result<Self, GovernError> {
        serde_json::from_slice(body).map_err(|e| GovernError::InvalidInput(e.to_string()))
    }

    /// The prompt is the content of the last message
    pub fn prompt(&self) -> Result<&str, GovernError> {
        let last = self
            .messages
            .last()
            .ok_or_else(|| GovernError::InvalidInput("no messages provided".to_string()))?;

        if last.content.trim().is_empty() {
            return Err(GovernError::InvalidInput("empty prompt".to_string()));
        }
        Ok(&last.content)
    }
}
