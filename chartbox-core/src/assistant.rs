use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message of a chat transcript, as relayed to the assistant backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("The assistant server is not running or cannot be reached")]
    Unreachable,
    #[error("Assistant request failed with status {0}")]
    Backend(u16),
    #[error("Assistant returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Represents the external AI backend chat messages are relayed to.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Sends a prompt together with the prior transcript, returning the reply.
    async fn ask(&self, prompt: &str, history: &[ChatTurn]) -> Result<String, AssistantError>;

    /// Returns whether the backend currently answers its health endpoint.
    async fn health(&self) -> bool;
}
