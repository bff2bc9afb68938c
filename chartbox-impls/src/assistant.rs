use async_trait::async_trait;
use chartbox_core::{Assistant, AssistantError, ChatTurn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Talks to the external assistant backend over its JSON endpoints.
pub struct HttpAssistant {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [ChatTurn],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    reply: String,
}

impl HttpAssistant {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();

        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Assistant for HttpAssistant {
    async fn ask(&self, prompt: &str, history: &[ChatTurn]) -> Result<String, AssistantError> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&ChatRequest {
                message: prompt,
                history,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    AssistantError::Unreachable
                } else {
                    AssistantError::InvalidResponse(e.to_string())
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            return Err(AssistantError::Backend(status.as_u16()));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::InvalidResponse(e.to_string()))?;

        Ok(body.reply)
    }

    async fn health(&self) -> bool {
        self.client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
