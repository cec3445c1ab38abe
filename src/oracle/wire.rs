// Chat-completion request/response types shared by both transports.
//
// The OpenAI chat API and a direct Azure-style deployment endpoint accept
// the same message list and return the same `choices[].message.content`
// shape; they differ only in addressing, auth header and a few body fields.

use serde::{Deserialize, Serialize};

use crate::error::OracleError;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system",
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user",
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ReplyMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyMessage {
    pub content: Option<String>,
}

impl ChatResponse {
    /// Trimmed text of the first choice.
    pub fn into_reply(self) -> Result<String, OracleError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::Malformed("response has no choices".into()))?;
        let content = choice
            .message
            .content
            .ok_or_else(|| OracleError::Malformed("first choice has no content".into()))?;
        Ok(content.trim().to_string())
    }
}

/// Send a prepared request and turn any failure into an `OracleError`.
pub async fn send_chat(request: reqwest::RequestBuilder) -> Result<String, OracleError> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(OracleError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|e| OracleError::Malformed(e.to_string()))?;

    parsed.into_reply()
}
