// Direct-endpoint oracle (Azure OpenAI style deployment URL).
//
// The configured URL is used as-is; it already names the deployment and
// api-version. Auth is an `api-key` header rather than a bearer token, and
// the body carries a system instruction plus a small token cap.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::traits::SimilarityOracle;
use super::wire::{send_chat, ChatMessage, ChatRequest};
use crate::error::OracleError;
use crate::output::truncate_chars;

/// System instruction sent ahead of every prompt.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant.";

/// Replies are a bare number, so a handful of tokens is plenty.
pub const MAX_REPLY_TOKENS: u32 = 10;

/// Oracle backed by a single deployment endpoint.
pub struct DirectHttpOracle {
    client: Client,
    endpoint: String,
    api_key: String,
    rate_limiter: Option<RateLimiter>,
}

impl DirectHttpOracle {
    pub fn new(
        endpoint: String,
        api_key: String,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder().user_agent(super::USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            rate_limiter: None,
        })
    }

    /// Space requests at least `interval` apart.
    pub fn with_rate_limit(mut self, interval: Duration) -> Self {
        self.rate_limiter = Some(RateLimiter::new(interval));
        self
    }

    /// The request body sent for one prompt.
    pub fn build_request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: None,
            messages: vec![
                ChatMessage::system(SYSTEM_INSTRUCTION),
                ChatMessage::user(prompt),
            ],
            max_tokens: Some(MAX_REPLY_TOKENS),
            temperature: 0.0,
        }
    }
}

#[async_trait]
impl SimilarityOracle for DirectHttpOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let request = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .json(&self.build_request(prompt));

        let reply = send_chat(request).await?;

        debug!(reply = %truncate_chars(&reply, 40), "Direct endpoint reply");

        Ok(reply)
    }
}
