// Chat-completion oracle addressed by model name.
//
// POSTs to `{base_url}/chat/completions` with a bearer token. Works against
// the OpenAI API and anything exposing the same route (set OPENAI_BASE_URL).

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

/// Oracle backed by a chat-completion API.
pub struct ChatCompletionOracle {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    rate_limiter: Option<RateLimiter>,
}

impl ChatCompletionOracle {
    /// Create a chat-completion oracle for the given API base and model.
    pub fn new(
        base_url: &str,
        api_key: String,
        model: String,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder().user_agent(super::USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model,
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
            model: Some(self.model.clone()),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: None,
            temperature: 0.0,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SimilarityOracle for ChatCompletionOracle {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let request = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(prompt));

        let reply = send_chat(request).await?;

        debug!(
            model = %self.model,
            reply = %truncate_chars(&reply, 40),
            "Chat completion reply"
        );

        Ok(reply)
    }
}
