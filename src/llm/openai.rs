use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::config::{Config, DEFAULT_BASE_URL};
use crate::error::{Error, Result};
use crate::llm::parser::{error_message, parse_completion};
use crate::llm::prompts::{ClassificationRequest, SYSTEM_PROMPT};
use crate::llm::provider::LLMProvider;
use crate::llm::rate_limiter::RateLimiter;
use crate::models::category::Classification;

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: RateLimiter,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl OpenAIProvider {
    /// Without a timeout the client waits as long as the server keeps the
    /// connection open.
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        timeout: Option<Duration>,
        rate_limiter: RateLimiter,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            rate_limiter,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.api_key.clone(),
            Some(config.base_url.clone()),
            config.request_timeout,
            RateLimiter::new(config.requests_per_minute),
        )
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_request(request: &ClassificationRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: request.to_prompt(),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn classify_developer(&self, request: &ClassificationRequest) -> Result<Classification> {
        self.rate_limiter.wait().await;
        tracing::debug!("Classifying developer '{}' with {}", request.developer, request.model);

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&Self::build_request(request))
            .send()
            .await?;

        self.rate_limiter.update_from_headers(response.headers()).await;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            return Err(Error::RateLimited(retry_after));
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::LLMApi(format!(
                "OpenAI API error ({}): {}",
                status,
                error_message(&body)
            )));
        }

        parse_completion(&body)
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}
