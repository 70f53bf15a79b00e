// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! DeepSeek API provider implementation
//!
//! Implements the LlmProvider trait for DeepSeek's OpenAI-compatible
//! chat-completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{ApiError, BotError, Result};
use crate::llm::message::Message;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider, StopReason, Usage};

const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/v1";

/// DeepSeek provider
pub struct DeepSeekProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl DeepSeekProvider {
    /// Create a new provider with a per-request timeout
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, DEEPSEEK_API_URL, timeout)
    }

    /// Create with a custom base URL
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build a provider from settings
    pub fn from_config(api_key: impl Into<String>, config: &LlmConfig) -> Result<Self> {
        Self::with_base_url(api_key, &config.base_url, config.timeout())
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.base_url)
    }

    /// Parse an error response
    fn parse_error(&self, status: u16, body: &str) -> BotError {
        let message = serde_json::from_str::<DeepSeekError>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());

        match status {
            401 | 403 => BotError::Api(ApiError::AuthenticationFailed),
            429 => BotError::Api(ApiError::RateLimited(60)),
            _ => BotError::Api(ApiError::ServerError { status, message }),
        }
    }
}

#[async_trait]
impl LlmProvider for DeepSeekProvider {
    fn name(&self) -> &str {
        "deepseek"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = DeepSeekRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", &self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::Api(ApiError::from_transport(&e)))?;

        let status = response.status().as_u16();

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status, &body));
        }

        let api_response: DeepSeekResponse = response
            .json()
            .await
            .map_err(|e| BotError::Api(ApiError::InvalidResponse(e.to_string())))?;

        // A success status with no choices carries no text either.
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or(BotError::Api(ApiError::EmptyAnswer))?;

        let text = choice
            .message
            .content
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(BotError::Api(ApiError::EmptyAnswer))?;

        let stop_reason = choice.finish_reason.as_deref().map(|r| match r {
            "length" => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        });

        let usage = api_response.usage.unwrap_or_default();

        Ok(CompletionResponse {
            id: api_response.id,
            model: api_response.model,
            text,
            stop_reason,
            usage: Usage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.models_url())
            .header("Authorization", format!("Bearer {}", &self.api_key))
            .send()
            .await
            .map_err(|e| BotError::Api(ApiError::from_transport(&e)))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status, &body));
        }

        let list: DeepSeekModelList = response
            .json()
            .await
            .map_err(|e| BotError::Api(ApiError::InvalidResponse(e.to_string())))?;

        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

// DeepSeek API types

#[derive(Debug, Serialize)]
struct DeepSeekRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct DeepSeekResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<DeepSeekChoice>,
    #[serde(default)]
    usage: Option<DeepSeekUsage>,
}

#[derive(Debug, Deserialize)]
struct DeepSeekChoice {
    message: DeepSeekAnswer,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeepSeekAnswer {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DeepSeekUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct DeepSeekError {
    error: DeepSeekErrorDetail,
}

#[derive(Debug, Deserialize)]
struct DeepSeekErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DeepSeekModelList {
    #[serde(default)]
    data: Vec<DeepSeekModel>,
}

#[derive(Debug, Deserialize)]
struct DeepSeekModel {
    id: String,
}
