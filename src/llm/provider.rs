// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! LLM Provider trait and related types
//!
//! Defines the abstraction layer over the remote chat-completion service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::llm::message::Message;

/// Main trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "deepseek")
    fn name(&self) -> &str;

    /// Non-streaming completion.
    ///
    /// Returns `ApiError::EmptyAnswer` when the call succeeds but carries no text.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// List model identifiers exposed by the service (used for health checks)
    async fn list_models(&self) -> Result<Vec<String>>;
}

/// Request for completion
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model to use
    pub model: String,

    /// Ordered turns, system turn first
    pub messages: Vec<Message>,

    /// Maximum tokens in response
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create a request with the default answer budget
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: 150,
        }
    }

    /// Set the answer budget
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Response ID
    pub id: String,

    /// Model used
    pub model: String,

    /// Assistant answer text (never empty)
    pub text: String,

    /// Stop reason
    pub stop_reason: Option<StopReason>,

    /// Token usage
    pub usage: Usage,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of message
    EndTurn,
    /// Hit max tokens
    MaxTokens,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Input tokens
    pub input_tokens: u32,
    /// Output tokens
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new("deepseek-chat", vec![Message::user("Hello")])
            .with_max_tokens(300);

        assert_eq!(request.model, "deepseek-chat");
        assert_eq!(request.max_tokens, 300);
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn test_completion_request_default_budget() {
        let request = CompletionRequest::new("deepseek-chat", vec![]);
        assert_eq!(request.max_tokens, 150);
    }
}
