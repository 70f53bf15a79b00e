// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for the contest assistant
//!
//! This module defines all error types used throughout the application.

use thiserror::Error;

/// Main error type for assistant operations
#[derive(Error, Debug)]
pub enum BotError {
    /// Language-model API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Document store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Chat transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SQLite errors
    #[error("Database error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Session errors
    #[error("Session error: {0}")]
    Session(String),
}

/// Language-model API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Authentication failed (invalid API key)
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    /// Rate limited by the API
    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(u32),

    /// Network connectivity error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid response from API
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// API returned an error status
    #[error("API error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Timeout waiting for response
    #[error("Request timed out")]
    Timeout,

    /// Successful status, but no text in the answer
    #[error("Empty answer from model")]
    EmptyAnswer,
}

impl ApiError {
    /// Classify a reqwest failure into timeout or network error
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_error_store() {
        let err = BotError::Store("locked".to_string());
        assert!(err.to_string().contains("Store error"));
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn test_bot_error_transport() {
        let err = BotError::Transport("chat not found".to_string());
        assert!(err.to_string().contains("Transport error"));
    }

    #[test]
    fn test_bot_error_config() {
        let err = BotError::Config("missing token".to_string());
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_bot_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BotError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_bot_error_from_api_error() {
        let err: BotError = ApiError::AuthenticationFailed.into();
        assert!(err.to_string().contains("API error"));
    }

    #[test]
    fn test_api_error_server_error() {
        let err = ApiError::ServerError {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("bad gateway"));
    }

    #[test]
    fn test_api_error_empty_answer_is_distinct() {
        let err = ApiError::EmptyAnswer;
        assert!(err.to_string().contains("Empty answer"));
        assert!(!matches!(err, ApiError::ServerError { .. }));
    }

    #[test]
    fn test_api_error_timeout() {
        assert!(ApiError::Timeout.to_string().contains("timed out"));
    }

    #[test]
    fn test_result_error() {
        fn failing() -> Result<i32> {
            Err(BotError::InvalidInput("test".to_string()))
        }

        assert!(failing().is_err());
    }
}
