// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Mock LLM provider for testing
//!
//! Provides a scripted implementation of the LlmProvider trait that can be
//! used in unit and integration tests without making real API calls.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

use crate::error::{ApiError, BotError, Result};
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider, StopReason, Usage};

/// A scripted outcome for one `complete` call
#[derive(Clone, Debug)]
pub enum MockOutcome {
    /// Return this answer text
    Answer(String),
    /// Fail with a timeout
    Timeout,
    /// Fail with a server error status
    ServerError(u16),
    /// Succeed with no text
    Empty,
}

/// A mock LLM provider for testing
#[derive(Clone)]
pub struct MockProvider {
    name: String,
    outcomes: Arc<Mutex<VecDeque<MockOutcome>>>,
    fallback: MockOutcome,
    call_count: Arc<AtomicUsize>,
    recorded_requests: Arc<Mutex<Vec<CompletionRequest>>>,
    models: Vec<String>,
    gate: Option<Arc<Notify>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a new mock provider that always answers "Mock answer"
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            fallback: MockOutcome::Answer("Mock answer".to_string()),
            call_count: Arc::new(AtomicUsize::new(0)),
            recorded_requests: Arc::new(Mutex::new(vec![])),
            models: vec!["mock-model".to_string()],
            gate: None,
        }
    }

    /// Answer every call with this text
    pub fn with_response(mut self, text: impl Into<String>) -> Self {
        self.fallback = MockOutcome::Answer(text.into());
        self
    }

    /// Queue outcomes, consumed in order before falling back
    pub fn with_outcomes(self, outcomes: Vec<MockOutcome>) -> Self {
        lock(&self.outcomes).extend(outcomes);
        self
    }

    /// Queue one outcome
    pub fn push_outcome(&self, outcome: MockOutcome) {
        lock(&self.outcomes).push_back(outcome);
    }

    /// Replace the advertised model list
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Hold every call until the gate is notified once per call
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Get the number of times complete() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get all recorded requests
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        lock(&self.recorded_requests).clone()
    }

    /// Get the last request made
    pub fn last_request(&self) -> Option<CompletionRequest> {
        lock(&self.recorded_requests).last().cloned()
    }

    fn next_outcome(&self) -> MockOutcome {
        lock(&self.outcomes)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Mock provider lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst);
        let model = request.model.clone();
        lock(&self.recorded_requests).push(request);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match self.next_outcome() {
            MockOutcome::Answer(text) => Ok(CompletionResponse {
                id: format!("mock-{call}"),
                model,
                text,
                stop_reason: Some(StopReason::EndTurn),
                usage: Usage::default(),
            }),
            MockOutcome::Timeout => Err(BotError::Api(ApiError::Timeout)),
            MockOutcome::ServerError(status) => Err(BotError::Api(ApiError::ServerError {
                status,
                message: "mock failure".to_string(),
            })),
            MockOutcome::Empty => Err(BotError::Api(ApiError::EmptyAnswer)),
        }
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(self.models.clone())
    }
}
