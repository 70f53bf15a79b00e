// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat transport abstraction
//!
//! The bot only talks to users through [`ChatTransport`]. The production
//! implementation is the Telegram Bot API; tests use [`mock::RecordingTransport`].

pub mod mock;
pub mod telegram;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::store::UserId;

pub use telegram::TelegramTransport;

pub type ChatId = i64;

/// A message previously sent by the bot, addressable for edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: i64,
}

/// Sender of an inbound event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sender {
    pub id: UserId,
    pub username: Option<String>,
}

/// Something a user did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender: Sender,
    pub chat_id: ChatId,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Free text, including commands and reply-keyboard buttons
    Text(String),
    /// Inline button tap
    Selection {
        /// Id to acknowledge with [`ChatTransport::answer_selection`]
        query_id: String,
        data: String,
        /// Message carrying the tapped keyboard
        message: Option<MessageRef>,
    },
    /// File attachment
    Document(IncomingFile),
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub file_id: String,
    pub file_name: Option<String>,
    pub size: Option<u64>,
}

impl InboundEvent {
    pub fn user_id(&self) -> UserId {
        self.sender.id
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub data: String,
}

impl Button {
    pub fn new(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: data.into(),
        }
    }
}

/// Keyboard attached to an outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMarkup {
    /// Buttons under the message, rows of inline buttons
    Inline(Vec<Vec<Button>>),
    /// Persistent reply keyboard, rows of button labels
    Keyboard(Vec<Vec<String>>),
    RemoveKeyboard,
}

impl ReplyMarkup {
    /// Every callback identifier in an inline keyboard
    pub fn selection_ids(&self) -> Vec<&str> {
        match self {
            ReplyMarkup::Inline(rows) => rows.iter().flatten().map(|b| b.data.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Outbound side of the chat platform plus the update feed
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Wait for the next batch of inbound events (may be empty)
    async fn receive(&self) -> Result<Vec<InboundEvent>>;

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageRef>;

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<()>;

    async fn delete_message(&self, message: MessageRef) -> Result<()>;

    /// Send a stored file under its display name
    async fn send_document(
        &self,
        chat_id: ChatId,
        path: &Path,
        file_name: &str,
        caption: &str,
    ) -> Result<()>;

    /// Acknowledge an inline button tap, optionally with a popup notice
    async fn answer_selection(&self, query_id: &str, notice: Option<&str>) -> Result<()>;

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>>;
}
