// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Recording transport for tests
//!
//! Keeps every outbound call in order and serves downloads from memory.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{ChatId, ChatTransport, InboundEvent, MessageRef, ReplyMarkup};
use crate::error::{BotError, Result};

/// One recorded outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text {
        message: MessageRef,
        text: String,
        markup: Option<ReplyMarkup>,
    },
    Edit {
        message: MessageRef,
        text: String,
        markup: Option<ReplyMarkup>,
    },
    Delete(MessageRef),
    Document {
        chat_id: ChatId,
        path: PathBuf,
        file_name: String,
        caption: String,
    },
    Answer {
        query_id: String,
        notice: Option<String>,
    },
}

impl Outbound {
    /// Text of a sent or edited message
    pub fn text(&self) -> Option<&str> {
        match self {
            Outbound::Text { text, .. } | Outbound::Edit { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn markup(&self) -> Option<&ReplyMarkup> {
        match self {
            Outbound::Text { markup, .. } | Outbound::Edit { markup, .. } => markup.as_ref(),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct RecordingTransport {
    outbound: Mutex<Vec<Outbound>>,
    inbound: Mutex<VecDeque<InboundEvent>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    next_message_id: AtomicI64,
    fail_edits: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a file available to `download_file`
    pub fn add_file(&self, file_id: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        lock(&self.files).insert(file_id.into(), bytes.into());
    }

    /// Queue an event for `receive`
    pub fn push_event(&self, event: InboundEvent) {
        lock(&self.inbound).push_back(event);
    }

    /// Make every `edit_text` call fail
    pub fn set_fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }

    pub fn outbound(&self) -> Vec<Outbound> {
        lock(&self.outbound).clone()
    }

    /// Texts of sent (not edited) messages, in order
    pub fn sent_texts(&self) -> Vec<String> {
        lock(&self.outbound)
            .iter()
            .filter_map(|o| match o {
                Outbound::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Final text of every message: the last edit wins over the original send
    pub fn visible_texts(&self) -> Vec<String> {
        let outbound = lock(&self.outbound);
        let mut order: Vec<MessageRef> = Vec::new();
        let mut latest: HashMap<MessageRef, String> = HashMap::new();
        for o in outbound.iter() {
            match o {
                Outbound::Text { message, text, .. } => {
                    order.push(*message);
                    latest.insert(*message, text.clone());
                }
                Outbound::Edit { message, text, .. } => {
                    latest.insert(*message, text.clone());
                }
                Outbound::Delete(message) => {
                    latest.remove(message);
                }
                _ => {}
            }
        }
        order.iter().filter_map(|m| latest.get(m).cloned()).collect()
    }

    pub fn last_text(&self) -> Option<String> {
        lock(&self.outbound)
            .iter()
            .rev()
            .find_map(|o| o.text().map(str::to_string))
    }

    pub fn documents_sent(&self) -> usize {
        lock(&self.outbound)
            .iter()
            .filter(|o| matches!(o, Outbound::Document { .. }))
            .count()
    }

    pub fn clear(&self) {
        lock(&self.outbound).clear();
    }

    fn record(&self, outbound: Outbound) {
        lock(&self.outbound).push(outbound);
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn receive(&self) -> Result<Vec<InboundEvent>> {
        let events: Vec<InboundEvent> = lock(&self.inbound).drain(..).collect();
        if events.is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(events)
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageRef> {
        let message = MessageRef {
            chat_id,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.record(Outbound::Text {
            message,
            text: text.to_string(),
            markup,
        });
        Ok(message)
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<()> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(BotError::Transport("edit rejected".to_string()));
        }
        self.record(Outbound::Edit {
            message,
            text: text.to_string(),
            markup,
        });
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> Result<()> {
        self.record(Outbound::Delete(message));
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        path: &Path,
        file_name: &str,
        caption: &str,
    ) -> Result<()> {
        if !path.exists() {
            return Err(BotError::Transport(format!(
                "no such file: {}",
                path.display()
            )));
        }
        self.record(Outbound::Document {
            chat_id,
            path: path.to_path_buf(),
            file_name: file_name.to_string(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn answer_selection(&self, query_id: &str, notice: Option<&str>) -> Result<()> {
        self.record(Outbound::Answer {
            query_id: query_id.to_string(),
            notice: notice.map(str::to_string),
        });
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        lock(&self.files)
            .get(file_id)
            .cloned()
            .ok_or_else(|| BotError::Transport(format!("file {} not found", file_id)))
    }
}
