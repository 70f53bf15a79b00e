// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Telegram Bot API transport
//!
//! Long-polls `getUpdates` and maps updates into [`InboundEvent`]s. All calls
//! go through [`TelegramTransport::call`], which unwraps the `{ok, result}`
//! envelope.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use super::{
    ChatId, ChatTransport, EventKind, InboundEvent, IncomingFile, MessageRef, ReplyMarkup, Sender,
};
use crate::config::TelegramConfig;
use crate::error::{BotError, Result};

pub struct TelegramTransport {
    client: Client,
    base_url: String,
    token: String,
    poll_timeout_secs: u64,
    offset: AtomicI64,
}

impl TelegramTransport {
    pub fn new(token: impl Into<String>, config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            poll_timeout_secs: config.poll_timeout_secs,
            offset: AtomicI64::new(0),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.base_url, self.token, file_path)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?;
        Self::unwrap_envelope(method, response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let envelope: Envelope<T> = response.json().await?;
        match (envelope.ok, envelope.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(BotError::Transport(format!(
                "{} failed ({}): {}",
                method,
                envelope.error_code.unwrap_or_default(),
                envelope.description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }

    /// Raw `getUpdates` call, acknowledging everything before `offset`
    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let body = json!({
            "offset": offset,
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(self.poll_timeout_secs + 10))
            .json(&body)
            .send()
            .await?;
        Self::unwrap_envelope("getUpdates", response).await
    }
}

fn markup_json(markup: &ReplyMarkup) -> Value {
    match markup {
        ReplyMarkup::Inline(rows) => json!({
            "inline_keyboard": rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| json!({ "text": b.text, "callback_data": b.data }))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        }),
        ReplyMarkup::Keyboard(rows) => json!({
            "keyboard": rows
                .iter()
                .map(|row| row.iter().map(|t| json!({ "text": t })).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
            "resize_keyboard": true
        }),
        ReplyMarkup::RemoveKeyboard => json!({ "remove_keyboard": true }),
    }
}

fn to_event(update: Update) -> Option<InboundEvent> {
    if let Some(query) = update.callback_query {
        let message = query.message.as_ref().map(|m| MessageRef {
            chat_id: m.chat.id,
            message_id: m.message_id,
        });
        let chat_id = query.message.as_ref().map(|m| m.chat.id).unwrap_or(query.from.id);
        return Some(InboundEvent {
            sender: query.from.into(),
            chat_id,
            kind: EventKind::Selection {
                query_id: query.id,
                data: query.data.unwrap_or_default(),
                message,
            },
        });
    }

    let message = update.message?;
    let sender: Sender = message.from?.into();
    let kind = if let Some(text) = message.text {
        EventKind::Text(text)
    } else if let Some(document) = message.document {
        EventKind::Document(IncomingFile {
            file_id: document.file_id,
            file_name: document.file_name,
            size: document.file_size,
        })
    } else {
        EventKind::Unsupported
    };

    Some(InboundEvent {
        sender,
        chat_id: message.chat.id,
        kind,
    })
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn receive(&self) -> Result<Vec<InboundEvent>> {
        let updates = self.get_updates(self.offset.load(Ordering::SeqCst)).await?;
        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.offset.store(last + 1, Ordering::SeqCst);
        }
        Ok(updates.into_iter().filter_map(to_event).collect())
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageRef> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(markup) = &markup {
            body["reply_markup"] = markup_json(markup);
        }
        let sent: SentMessage = self.call("sendMessage", body).await?;
        Ok(MessageRef {
            chat_id: sent.chat.id,
            message_id: sent.message_id,
        })
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<()> {
        let mut body = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
            "text": text,
        });
        if let Some(markup) = &markup {
            body["reply_markup"] = markup_json(markup);
        }
        match self.call::<Value>("editMessageText", body).await {
            Ok(_) => Ok(()),
            // Editing to identical text is reported as an error; nothing changed.
            Err(BotError::Transport(msg)) if msg.contains("message is not modified") => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn delete_message(&self, message: MessageRef) -> Result<()> {
        let _: bool = self
            .call(
                "deleteMessage",
                json!({ "chat_id": message.chat_id, "message_id": message.message_id }),
            )
            .await?;
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        path: &Path,
        file_name: &str,
        caption: &str,
    ) -> Result<()> {
        let bytes = tokio::fs::read(path).await?;
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", part);

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;
        let _: Value = Self::unwrap_envelope("sendDocument", response).await?;
        Ok(())
    }

    async fn answer_selection(&self, query_id: &str, notice: Option<&str>) -> Result<()> {
        let mut body = json!({ "callback_query_id": query_id });
        if let Some(notice) = notice {
            body["text"] = json!(notice);
            body["show_alert"] = json!(true);
        }
        let _: bool = self.call("answerCallbackQuery", body).await?;
        Ok(())
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        let file: TgFile = self.call("getFile", json!({ "file_id": file_id })).await?;
        let file_path = file
            .file_path
            .ok_or_else(|| BotError::Transport(format!("getFile returned no path for {}", file_id)))?;

        let response = self.client.get(self.file_url(&file_path)).send().await?;
        if !response.status().is_success() {
            return Err(BotError::Transport(format!(
                "file download failed with status {}",
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

// Bot API types

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<TgMessage>,
    #[serde(default)]
    callback_query: Option<TgCallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    message_id: i64,
    #[serde(default)]
    from: Option<TgUser>,
    chat: TgChat,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    document: Option<TgDocument>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
    chat: TgChat,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    id: i64,
    #[serde(default)]
    username: Option<String>,
}

impl From<TgUser> for Sender {
    fn from(user: TgUser) -> Self {
        Sender {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TgDocument {
    file_id: String,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    file_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TgCallbackQuery {
    id: String,
    from: TgUser,
    #[serde(default)]
    message: Option<TgMessage>,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgFile {
    file_id: String,
    #[serde(default)]
    file_path: Option<String>,
}
