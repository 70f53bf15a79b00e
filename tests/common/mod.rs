// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use contest_assistant::bot::{self, Dispatcher, Services};
use contest_assistant::config::Settings;
use contest_assistant::llm::mock_provider::MockProvider;
use contest_assistant::pdf::{truncate_chars, TextExtractor};
use contest_assistant::session::{FlowState, Session};
use contest_assistant::store::{
    DocumentStore, FileStore, NewDocument, SqliteDocumentStore, UserId,
};
use contest_assistant::transport::mock::RecordingTransport;
use contest_assistant::transport::{EventKind, InboundEvent, IncomingFile, MessageRef, Sender};

pub const ADMIN: UserId = 1000;
pub const USER: UserId = 2000;

/// Returns fixed text instead of parsing a PDF
pub struct StaticExtractor(pub String);

#[async_trait]
impl TextExtractor for StaticExtractor {
    async fn extract_text(&self, _path: &Path, max_chars: usize) -> String {
        truncate_chars(&self.0, max_chars)
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub transport: Arc<RecordingTransport>,
    pub store: Arc<SqliteDocumentStore>,
    pub files: FileStore,
    pub llm: Arc<MockProvider>,
    pub dispatcher: Arc<Dispatcher>,
}

pub fn test_settings(dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.admin.admin_id = Some(ADMIN);
    settings.admin.admin_id_env = "CONTEST_ASSISTANT_TEST_UNSET_ADMIN".to_string();
    settings.storage.data_dir = Some(dir.to_path_buf());
    settings.dialogue.reveal_delay_ms = 0;
    settings
}

impl Harness {
    pub async fn new() -> Self {
        Self::with(MockProvider::new(), "Текст положения конкурса.").await
    }

    pub async fn with(llm: MockProvider, document_text: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let settings = test_settings(dir.path());

        let transport = Arc::new(RecordingTransport::new());
        let store = Arc::new(SqliteDocumentStore::open(settings.database_path()).unwrap());
        let files = FileStore::new(settings.files_dir());
        let llm = Arc::new(llm);

        let services = Services {
            transport: transport.clone(),
            store: store.clone(),
            users: store.clone(),
            files: files.clone(),
            llm: llm.clone(),
            extractor: Arc::new(StaticExtractor(document_text.to_string())),
        };
        let dispatcher = Arc::new(bot::build(services, &settings).await.unwrap());

        Self {
            dir,
            transport,
            store,
            files,
            llm,
            dispatcher,
        }
    }

    pub fn event(user: UserId, kind: EventKind) -> InboundEvent {
        InboundEvent {
            sender: Sender {
                id: user,
                username: Some(format!("user{}", user)),
            },
            chat_id: user,
            kind,
        }
    }

    pub fn text_event(user: UserId, text: &str) -> InboundEvent {
        Self::event(user, EventKind::Text(text.to_string()))
    }

    pub async fn text(&self, user: UserId, text: &str) {
        self.dispatcher.dispatch(Self::text_event(user, text)).await;
    }

    pub async fn tap(&self, user: UserId, data: &str) {
        self.tap_message(user, data, None).await;
    }

    /// Press a button attached to a specific bot message
    pub async fn tap_message(&self, user: UserId, data: &str, message: Option<MessageRef>) {
        self.dispatcher
            .dispatch(Self::event(
                user,
                EventKind::Selection {
                    query_id: format!("q-{}", data),
                    data: data.to_string(),
                    message,
                },
            ))
            .await;
    }

    pub async fn upload(&self, user: UserId, file_id: &str, file_name: &str, bytes: &[u8]) {
        self.transport.add_file(file_id, bytes.to_vec());
        self.dispatcher
            .dispatch(Self::event(
                user,
                EventKind::Document(IncomingFile {
                    file_id: file_id.to_string(),
                    file_name: Some(file_name.to_string()),
                    size: Some(bytes.len() as u64),
                }),
            ))
            .await;
    }

    pub fn session(&self, user: UserId) -> Session {
        self.dispatcher.engine().sessions().get(user)
    }

    pub fn state(&self, user: UserId) -> FlowState {
        self.dispatcher.engine().sessions().state(user)
    }

    pub fn last_text(&self) -> String {
        self.transport.last_text().unwrap_or_default()
    }

    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.files.root())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Store a document with a real file behind it
    pub async fn add_document(&self, department_id: i64, title: &str, file_name: &str) -> i64 {
        let path = self.files.stage(b"%PDF-1.4 test").await.unwrap();
        self.store
            .add_document(NewDocument {
                title: title.to_string(),
                date: "2024-05-01".to_string(),
                file_name: file_name.to_string(),
                file_path: path,
                department_id,
            })
            .await
            .unwrap()
            .id
    }
}
