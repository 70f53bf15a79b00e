// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Conversation state machine
//!
//! [`FlowEngine::handle`] looks up the sender's session, runs the handler for
//! the current state and persists the next state. Handlers only change the
//! session after their external calls succeed, so an error leaves the user
//! where they were.

use std::sync::Arc;

use super::guard;
use super::keyboards::{self, MenuEntry};
use super::selection::{DeptAction, Selection};
use crate::commands::admin::AdminState;
use crate::config::{DialogueConfig, Settings};
use crate::context::ContextAssembler;
use crate::error::Result;
use crate::llm::provider::LlmProvider;
use crate::pdf::TextExtractor;
use crate::session::{BrowseData, FlowData, FlowState, QaSession, Session, SessionStore};
use crate::store::{Department, DocumentStore, FileStore, UserId};
use crate::transport::{ChatTransport, EventKind, InboundEvent, IncomingFile, MessageRef, ReplyMarkup};

/// Collaborators the engine drives
#[derive(Clone)]
pub struct FlowDeps {
    pub sessions: Arc<SessionStore>,
    pub store: Arc<dyn DocumentStore>,
    pub files: FileStore,
    pub transport: Arc<dyn ChatTransport>,
    pub llm: Arc<dyn LlmProvider>,
    pub extractor: Arc<dyn TextExtractor>,
    pub admin: Arc<AdminState>,
}

/// Tunables copied from settings at startup
#[derive(Debug, Clone)]
pub(crate) struct FlowOptions {
    pub model: String,
    pub max_tokens: u32,
    pub dialogue: DialogueConfig,
    pub default_departments: Vec<String>,
}

pub struct FlowEngine {
    pub(crate) sessions: Arc<SessionStore>,
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) files: FileStore,
    pub(crate) transport: Arc<dyn ChatTransport>,
    pub(crate) llm: Arc<dyn LlmProvider>,
    pub(crate) extractor: Arc<dyn TextExtractor>,
    pub(crate) admin: Arc<AdminState>,
    pub(crate) assembler: ContextAssembler,
    pub(crate) options: FlowOptions,
}

/// Where an event came from, for replies
#[derive(Debug, Clone, Copy)]
pub(crate) struct Origin {
    pub user: UserId,
    pub chat_id: i64,
}

impl FlowEngine {
    pub fn new(deps: FlowDeps, settings: &Settings) -> Self {
        Self {
            sessions: deps.sessions,
            store: deps.store,
            files: deps.files,
            transport: deps.transport,
            llm: deps.llm,
            extractor: deps.extractor,
            admin: deps.admin,
            assembler: ContextAssembler::from_config(&settings.dialogue),
            options: FlowOptions {
                model: settings.llm.model.clone(),
                max_tokens: settings.llm.max_tokens,
                dialogue: settings.dialogue.clone(),
                default_departments: settings.storage.default_departments.clone(),
            },
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle one inbound event that is not a command
    pub async fn handle(&self, event: &InboundEvent) -> Result<()> {
        let origin = Origin {
            user: event.user_id(),
            chat_id: event.chat_id,
        };

        match &event.kind {
            EventKind::Selection {
                query_id,
                data,
                message,
            } => self.on_selection(origin, query_id, data, *message).await,
            EventKind::Text(text) => {
                let text = text.trim();
                if guard::is_cancel(text) {
                    return self.cancel(origin).await;
                }
                if let Some(entry) = MenuEntry::from_label(text) {
                    return self.start_flow(origin, entry).await;
                }
                self.on_text(origin, event, text).await
            }
            EventKind::Document(file) => self.on_document(origin, file).await,
            EventKind::Unsupported => {
                if self.sessions.state(origin.user) == FlowState::WaitingFile {
                    self.reply(origin, "❌ Нужен PDF файл.", None).await?;
                }
                Ok(())
            }
        }
    }

    async fn on_text(&self, origin: Origin, event: &InboundEvent, text: &str) -> Result<()> {
        let state = self.sessions.state(origin.user);
        tracing::debug!(user = origin.user, %state, "Text input");

        match state {
            FlowState::WaitingTitle => self.on_title(origin, text).await,
            FlowState::WaitingDate => self.on_date(origin, text).await,
            FlowState::WaitingFile => {
                self.reply(origin, "❌ Нужен PDF файл.", None).await?;
                Ok(())
            }
            FlowState::Confirmation => self.on_confirmation(origin, text).await,
            FlowState::WaitingNewDepartment => self.on_new_department(origin, text).await,
            FlowState::WaitingQuestion => self.on_question(origin, event, text).await,
            FlowState::ChoosingDepartmentForShow
            | FlowState::ChoosingDepartmentForUpload
            | FlowState::ChoosingDepartmentForDelete
            | FlowState::ChoosingDepartmentForQuestion
            | FlowState::ChoosingContest => {
                self.reply(origin, "👆 Выберите вариант кнопкой в сообщении выше.", None)
                    .await?;
                Ok(())
            }
            FlowState::Idle => {
                self.reply(
                    origin,
                    "Используйте кнопки меню 👇",
                    Some(self.main_keyboard(origin.user)),
                )
                .await?;
                Ok(())
            }
        }
    }

    async fn on_document(&self, origin: Origin, file: &IncomingFile) -> Result<()> {
        match self.sessions.state(origin.user) {
            FlowState::WaitingFile => self.on_file(origin, file).await,
            state => {
                tracing::debug!(user = origin.user, %state, "Ignoring file outside upload");
                Ok(())
            }
        }
    }

    async fn on_selection(
        &self,
        origin: Origin,
        query_id: &str,
        data: &str,
        message: Option<MessageRef>,
    ) -> Result<()> {
        let Some(selection) = Selection::parse(data) else {
            tracing::warn!(user = origin.user, data, "Unknown selection");
            self.transport
                .answer_selection(query_id, Some("Кнопка устарела"))
                .await?;
            return Ok(());
        };
        tracing::debug!(user = origin.user, ?selection, "Selection");

        let result = match selection {
            Selection::Department { action, id } => {
                self.on_department(origin, action, id, message).await
            }
            Selection::Download(id) => self.on_download(origin, id).await,
            Selection::DeleteDocument(id) => self.on_delete_document(origin, id).await,
            Selection::BackToDepartments => self.on_back(origin, message).await,
            Selection::Cancel(_) => self.on_cancel_selection(origin, message).await,
            Selection::QuestionDepartment(id) => {
                self.on_question_department(origin, id, message).await
            }
            Selection::QuestionDocument(id) => {
                self.on_question_document(origin, id, message).await
            }
            Selection::QuestionBack => {
                self.delete_quietly(message).await;
                self.start_flow(origin, MenuEntry::Ask).await.map(|_| None)
            }
            Selection::EndDialog => self.end_dialog(origin).await.map(|_| None),
        };

        match result {
            Ok(notice) => {
                self.transport
                    .answer_selection(query_id, notice.as_deref())
                    .await
            }
            Err(e) => {
                let _ = self
                    .transport
                    .answer_selection(query_id, Some("❌ Ошибка, попробуйте ещё раз"))
                    .await;
                Err(e)
            }
        }
    }

    /// Enter a top-level flow from the main menu
    pub(crate) async fn start_flow(&self, origin: Origin, entry: MenuEntry) -> Result<()> {
        if entry.operator_only() && !self.admin.is_admin(origin.user) {
            self.reply(origin, "❌ У вас нет прав", Some(self.main_keyboard(origin.user)))
                .await?;
            return Ok(());
        }

        if entry == MenuEntry::NewDepartment {
            self.reset(origin, Session::new(FlowState::WaitingNewDepartment, FlowData::Empty))
                .await;
            self.reply(
                origin,
                "📝 Введите название нового отдела:\n\n\
                 Например:\n\
                 • 🎨 Творческие конкурсы\n\
                 • 🧪 Научные проекты\n\
                 • 💻 IT-олимпиады\n\n\
                 Для отмены введите /cancel или 'отмена'",
                Some(ReplyMarkup::RemoveKeyboard),
            )
            .await?;
            return Ok(());
        }

        let departments = self.departments().await?;
        let (session, prompt, markup) = match entry {
            MenuEntry::Ask => (
                Session::new(
                    FlowState::ChoosingDepartmentForQuestion,
                    FlowData::Question(QaSession::new(None)),
                ),
                "Выберите отдел:",
                keyboards::question_departments_keyboard(&departments),
            ),
            MenuEntry::Show => (
                Session::new(
                    FlowState::ChoosingDepartmentForShow,
                    FlowData::Browse(BrowseData::default()),
                ),
                dept_prompt(DeptAction::Show),
                keyboards::departments_keyboard(&departments, DeptAction::Show),
            ),
            MenuEntry::Upload => (
                Session::new(FlowState::ChoosingDepartmentForUpload, FlowData::Empty),
                dept_prompt(DeptAction::Upload),
                keyboards::departments_keyboard(&departments, DeptAction::Upload),
            ),
            MenuEntry::Delete => (
                Session::new(
                    FlowState::ChoosingDepartmentForDelete,
                    FlowData::Browse(BrowseData::default()),
                ),
                dept_prompt(DeptAction::Delete),
                keyboards::departments_keyboard(&departments, DeptAction::Delete),
            ),
            MenuEntry::NewDepartment => return Ok(()),
        };

        self.reset(origin, session).await;
        self.reply(origin, prompt, Some(markup)).await?;
        Ok(())
    }

    /// Leave any flow, discarding an uncommitted upload
    pub(crate) async fn cancel(&self, origin: Origin) -> Result<()> {
        let previous = self.sessions.clear(origin.user);
        self.discard_staged(&previous).await;

        let text = if previous.state == FlowState::WaitingQuestion {
            "Диалог с ИИ завершен."
        } else {
            "❌ Действие отменено"
        };
        self.reply(origin, text, Some(self.main_keyboard(origin.user)))
            .await?;
        Ok(())
    }

    /// Replace the session, dropping any file the old one had staged
    pub(crate) async fn reset(&self, origin: Origin, session: Session) {
        let previous = self.sessions.get(origin.user);
        self.sessions.replace(origin.user, session);
        self.discard_staged(&previous).await;
    }

    async fn discard_staged(&self, session: &Session) {
        if let Some(path) = session.staged_file() {
            if let Err(e) = self.files.discard(path).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to discard staged file");
            }
        }
    }

    /// All departments, seeding the defaults into an empty store
    pub(crate) async fn departments(&self) -> Result<Vec<Department>> {
        let departments = self.store.list_departments().await?;
        if !departments.is_empty() {
            return Ok(departments);
        }
        self.store
            .seed_default_departments(&self.options.default_departments)
            .await?;
        self.store.list_departments().await
    }

    pub(crate) fn main_keyboard(&self, user: UserId) -> ReplyMarkup {
        keyboards::main_keyboard(self.admin.is_admin(user))
    }

    pub(crate) async fn reply(
        &self,
        origin: Origin,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageRef> {
        self.transport.send_text(origin.chat_id, text, markup).await
    }

    /// Remove the message carrying a tapped keyboard; failures are harmless
    pub(crate) async fn delete_quietly(&self, message: Option<MessageRef>) {
        if let Some(message) = message {
            if let Err(e) = self.transport.delete_message(message).await {
                tracing::debug!(error = %e, "Could not delete menu message");
            }
        }
    }

    /// Edit the menu message in place, or send a new one if that fails
    pub(crate) async fn edit_or_reply(
        &self,
        origin: Origin,
        message: Option<MessageRef>,
        text: &str,
        markup: ReplyMarkup,
    ) -> Result<()> {
        if let Some(message) = message {
            if self
                .transport
                .edit_text(message, text, Some(markup.clone()))
                .await
                .is_ok()
            {
                return Ok(());
            }
        }
        self.reply(origin, text, Some(markup)).await?;
        Ok(())
    }
}

pub(crate) fn dept_prompt(action: DeptAction) -> &'static str {
    match action {
        DeptAction::Show => "📊 Выберите отдел:\nПоказать конкурсы из какого отдела?",
        DeptAction::Upload => "📊 Выберите отдел:\nВ какой отдел загрузить конкурс?",
        DeptAction::Delete => "📊 Выберите отдел:\nИз какого отдела удалить конкурс?",
    }
}
