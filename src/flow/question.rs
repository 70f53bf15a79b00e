// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Questions to the model about one selected document
//!
//! The dialogue is primed once with the document text. Every answer is
//! checked against the session's selection token before it is shown, so an
//! answer that arrives after the user moved on is dropped.

use super::contests::Notice;
use super::engine::{FlowEngine, Origin};
use super::guard;
use super::keyboards::{self, DocAction};
use crate::context::ContextAssembler;
use crate::error::Result;
use crate::llm::message::Role;
use crate::llm::provider::CompletionRequest;
use crate::session::{DocumentRef, FlowData, FlowState, QaSession, Session};
use crate::store::{DepartmentId, DocumentId};
use crate::transport::{InboundEvent, MessageRef};

const UNAVAILABLE: &str = "⚠️ ИИ сейчас недоступен. Попробуйте задать вопрос позже.";

impl FlowEngine {
    pub(crate) async fn on_question_department(
        &self,
        origin: Origin,
        id: DepartmentId,
        message: Option<MessageRef>,
    ) -> Result<Notice> {
        let departments = self.departments().await?;
        let Some(department) = departments.iter().find(|d| d.id == id) else {
            self.edit_or_reply(
                origin,
                message,
                "Выберите отдел:",
                keyboards::question_departments_keyboard(&departments),
            )
            .await?;
            return Ok(Some("Отдел не найден".to_string()));
        };

        let documents = self.store.list_documents(id).await?;
        if documents.is_empty() {
            self.edit_or_reply(
                origin,
                message,
                "📭 В этом отделе пока нет конкурсов.\nВыберите другой отдел:",
                keyboards::question_departments_keyboard(&departments),
            )
            .await?;
            return Ok(Some("В отделе нет конкурсов".to_string()));
        }

        self.reset(
            origin,
            Session::new(
                FlowState::ChoosingContest,
                FlowData::Question(QaSession::new(Some(id))),
            ),
        )
        .await;
        self.edit_or_reply(
            origin,
            message,
            &format!("📂 {}\nВыберите конкурс для вопросов к ИИ:", department.name),
            keyboards::documents_keyboard(&documents, DocAction::Ask),
        )
        .await?;
        Ok(None)
    }

    pub(crate) async fn on_question_document(
        &self,
        origin: Origin,
        id: DocumentId,
        message: Option<MessageRef>,
    ) -> Result<Notice> {
        let current = self.sessions.get(origin.user);

        let Some(document) = self.store.get_document(id).await? else {
            let department = current.question().and_then(|qa| qa.department_id);
            self.refresh_question_list(origin, department).await?;
            return Ok(Some("Конкурс не найден".to_string()));
        };

        let mut qa = current
            .question()
            .cloned()
            .unwrap_or_else(|| QaSession::new(Some(document.department_id)));
        qa.select(DocumentRef::from(&document));
        self.reset(
            origin,
            Session::new(FlowState::WaitingQuestion, FlowData::Question(qa)),
        )
        .await;
        self.delete_quietly(message).await;

        let date = if document.date.is_empty() {
            "Без даты"
        } else {
            document.date.as_str()
        };
        self.reply(
            origin,
            &format!(
                "📄 Положение конкурса:\n📌 {}\n📅 {}\n\n⬇️ Файл отправлен ниже:",
                document.title, date
            ),
            None,
        )
        .await?;
        if let Err(e) = self
            .transport
            .send_document(
                origin.chat_id,
                &document.file_path,
                &document.file_name,
                &format!("📄 {}", document.title),
            )
            .await
        {
            tracing::warn!(document = document.id, error = %e, "Could not send document");
        }

        self.reply(
            origin,
            &format!(
                "🤖 Теперь вы можете задать вопросы ИИ по этому конкурсу\n\n\
                 Конкурс: {}\n\n\
                 Напишите свой вопрос для ИИ.\n\
                 Диалог будет продолжаться до отмены.\n\
                 Напишите 'отмена' или нажмите кнопку 'Закончить диалог' для завершения.",
                document.title
            ),
            Some(keyboards::end_dialog_keyboard()),
        )
        .await?;
        Ok(None)
    }

    /// Resend the document list, or the departments, without touching the session
    async fn refresh_question_list(
        &self,
        origin: Origin,
        department: Option<DepartmentId>,
    ) -> Result<()> {
        if let Some(id) = department {
            let documents = self.store.list_documents(id).await?;
            if !documents.is_empty() {
                self.reply(
                    origin,
                    "Выберите конкурс для вопросов к ИИ:",
                    Some(keyboards::documents_keyboard(&documents, DocAction::Ask)),
                )
                .await?;
                return Ok(());
            }
        }
        let departments = self.departments().await?;
        self.reply(
            origin,
            "Выберите отдел:",
            Some(keyboards::question_departments_keyboard(&departments)),
        )
        .await?;
        Ok(())
    }

    pub(crate) async fn end_dialog(&self, origin: Origin) -> Result<()> {
        self.reset(origin, Session::default()).await;
        self.reply(
            origin,
            "Диалог с ИИ завершен.",
            Some(self.main_keyboard(origin.user)),
        )
        .await?;
        Ok(())
    }

    pub(crate) async fn on_question(
        &self,
        origin: Origin,
        event: &InboundEvent,
        text: &str,
    ) -> Result<()> {
        let username = event.sender.username.as_deref().unwrap_or_default();
        let session = self.sessions.get(origin.user);
        let Some((qa, document)) = session
            .question()
            .and_then(|qa| qa.document.clone().map(|doc| (qa.clone(), doc)))
        else {
            self.reply(
                origin,
                "⚠️ Сначала выберите конкурс",
                Some(self.main_keyboard(origin.user)),
            )
            .await?;
            return Ok(());
        };

        if guard::is_spam(text) {
            audit_rejected(origin, username, text, "spam");
            self.reply(origin, "Сообщение похоже на спам 🚫", None).await?;
            return Ok(());
        }
        if guard::is_too_long(text, self.options.dialogue.question_max_chars) {
            audit_rejected(origin, username, text, "too long");
            self.reply(origin, "Слишком длинное сообщение. Разбейте на части.", None)
                .await?;
            return Ok(());
        }

        if !self.files.exists(&document.file_path).await {
            tracing::warn!(
                user = origin.user,
                document = document.id,
                "Selected document file is missing"
            );
            self.sessions.clear(origin.user);
            self.reply(
                origin,
                "❌ PDF файл выбранного конкурса не найден",
                Some(self.main_keyboard(origin.user)),
            )
            .await?;
            return Ok(());
        }

        let thinking = self.reply(origin, "ИИ думает... ⏳", None).await?;

        let mut turns = if qa.primed && !qa.turns.is_empty() {
            qa.turns.clone()
        } else {
            let document_text = self
                .extractor
                .extract_text(&document.file_path, self.options.dialogue.document_max_chars)
                .await;
            tracing::debug!(
                document = document.id,
                chars = document_text.chars().count(),
                "Priming dialogue"
            );
            self.assembler
                .build_initial(&document_text, self.admin.tone())
        };
        ContextAssembler::append(&mut turns, Role::User, text);
        let window = self.assembler.window(&turns);

        let request = CompletionRequest::new(&self.options.model, window.clone())
            .with_max_tokens(self.options.max_tokens);
        let answer = match self.llm.complete(request).await {
            Ok(response) => response.text.trim().to_string(),
            Err(e) => {
                tracing::warn!(user = origin.user, error = %e, "Model call failed");
                audit_rejected(origin, username, text, &e.to_string());
                if self
                    .transport
                    .edit_text(thinking, UNAVAILABLE, Some(keyboards::end_dialog_keyboard()))
                    .await
                    .is_err()
                {
                    self.reply(origin, UNAVAILABLE, Some(keyboards::end_dialog_keyboard()))
                        .await?;
                }
                return Ok(());
            }
        };

        let applied = self.sessions.update(origin.user, |session| {
            if session.state != FlowState::WaitingQuestion {
                return false;
            }
            let FlowData::Question(current) = &mut session.data else {
                return false;
            };
            if current.selection != qa.selection {
                return false;
            }
            let mut turns = window;
            ContextAssembler::append(&mut turns, Role::Assistant, answer.clone());
            current.turns = turns;
            current.primed = true;
            true
        });

        if !applied {
            tracing::info!(
                user = origin.user,
                document = document.id,
                "Dropping answer for a dialogue the user already left"
            );
            self.delete_quietly(Some(thinking)).await;
            return Ok(());
        }

        self.reveal(origin, thinking, &answer).await?;
        tracing::info!(
            target: "contest_assistant::audit",
            user = origin.user,
            username,
            document = document.id,
            question = text,
            answer = %answer,
            "Question answered"
        );
        Ok(())
    }

    /// Show the answer a chunk at a time in the "thinking" message
    async fn reveal(&self, origin: Origin, message: MessageRef, answer: &str) -> Result<()> {
        let chunk = self.options.dialogue.reveal_chunk_chars.max(1);
        let delay = self.options.dialogue.reveal_delay();
        let chars: Vec<char> = answer.chars().collect();

        let mut shown = chunk;
        while shown < chars.len() {
            let partial: String = chars[..shown].iter().collect();
            if let Err(e) = self
                .transport
                .edit_text(message, &format!("{}⏳", partial), None)
                .await
            {
                tracing::debug!(error = %e, "Progressive edit failed");
                break;
            }
            tokio::time::sleep(delay).await;
            shown += chunk;
        }

        if self
            .transport
            .edit_text(message, answer, Some(keyboards::end_dialog_keyboard()))
            .await
            .is_err()
        {
            self.reply(origin, answer, Some(keyboards::end_dialog_keyboard()))
                .await?;
        }
        Ok(())
    }
}

fn audit_rejected(origin: Origin, username: &str, question: &str, reason: &str) {
    tracing::info!(
        target: "contest_assistant::audit",
        user = origin.user,
        username,
        question,
        reason,
        "Question not answered"
    );
}
