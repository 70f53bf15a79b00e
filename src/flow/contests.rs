// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Browse, download, upload and delete contest documents

use std::path::Path;

use super::engine::{dept_prompt, FlowEngine, Origin};
use super::keyboards::{self, DocAction, BTN_CONFIRM, BTN_REJECT};
use super::selection::DeptAction;
use crate::error::Result;
use crate::session::{BrowseData, FlowData, FlowState, Session, UploadDraft};
use crate::store::{AddDepartmentOutcome, DepartmentId, DocumentId, NewDocument};
use crate::transport::{IncomingFile, MessageRef, ReplyMarkup};

const MIN_DATE_CHARS: usize = 3;
const MIN_DEPARTMENT_CHARS: usize = 2;
const MAX_DEPARTMENT_CHARS: usize = 100;

/// Outcome of a selection handler: an optional short notice for the tap
pub(crate) type Notice = Option<String>;

fn notice(text: &str) -> Notice {
    Some(text.to_string())
}

fn or_no_date(date: &str) -> &str {
    if date.is_empty() {
        "Без даты"
    } else {
        date
    }
}

impl FlowEngine {
    pub(crate) async fn on_department(
        &self,
        origin: Origin,
        action: DeptAction,
        id: DepartmentId,
        message: Option<MessageRef>,
    ) -> Result<Notice> {
        if action != DeptAction::Show && !self.admin.is_admin(origin.user) {
            return Ok(notice("❌ У вас нет прав"));
        }

        let Some(department) = self.store.get_department(id).await? else {
            let departments = self.departments().await?;
            self.edit_or_reply(
                origin,
                message,
                dept_prompt(action),
                keyboards::departments_keyboard(&departments, action),
            )
            .await?;
            return Ok(notice("Отдел не найден"));
        };

        if action == DeptAction::Upload {
            self.reset(
                origin,
                Session::new(FlowState::WaitingTitle, FlowData::Upload(UploadDraft::new(id))),
            )
            .await;
            self.reply(
                origin,
                "📝 Введите название конкурса:",
                Some(ReplyMarkup::RemoveKeyboard),
            )
            .await?;
            return Ok(None);
        }

        let documents = self.store.list_documents(id).await?;
        let state = match action {
            DeptAction::Delete => FlowState::ChoosingDepartmentForDelete,
            _ => FlowState::ChoosingDepartmentForShow,
        };
        self.reset(
            origin,
            Session::new(
                state,
                FlowData::Browse(BrowseData {
                    department_id: Some(id),
                }),
            ),
        )
        .await;

        if documents.is_empty() {
            let departments = self.departments().await?;
            self.edit_or_reply(
                origin,
                message,
                "📭 В этом отделе пока нет конкурсов.\nВыберите другой отдел:",
                keyboards::departments_keyboard(&departments, action),
            )
            .await?;
            return Ok(notice("В отделе нет конкурсов"));
        }

        let (text, doc_action) = match action {
            DeptAction::Delete => (
                format!(
                    "🗑 {}\n⚠️ Удаление нельзя отменить!\nВыберите конкурс для удаления:",
                    department.name
                ),
                DocAction::Delete,
            ),
            _ => (
                format!("📂 {}\nВыберите конкурс для скачивания:", department.name),
                DocAction::Download,
            ),
        };
        self.reply(
            origin,
            &text,
            Some(keyboards::documents_keyboard(&documents, doc_action)),
        )
        .await?;
        Ok(None)
    }

    pub(crate) async fn on_download(
        &self,
        origin: Origin,
        id: DocumentId,
    ) -> Result<Notice> {
        let Some(document) = self.store.get_document(id).await? else {
            self.refresh_list(origin, DeptAction::Show).await?;
            return Ok(notice("❌ Конкурс не найден"));
        };

        if !self.files.exists(&document.file_path).await {
            tracing::warn!(
                document = document.id,
                path = %document.file_path.display(),
                "Stored file is missing"
            );
            self.reply(origin, "❌ Файл не найден", None).await?;
            return Ok(None);
        }

        self.reply(
            origin,
            &format!("📄 Скачивание файла: {}", document.title),
            None,
        )
        .await?;
        let caption = format!("📌 {}\n📅 {}", document.title, or_no_date(&document.date));
        self.transport
            .send_document(
                origin.chat_id,
                &document.file_path,
                &document.file_name,
                &caption,
            )
            .await?;
        self.reply(
            origin,
            "✅ Файл отправлен!",
            Some(self.main_keyboard(origin.user)),
        )
        .await?;

        self.leave_browse(origin);
        Ok(None)
    }

    pub(crate) async fn on_delete_document(
        &self,
        origin: Origin,
        id: DocumentId,
    ) -> Result<Notice> {
        if !self.admin.is_admin(origin.user) {
            return Ok(notice("❌ У вас нет прав"));
        }

        let document = self.store.get_document(id).await?;
        let deleted = match &document {
            Some(_) => self.store.delete_document(id).await?,
            None => false,
        };
        let Some(document) = document.filter(|_| deleted) else {
            self.refresh_list(origin, DeptAction::Delete).await?;
            return Ok(notice("❌ Конкурс не найден"));
        };

        tracing::info!(
            target: "contest_assistant::audit",
            user = origin.user,
            document = document.id,
            title = %document.title,
            "Contest deleted"
        );
        self.reply(
            origin,
            &format!(
                "✅ Конкурс удален!\n\n🗑 Название: {}\n📅 Дата: {}",
                document.title,
                or_no_date(&document.date)
            ),
            Some(self.main_keyboard(origin.user)),
        )
        .await?;

        self.leave_browse(origin);
        Ok(None)
    }

    /// End a browse or delete flow. Old list buttons can be tapped from any
    /// state, and other flows must survive them.
    fn leave_browse(&self, origin: Origin) {
        if matches!(
            self.sessions.state(origin.user),
            FlowState::ChoosingDepartmentForShow | FlowState::ChoosingDepartmentForDelete
        ) {
            self.sessions.clear(origin.user);
        }
    }

    pub(crate) async fn on_back(
        &self,
        origin: Origin,
        message: Option<MessageRef>,
    ) -> Result<Notice> {
        let (action, state) = match self.sessions.state(origin.user) {
            FlowState::ChoosingDepartmentForDelete => (
                DeptAction::Delete,
                FlowState::ChoosingDepartmentForDelete,
            ),
            _ => (DeptAction::Show, FlowState::ChoosingDepartmentForShow),
        };

        let departments = self.departments().await?;
        self.reset(
            origin,
            Session::new(state, FlowData::Browse(BrowseData::default())),
        )
        .await;
        self.delete_quietly(message).await;
        self.reply(
            origin,
            dept_prompt(action),
            Some(keyboards::departments_keyboard(&departments, action)),
        )
        .await?;
        Ok(None)
    }

    /// Inline "❌ Отмена" under a department list
    pub(crate) async fn on_cancel_selection(
        &self,
        origin: Origin,
        message: Option<MessageRef>,
    ) -> Result<Notice> {
        self.delete_quietly(message).await;
        self.reset(origin, Session::default()).await;
        self.reply(
            origin,
            "✅ Действие отменено",
            Some(self.main_keyboard(origin.user)),
        )
        .await?;
        Ok(notice("Отменено"))
    }

    /// Show the document list the user was browsing, or the departments
    async fn refresh_list(&self, origin: Origin, action: DeptAction) -> Result<()> {
        let department = self
            .sessions
            .get(origin.user)
            .browse()
            .and_then(|b| b.department_id);

        if let Some(id) = department {
            let documents = self.store.list_documents(id).await?;
            if !documents.is_empty() {
                let doc_action = match action {
                    DeptAction::Delete => DocAction::Delete,
                    _ => DocAction::Download,
                };
                self.reply(
                    origin,
                    "Выберите конкурс:",
                    Some(keyboards::documents_keyboard(&documents, doc_action)),
                )
                .await?;
                return Ok(());
            }
        }

        let departments = self.departments().await?;
        self.reply(
            origin,
            dept_prompt(action),
            Some(keyboards::departments_keyboard(&departments, action)),
        )
        .await?;
        Ok(())
    }

    /// Apply `f` to the upload draft and move on, if the user is still at `from`
    fn advance_upload<F>(
        &self,
        origin: Origin,
        from: FlowState,
        to: FlowState,
        f: F,
    ) -> Option<UploadDraft>
    where
        F: FnOnce(&mut UploadDraft),
    {
        self.sessions.update(origin.user, |session| {
            if session.state != from {
                return None;
            }
            let FlowData::Upload(draft) = &mut session.data else {
                return None;
            };
            f(draft);
            session.state = to;
            Some(draft.clone())
        })
    }

    async fn lost_draft(&self, origin: Origin) -> Result<()> {
        tracing::warn!(user = origin.user, "Upload step without a draft");
        self.cancel(origin).await
    }

    pub(crate) async fn on_title(&self, origin: Origin, text: &str) -> Result<()> {
        if text.is_empty() {
            self.reply(origin, "📝 Введите название конкурса:", None).await?;
            return Ok(());
        }

        let title = text.to_string();
        if self
            .advance_upload(origin, FlowState::WaitingTitle, FlowState::WaitingDate, |d| {
                d.title = Some(title)
            })
            .is_none()
        {
            return self.lost_draft(origin).await;
        }

        self.reply(
            origin,
            "📅 Введите дату конкурса:\n(Например: 15.12.2024 или Декабрь 2024)",
            None,
        )
        .await?;
        Ok(())
    }

    pub(crate) async fn on_date(&self, origin: Origin, text: &str) -> Result<()> {
        if text.chars().count() < MIN_DATE_CHARS {
            self.reply(origin, "❌ Неверная дата. Введите корректную дату:", None)
                .await?;
            return Ok(());
        }

        let date = text.to_string();
        if self
            .advance_upload(origin, FlowState::WaitingDate, FlowState::WaitingFile, |d| {
                d.date = Some(date)
            })
            .is_none()
        {
            return self.lost_draft(origin).await;
        }

        self.reply(
            origin,
            "✅ Дата сохранена!\n📎 Теперь отправьте PDF файл с положением конкурса.",
            None,
        )
        .await?;
        Ok(())
    }

    pub(crate) async fn on_file(&self, origin: Origin, file: &IncomingFile) -> Result<()> {
        let file_name = file.file_name.clone().unwrap_or_default();
        if !file_name.to_lowercase().ends_with(".pdf") {
            self.reply(origin, "❌ Нужен PDF файл.", None).await?;
            return Ok(());
        }

        let bytes = match self.transport.download_file(&file.file_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(user = origin.user, error = %e, "File download failed");
                self.reply(origin, "❌ Ошибка при сохранении файла. Отправьте ещё раз.", None)
                    .await?;
                return Ok(());
            }
        };
        let staged = match self.files.stage(&bytes).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(user = origin.user, error = %e, "Could not persist upload");
                self.reply(origin, "❌ Ошибка при сохранении файла. Отправьте ещё раз.", None)
                    .await?;
                return Ok(());
            }
        };

        let stem = Path::new(&file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = file_name.clone();
        let path = staged.clone();
        let draft = self.advance_upload(
            origin,
            FlowState::WaitingFile,
            FlowState::Confirmation,
            |d| {
                d.file_name = Some(name);
                d.file_path = Some(path);
                if d.title.is_none() {
                    d.title = Some(stem);
                }
            },
        );

        let Some(draft) = draft else {
            // The user left the upload while the file was downloading.
            if let Err(e) = self.files.discard(&staged).await {
                tracing::warn!(error = %e, "Failed to discard orphaned upload");
            }
            return Ok(());
        };

        let unique = staged
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let summary = format!(
            "📄 Проверьте данные:\n\n📌 Название: {}\n📅 Дата: {}\n📎 Файл: {}\n💾 Сохранён как: {}",
            draft.title.as_deref().unwrap_or_default(),
            draft.date.as_deref().unwrap_or_default(),
            file_name,
            unique
        );
        self.reply(origin, &summary, None).await?;
        self.reply(origin, "Всё верно?", Some(keyboards::confirmation_keyboard()))
            .await?;
        Ok(())
    }

    pub(crate) async fn on_confirmation(&self, origin: Origin, text: &str) -> Result<()> {
        match text {
            BTN_CONFIRM => self.commit_upload(origin).await,
            BTN_REJECT => {
                self.reset(origin, Session::default()).await;
                self.reply(
                    origin,
                    "🔄 Начинаем заново.",
                    Some(self.main_keyboard(origin.user)),
                )
                .await?;
                Ok(())
            }
            _ => {
                tracing::debug!(user = origin.user, "Ignoring text at confirmation");
                Ok(())
            }
        }
    }

    async fn commit_upload(&self, origin: Origin) -> Result<()> {
        let session = self.sessions.get(origin.user);
        let Some(draft) = session.upload().cloned() else {
            return self.lost_draft(origin).await;
        };

        let path = match draft.file_path {
            Some(path) if self.files.exists(&path).await => path,
            _ => {
                self.sessions.clear(origin.user);
                self.reply(
                    origin,
                    "❌ Файл не найден на сервере.",
                    Some(self.main_keyboard(origin.user)),
                )
                .await?;
                return Ok(());
            }
        };

        let document = self
            .store
            .add_document(NewDocument {
                title: draft.title.unwrap_or_else(|| "Без названия".to_string()),
                date: draft.date.unwrap_or_else(|| "Без даты".to_string()),
                file_name: draft.file_name.unwrap_or_default(),
                file_path: path,
                department_id: draft.department_id,
            })
            .await?;

        // Committed: the file now belongs to the store.
        self.sessions.clear(origin.user);

        tracing::info!(
            target: "contest_assistant::audit",
            user = origin.user,
            document = document.id,
            department = document.department_id,
            title = %document.title,
            "Contest added"
        );
        self.reply(
            origin,
            &format!(
                "✅ Конкурс успешно добавлен!\n\n📌 Название: {}\n📅 Дата: {}\n📎 Файл: {}",
                document.title, document.date, document.file_name
            ),
            Some(self.main_keyboard(origin.user)),
        )
        .await?;
        Ok(())
    }

    pub(crate) async fn on_new_department(&self, origin: Origin, text: &str) -> Result<()> {
        let len = text.chars().count();
        if len < MIN_DEPARTMENT_CHARS {
            self.reply(origin, "❌ Слишком короткое название. Введите еще раз:", None)
                .await?;
            return Ok(());
        }
        if len > MAX_DEPARTMENT_CHARS {
            self.reply(
                origin,
                "❌ Слишком длинное название. Максимум 100 символов:",
                None,
            )
            .await?;
            return Ok(());
        }

        match self.store.add_department(text).await? {
            AddDepartmentOutcome::Duplicate => {
                self.reply(
                    origin,
                    &format!(
                        "❌ Отдел с названием '{}' уже существует. Введите другое название:",
                        text
                    ),
                    None,
                )
                .await?;
            }
            AddDepartmentOutcome::Added(department) => {
                self.sessions.clear(origin.user);
                tracing::info!(
                    target: "contest_assistant::audit",
                    user = origin.user,
                    department = department.id,
                    name = %department.name,
                    "Department added"
                );
                self.reply(
                    origin,
                    &format!(
                        "✅ Отдел успешно добавлен!\n\n🏢 Название: {}\n\nТеперь вы можете загружать конкурсы в этот отдел.",
                        department.name
                    ),
                    Some(self.main_keyboard(origin.user)),
                )
                .await?;
            }
        }
        Ok(())
    }
}
