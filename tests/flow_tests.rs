// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

mod common;

use common::{Harness, ADMIN, USER};

use contest_assistant::flow::keyboards::{
    BTN_ASK, BTN_CONFIRM, BTN_DELETE, BTN_NEW_DEPARTMENT, BTN_REJECT, BTN_SHOW, BTN_UPLOAD,
};
use contest_assistant::session::FlowState;
use contest_assistant::store::DocumentStore;
use contest_assistant::transport::mock::Outbound;

const ROBOTICS: i64 = 6;

fn last_notice(h: &Harness) -> Option<String> {
    h.transport.outbound().iter().rev().find_map(|o| match o {
        Outbound::Answer { notice, .. } => Some(notice.clone().unwrap_or_default()),
        _ => None,
    })
}

/// Drive an operator upload up to the confirmation step
async fn upload_until_confirmation(h: &Harness) {
    h.text(ADMIN, BTN_UPLOAD).await;
    h.tap(ADMIN, "contests_upload_dept_6").await;
    h.text(ADMIN, "Robotics Cup").await;
    h.text(ADMIN, "15.12.2024").await;
    h.upload(ADMIN, "F1", "Rules2024.PDF", b"%PDF-1.4 rules").await;
    assert_eq!(h.state(ADMIN), FlowState::Confirmation);
}

#[tokio::test]
async fn test_upload_pipeline_commits_document() {
    let h = Harness::new().await;

    h.text(ADMIN, BTN_UPLOAD).await;
    assert_eq!(h.state(ADMIN), FlowState::ChoosingDepartmentForUpload);

    h.tap(ADMIN, "contests_upload_dept_6").await;
    assert_eq!(h.state(ADMIN), FlowState::WaitingTitle);

    h.text(ADMIN, "Robotics Cup").await;
    assert_eq!(h.state(ADMIN), FlowState::WaitingDate);

    h.text(ADMIN, "15").await;
    assert_eq!(h.state(ADMIN), FlowState::WaitingDate);
    assert_eq!(h.last_text(), "❌ Неверная дата. Введите корректную дату:");

    h.text(ADMIN, "15.12.2024").await;
    assert_eq!(h.state(ADMIN), FlowState::WaitingFile);

    h.upload(ADMIN, "F0", "notes.txt", b"plain text").await;
    assert_eq!(h.state(ADMIN), FlowState::WaitingFile);
    assert_eq!(h.last_text(), "❌ Нужен PDF файл.");
    assert_eq!(h.staged_files(), 0);

    h.upload(ADMIN, "F1", "Rules2024.PDF", b"%PDF-1.4 rules").await;
    assert_eq!(h.state(ADMIN), FlowState::Confirmation);
    assert_eq!(h.staged_files(), 1);
    let summary = h
        .transport
        .sent_texts()
        .into_iter()
        .find(|t| t.starts_with("📄 Проверьте данные"))
        .unwrap();
    assert!(summary.contains("📌 Название: Robotics Cup"));
    assert!(summary.contains("📎 Файл: Rules2024.PDF"));

    h.text(ADMIN, BTN_CONFIRM).await;
    assert_eq!(h.state(ADMIN), FlowState::Idle);
    assert!(h.last_text().starts_with("✅ Конкурс успешно добавлен!"));

    let documents = h.store.list_documents(ROBOTICS).await.unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].title, "Robotics Cup");
    assert_eq!(documents[0].date, "15.12.2024");
    assert_eq!(documents[0].file_name, "Rules2024.PDF");
    assert!(documents[0].file_path.exists());
    assert_eq!(h.staged_files(), 1);
}

#[tokio::test]
async fn test_cancel_at_confirmation_deletes_staged_file() {
    let h = Harness::new().await;
    upload_until_confirmation(&h).await;
    assert_eq!(h.staged_files(), 1);

    h.text(ADMIN, "Отмена").await;
    assert_eq!(h.state(ADMIN), FlowState::Idle);
    assert_eq!(h.last_text(), "❌ Действие отменено");
    assert_eq!(h.staged_files(), 0);
    assert!(h.store.list_documents(ROBOTICS).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reject_at_confirmation_starts_over() {
    let h = Harness::new().await;
    upload_until_confirmation(&h).await;

    h.text(ADMIN, "что-то другое").await;
    assert_eq!(h.state(ADMIN), FlowState::Confirmation);

    h.text(ADMIN, BTN_REJECT).await;
    assert_eq!(h.state(ADMIN), FlowState::Idle);
    assert_eq!(h.last_text(), "🔄 Начинаем заново.");
    assert_eq!(h.staged_files(), 0);
}

#[tokio::test]
async fn test_confirm_with_vanished_file_clears() {
    let h = Harness::new().await;
    upload_until_confirmation(&h).await;

    let staged = h.session(ADMIN).staged_file().cloned().unwrap();
    std::fs::remove_file(&staged).unwrap();

    h.text(ADMIN, BTN_CONFIRM).await;
    assert_eq!(h.state(ADMIN), FlowState::Idle);
    assert_eq!(h.last_text(), "❌ Файл не найден на сервере.");
    assert!(h.store.list_documents(ROBOTICS).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_new_department_validation() {
    let h = Harness::new().await;

    h.text(ADMIN, BTN_NEW_DEPARTMENT).await;
    assert_eq!(h.state(ADMIN), FlowState::WaitingNewDepartment);

    h.text(ADMIN, "Ш").await;
    assert_eq!(h.last_text(), "❌ Слишком короткое название. Введите еще раз:");

    h.text(ADMIN, &"я".repeat(101)).await;
    assert_eq!(
        h.last_text(),
        "❌ Слишком длинное название. Максимум 100 символов:"
    );

    h.text(ADMIN, "шашки").await;
    assert_eq!(
        h.last_text(),
        "❌ Отдел с названием 'шашки' уже существует. Введите другое название:"
    );
    assert_eq!(h.state(ADMIN), FlowState::WaitingNewDepartment);

    h.text(ADMIN, "Шахматы").await;
    assert_eq!(h.state(ADMIN), FlowState::Idle);
    assert!(h.last_text().starts_with("✅ Отдел успешно добавлен!"));
    let names: Vec<String> = h
        .store
        .list_departments()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert!(names.contains(&"Шахматы".to_string()));
    assert_eq!(names.len(), 7);
}

#[tokio::test]
async fn test_operator_flows_refused_for_users() {
    let h = Harness::new().await;

    for label in [BTN_UPLOAD, BTN_DELETE, BTN_NEW_DEPARTMENT] {
        h.text(USER, label).await;
        assert_eq!(h.last_text(), "❌ У вас нет прав");
        assert_eq!(h.state(USER), FlowState::Idle);
    }

    h.tap(USER, "contests_upload_dept_1").await;
    assert_eq!(last_notice(&h).as_deref(), Some("❌ У вас нет прав"));
    assert_eq!(h.state(USER), FlowState::Idle);
}

#[tokio::test]
async fn test_browse_and_download() {
    let h = Harness::new().await;
    let id = h.add_document(ROBOTICS, "Rules", "Rules2024.pdf").await;

    h.text(USER, BTN_SHOW).await;
    assert_eq!(h.state(USER), FlowState::ChoosingDepartmentForShow);

    h.tap(USER, "contests_show_dept_6").await;
    assert_eq!(
        h.last_text(),
        "📂 Робототехника\nВыберите конкурс для скачивания:"
    );
    let outbound = h.transport.outbound();
    let markup = outbound.iter().rev().find_map(|o| o.markup()).unwrap();
    assert!(markup
        .selection_ids()
        .contains(&format!("contests_download_{}", id).as_str()));

    h.tap(USER, &format!("contests_download_{}", id)).await;
    assert_eq!(h.transport.documents_sent(), 1);
    assert_eq!(h.last_text(), "✅ Файл отправлен!");
    assert_eq!(h.state(USER), FlowState::Idle);
}

#[tokio::test]
async fn test_empty_department_and_missing_document() {
    let h = Harness::new().await;

    h.text(USER, BTN_SHOW).await;
    h.tap(USER, "contests_show_dept_3").await;
    assert!(h.last_text().starts_with("📭 В этом отделе пока нет конкурсов"));
    assert_eq!(last_notice(&h).as_deref(), Some("В отделе нет конкурсов"));

    h.tap(USER, "contests_download_999").await;
    assert_eq!(last_notice(&h).as_deref(), Some("❌ Конкурс не найден"));
    assert_eq!(h.state(USER), FlowState::ChoosingDepartmentForShow);
    assert_eq!(h.transport.documents_sent(), 0);
}

#[tokio::test]
async fn test_operator_deletes_document() {
    let h = Harness::new().await;
    let id = h.add_document(ROBOTICS, "Old rules", "old.pdf").await;
    let path = h.store.get_document(id).await.unwrap().unwrap().file_path;

    h.text(ADMIN, BTN_DELETE).await;
    h.tap(ADMIN, "contests_delete_dept_6").await;
    assert!(h.last_text().contains("⚠️ Удаление нельзя отменить!"));

    h.tap(ADMIN, &format!("contests_delete_{}", id)).await;
    assert!(h.last_text().starts_with("✅ Конкурс удален!"));
    assert!(h.store.get_document(id).await.unwrap().is_none());
    assert!(!path.exists());
    assert_eq!(h.state(ADMIN), FlowState::Idle);
}

#[tokio::test]
async fn test_inline_cancel_returns_to_idle() {
    let h = Harness::new().await;

    h.text(USER, BTN_SHOW).await;
    h.tap(USER, "contests_cancel_show").await;
    assert_eq!(h.state(USER), FlowState::Idle);
    assert_eq!(h.last_text(), "✅ Действие отменено");
    assert_eq!(last_notice(&h).as_deref(), Some("Отменено"));
}

#[tokio::test]
async fn test_junk_selection_and_idle_text() {
    let h = Harness::new().await;

    h.tap(USER, "contests_explode_now").await;
    assert_eq!(last_notice(&h).as_deref(), Some("Кнопка устарела"));

    h.text(USER, "привет").await;
    assert_eq!(h.last_text(), "Используйте кнопки меню 👇");
    assert_eq!(h.state(USER), FlowState::Idle);
}

#[tokio::test]
async fn test_blocked_user_is_refused() {
    let h = Harness::new().await;

    h.text(ADMIN, "/troll @user2000").await;
    h.text(USER, BTN_SHOW).await;

    assert_eq!(h.last_text(), "🚫 Вы в черном списке.");
    assert_eq!(h.state(USER), FlowState::Idle);
}

#[tokio::test]
async fn test_download_tap_keeps_question_dialogue() {
    let h = Harness::new().await;
    let id = h.add_document(ROBOTICS, "Rules", "Rules2024.pdf").await;

    h.text(USER, BTN_ASK).await;
    h.tap(USER, "ai_dept_6").await;
    h.tap(USER, &format!("ai_select_{}", id)).await;
    assert_eq!(h.state(USER), FlowState::WaitingQuestion);
    let selection = h.session(USER).question().unwrap().selection;

    h.tap(USER, &format!("contests_download_{}", id)).await;

    assert_eq!(h.last_text(), "✅ Файл отправлен!");
    assert_eq!(h.state(USER), FlowState::WaitingQuestion);
    assert_eq!(h.session(USER).question().unwrap().selection, selection);
}

#[tokio::test]
async fn test_stale_list_taps_keep_pending_upload() {
    let h = Harness::new().await;
    let id = h.add_document(ROBOTICS, "Rules", "Rules2024.pdf").await;
    let other = h.add_document(ROBOTICS, "Old rules", "old.pdf").await;
    upload_until_confirmation(&h).await;
    // Two stored documents plus the staged upload
    assert_eq!(h.staged_files(), 3);

    h.tap(ADMIN, &format!("contests_download_{}", id)).await;
    assert_eq!(h.state(ADMIN), FlowState::Confirmation);
    assert_eq!(h.staged_files(), 3);

    h.tap(ADMIN, &format!("contests_delete_{}", other)).await;
    assert_eq!(h.state(ADMIN), FlowState::Confirmation);
    assert_eq!(h.staged_files(), 2);

    h.text(ADMIN, BTN_CONFIRM).await;
    assert!(h.last_text().starts_with("✅ Конкурс успешно добавлен!"));
    let titles: Vec<String> = h
        .store
        .list_documents(ROBOTICS)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.title)
        .collect();
    assert!(titles.contains(&"Robotics Cup".to_string()));
    assert!(!titles.contains(&"Old rules".to_string()));
}
