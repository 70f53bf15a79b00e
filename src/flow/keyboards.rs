// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Keyboards and button labels

use super::selection::{DeptAction, Selection};
use crate::store::{Department, Document};
use crate::transport::{Button, ReplyMarkup};

pub const BTN_ASK: &str = "❓ Задать вопрос";
pub const BTN_SHOW: &str = "📂 Положения конкурсов";
pub const BTN_UPLOAD: &str = "📄 Загрузить положение";
pub const BTN_DELETE: &str = "🗑 Удалить положение";
pub const BTN_NEW_DEPARTMENT: &str = "➕ Добавить отдел";
pub const BTN_CONFIRM: &str = "✅ Да все верно";
pub const BTN_REJECT: &str = "❌ Нет, изменить";
pub const BTN_END_DIALOG: &str = "❌ Закончить диалог";

const TITLE_MAX_CHARS: usize = 30;
const DEPARTMENTS_PER_ROW: usize = 2;

/// Reply-keyboard entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    Ask,
    Show,
    Upload,
    Delete,
    NewDepartment,
}

impl MenuEntry {
    pub fn from_label(text: &str) -> Option<Self> {
        match text {
            BTN_ASK => Some(MenuEntry::Ask),
            BTN_SHOW => Some(MenuEntry::Show),
            BTN_UPLOAD => Some(MenuEntry::Upload),
            BTN_DELETE => Some(MenuEntry::Delete),
            BTN_NEW_DEPARTMENT => Some(MenuEntry::NewDepartment),
            _ => None,
        }
    }

    pub fn operator_only(self) -> bool {
        matches!(
            self,
            MenuEntry::Upload | MenuEntry::Delete | MenuEntry::NewDepartment
        )
    }
}

pub fn main_keyboard(is_admin: bool) -> ReplyMarkup {
    let mut rows = vec![vec![BTN_ASK.to_string()], vec![BTN_SHOW.to_string()]];
    if is_admin {
        rows.push(vec![BTN_UPLOAD.to_string()]);
        rows.push(vec![BTN_DELETE.to_string()]);
        rows.push(vec![BTN_NEW_DEPARTMENT.to_string()]);
    }
    ReplyMarkup::Keyboard(rows)
}

pub fn confirmation_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(vec![vec![
        BTN_CONFIRM.to_string(),
        BTN_REJECT.to_string(),
    ]])
}

pub fn end_dialog_keyboard() -> ReplyMarkup {
    ReplyMarkup::Inline(vec![vec![Button::new(
        BTN_END_DIALOG,
        Selection::EndDialog.encode(),
    )]])
}

fn department_rows(
    departments: &[Department],
    selection: impl Fn(&Department) -> Selection,
) -> Vec<Vec<Button>> {
    departments
        .chunks(DEPARTMENTS_PER_ROW)
        .map(|chunk| {
            chunk
                .iter()
                .map(|d| Button::new(&d.name, selection(d).encode()))
                .collect()
        })
        .collect()
}

/// Departments for the contests menu, two per row, with a cancel row
pub fn departments_keyboard(departments: &[Department], action: DeptAction) -> ReplyMarkup {
    let mut rows = department_rows(departments, |d| Selection::Department { action, id: d.id });
    rows.push(vec![Button::new(
        "❌ Отмена",
        Selection::Cancel(action).encode(),
    )]);
    ReplyMarkup::Inline(rows)
}

/// Departments for the Q&A flow
pub fn question_departments_keyboard(departments: &[Department]) -> ReplyMarkup {
    ReplyMarkup::Inline(department_rows(departments, |d| {
        Selection::QuestionDepartment(d.id)
    }))
}

/// What picking a document in a list does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocAction {
    Download,
    Delete,
    Ask,
}

pub fn documents_keyboard(documents: &[Document], action: DocAction) -> ReplyMarkup {
    let mut rows: Vec<Vec<Button>> = documents
        .iter()
        .map(|doc| {
            let (icon, selection) = match action {
                DocAction::Download => ("📄", Selection::Download(doc.id)),
                DocAction::Delete => ("🗑", Selection::DeleteDocument(doc.id)),
                DocAction::Ask => ("📄", Selection::QuestionDocument(doc.id)),
            };
            let label = format!(
                "{} {} ({})",
                icon,
                short_title(&doc.title),
                short_date(&doc.date)
            );
            vec![Button::new(label, selection.encode())]
        })
        .collect();

    let back = match action {
        DocAction::Ask => Button::new("❌ Назад к отделам", Selection::QuestionBack.encode()),
        _ => Button::new("⬅️ Назад к отделам", Selection::BackToDepartments.encode()),
    };
    rows.push(vec![back]);
    ReplyMarkup::Inline(rows)
}

fn short_title(title: &str) -> String {
    if title.chars().count() > TITLE_MAX_CHARS {
        let head: String = title.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

fn short_date(date: &str) -> String {
    if date.is_empty() {
        "без даты".to_string()
    } else {
        date.chars().take(10).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn departments(n: i64) -> Vec<Department> {
        (1..=n)
            .map(|id| Department {
                id,
                name: format!("Dept {id}"),
            })
            .collect()
    }

    fn document(id: i64, title: &str, date: &str) -> Document {
        Document {
            id,
            title: title.to_string(),
            date: date.to_string(),
            file_name: "f.pdf".to_string(),
            file_path: PathBuf::from("/f.pdf"),
            department_id: 1,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_main_keyboard_operator_extras() {
        let ReplyMarkup::Keyboard(user_rows) = main_keyboard(false) else {
            panic!("expected reply keyboard");
        };
        let ReplyMarkup::Keyboard(admin_rows) = main_keyboard(true) else {
            panic!("expected reply keyboard");
        };
        assert_eq!(user_rows.len(), 2);
        assert_eq!(admin_rows.len(), 5);
        assert_eq!(admin_rows[4][0], BTN_NEW_DEPARTMENT);
    }

    #[test]
    fn test_departments_two_per_row_plus_cancel() {
        let ReplyMarkup::Inline(rows) = departments_keyboard(&departments(5), DeptAction::Upload)
        else {
            panic!("expected inline keyboard");
        };
        let sizes: Vec<usize> = rows.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 1, 1]);
        assert_eq!(rows[0][1].data, "contests_upload_dept_2");
        assert_eq!(rows[3][0].data, "contests_cancel_upload");
    }

    #[test]
    fn test_document_labels_are_shortened() {
        let long = "Очень длинное название конкурса по робототехнике 2024";
        let markup = documents_keyboard(
            &[document(3, long, "2024-05-01T10:00:00"), document(4, "Short", "")],
            DocAction::Delete,
        );
        let ReplyMarkup::Inline(rows) = markup else {
            panic!("expected inline keyboard");
        };
        assert!(rows[0][0].text.ends_with("... (2024-05-01)"));
        assert_eq!(rows[0][0].data, "contests_delete_3");
        assert_eq!(rows[1][0].text, "🗑 Short (без даты)");
        assert_eq!(rows[2][0].data, "contests_back_to_depts");
    }

    #[test]
    fn test_menu_entries() {
        assert_eq!(MenuEntry::from_label(BTN_ASK), Some(MenuEntry::Ask));
        assert!(MenuEntry::from_label(BTN_UPLOAD).unwrap().operator_only());
        assert!(!MenuEntry::Show.operator_only());
        assert_eq!(MenuEntry::from_label("hello"), None);
    }
}
