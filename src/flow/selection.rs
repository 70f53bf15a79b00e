// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Inline-button identifiers
//!
//! Every inline button carries one of these as its callback data. The string
//! forms are stable: buttons sent before a restart must still parse.

use crate::store::{DepartmentId, DocumentId};

/// What a department pick in the contests menu is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeptAction {
    Show,
    Upload,
    Delete,
}

impl DeptAction {
    pub fn as_str(self) -> &'static str {
        match self {
            DeptAction::Show => "show",
            DeptAction::Upload => "upload",
            DeptAction::Delete => "delete",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "show" => Some(DeptAction::Show),
            "upload" => Some(DeptAction::Upload),
            "delete" => Some(DeptAction::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    Department { action: DeptAction, id: DepartmentId },
    Download(DocumentId),
    DeleteDocument(DocumentId),
    BackToDepartments,
    Cancel(DeptAction),
    QuestionDepartment(DepartmentId),
    QuestionDocument(DocumentId),
    QuestionBack,
    EndDialog,
}

impl Selection {
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(rest) = data.strip_prefix("contests_") {
            return Self::parse_contests(rest);
        }
        if let Some(rest) = data.strip_prefix("ai_") {
            return match rest {
                "back_to_depts" => Some(Selection::QuestionBack),
                "end_dialog" => Some(Selection::EndDialog),
                _ => {
                    if let Some(id) = rest.strip_prefix("dept_") {
                        id.parse().ok().map(Selection::QuestionDepartment)
                    } else if let Some(id) = rest.strip_prefix("select_") {
                        id.parse().ok().map(Selection::QuestionDocument)
                    } else {
                        None
                    }
                }
            };
        }
        None
    }

    fn parse_contests(rest: &str) -> Option<Self> {
        if rest == "back_to_depts" {
            return Some(Selection::BackToDepartments);
        }
        if let Some(action) = rest.strip_prefix("cancel_") {
            return DeptAction::parse(action).map(Selection::Cancel);
        }
        if let Some(id) = rest.strip_prefix("download_") {
            return id.parse().ok().map(Selection::Download);
        }
        // `<action>_dept_<id>` must be tried before `delete_<id>`.
        if let Some((action, id)) = rest.split_once("_dept_") {
            let action = DeptAction::parse(action)?;
            let id = id.parse().ok()?;
            return Some(Selection::Department { action, id });
        }
        if let Some(id) = rest.strip_prefix("delete_") {
            return id.parse().ok().map(Selection::DeleteDocument);
        }
        None
    }

    pub fn encode(&self) -> String {
        match self {
            Selection::Department { action, id } => {
                format!("contests_{}_dept_{}", action.as_str(), id)
            }
            Selection::Download(id) => format!("contests_download_{}", id),
            Selection::DeleteDocument(id) => format!("contests_delete_{}", id),
            Selection::BackToDepartments => "contests_back_to_depts".to_string(),
            Selection::Cancel(action) => format!("contests_cancel_{}", action.as_str()),
            Selection::QuestionDepartment(id) => format!("ai_dept_{}", id),
            Selection::QuestionDocument(id) => format!("ai_select_{}", id),
            Selection::QuestionBack => "ai_back_to_depts".to_string(),
            Selection::EndDialog => "ai_end_dialog".to_string(),
        }
    }
}
