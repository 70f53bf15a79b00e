// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Flow states and the typed data each flow carries

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::llm::message::Message;
use crate::store::{DepartmentId, Document, DocumentId};

/// Where a user is in a multi-step flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    Idle,
    ChoosingDepartmentForShow,
    ChoosingDepartmentForUpload,
    ChoosingDepartmentForDelete,
    ChoosingDepartmentForQuestion,
    /// Picking a document to ask questions about
    ChoosingContest,
    /// Q&A loop; stays here after each answer
    WaitingQuestion,
    WaitingTitle,
    WaitingDate,
    WaitingFile,
    Confirmation,
    WaitingNewDepartment,
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FlowState::Idle => "idle",
            FlowState::ChoosingDepartmentForShow => "choosing_department_for_show",
            FlowState::ChoosingDepartmentForUpload => "choosing_department_for_upload",
            FlowState::ChoosingDepartmentForDelete => "choosing_department_for_delete",
            FlowState::ChoosingDepartmentForQuestion => "choosing_department_for_question",
            FlowState::ChoosingContest => "choosing_contest",
            FlowState::WaitingQuestion => "waiting_question",
            FlowState::WaitingTitle => "waiting_title",
            FlowState::WaitingDate => "waiting_date",
            FlowState::WaitingFile => "waiting_file",
            FlowState::Confirmation => "confirmation",
            FlowState::WaitingNewDepartment => "waiting_new_department",
        };
        f.write_str(name)
    }
}

/// Data owned by the active flow
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FlowData {
    #[default]
    Empty,
    Browse(BrowseData),
    Upload(UploadDraft),
    Question(QaSession),
}

/// Show and delete flows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BrowseData {
    pub department_id: Option<DepartmentId>,
}

/// An upload in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDraft {
    pub department_id: DepartmentId,
    pub title: Option<String>,
    pub date: Option<String>,
    pub file_name: Option<String>,
    /// Bytes already written to disk but not committed
    pub file_path: Option<PathBuf>,
}

impl UploadDraft {
    pub fn new(department_id: DepartmentId) -> Self {
        Self {
            department_id,
            title: None,
            date: None,
            file_name: None,
            file_path: None,
        }
    }
}

/// The document a Q&A session is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub id: DocumentId,
    pub title: String,
    pub date: String,
    pub file_name: String,
    pub file_path: PathBuf,
}

impl From<&Document> for DocumentRef {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            title: doc.title.clone(),
            date: doc.date.clone(),
            file_name: doc.file_name.clone(),
            file_path: doc.file_path.clone(),
        }
    }
}

/// A question-and-answer dialogue
#[derive(Debug, Clone, PartialEq)]
pub struct QaSession {
    pub department_id: Option<DepartmentId>,
    pub document: Option<DocumentRef>,
    /// Turns recorded so far; element 0 is the system turn once primed
    pub turns: Vec<Message>,
    /// The system turn has been built for `document`
    pub primed: bool,
    /// Minted on every document selection; answers for an older token are dropped
    pub selection: Uuid,
}

impl QaSession {
    pub fn new(department_id: Option<DepartmentId>) -> Self {
        Self {
            department_id,
            document: None,
            turns: Vec::new(),
            primed: false,
            selection: Uuid::new_v4(),
        }
    }

    /// Switch to a document, starting a fresh dialogue
    pub fn select(&mut self, document: DocumentRef) {
        self.document = Some(document);
        self.turns.clear();
        self.primed = false;
        self.selection = Uuid::new_v4();
    }
}

/// One user's session
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub state: FlowState,
    pub data: FlowData,
}

impl Session {
    pub fn new(state: FlowState, data: FlowData) -> Self {
        Self { state, data }
    }

    pub fn upload(&self) -> Option<&UploadDraft> {
        match &self.data {
            FlowData::Upload(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn question(&self) -> Option<&QaSession> {
        match &self.data {
            FlowData::Question(qa) => Some(qa),
            _ => None,
        }
    }

    pub fn browse(&self) -> Option<&BrowseData> {
        match &self.data {
            FlowData::Browse(browse) => Some(browse),
            _ => None,
        }
    }

    /// A file written to disk by this session and not yet committed
    pub fn staged_file(&self) -> Option<&PathBuf> {
        self.upload().and_then(|d| d.file_path.as_ref())
    }
}
