// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Document storage
//!
//! Departments and contest documents live in SQLite; the PDF bytes live in a
//! flat directory managed by [`FileStore`].

pub mod files;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

pub use files::FileStore;
pub use sqlite::{DbReport, MigrationReport, SqliteDocumentStore};

pub type DepartmentId = i64;
pub type DocumentId = i64;
pub type UserId = i64;

/// Department that documents without one are attributed to.
///
/// Foreign keys are enforced, so this department has to exist before
/// `migrate` reassigns anything to it. Seeding the defaults creates it.
pub const FALLBACK_DEPARTMENT_ID: DepartmentId = 1;

/// A named group of documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
}

/// A stored contest document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    /// Free-form date text as entered by the operator
    pub date: String,
    /// Original file name shown to users
    pub file_name: String,
    pub file_path: PathBuf,
    pub department_id: DepartmentId,
    pub created_at: String,
}

/// Fields for a document that has not been committed yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub title: String,
    pub date: String,
    pub file_name: String,
    pub file_path: PathBuf,
    pub department_id: DepartmentId,
}

/// Result of adding a department
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddDepartmentOutcome {
    Added(Department),
    /// A department with this name (ignoring case) already exists
    Duplicate,
}

/// Persistent store of departments and documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All departments, ordered by name
    async fn list_departments(&self) -> Result<Vec<Department>>;

    async fn get_department(&self, id: DepartmentId) -> Result<Option<Department>>;

    async fn add_department(&self, name: &str) -> Result<AddDepartmentOutcome>;

    /// Documents of one department, newest date first
    async fn list_documents(&self, department_id: DepartmentId) -> Result<Vec<Document>>;

    async fn get_document(&self, id: DocumentId) -> Result<Option<Document>>;

    async fn add_document(&self, document: NewDocument) -> Result<Document>;

    /// Remove the record and its file. Returns false if no such document.
    async fn delete_document(&self, id: DocumentId) -> Result<bool>;

    /// Insert any missing names; returns how many were added
    async fn seed_default_departments(&self, names: &[String]) -> Result<usize>;
}

/// Registry of users who have talked to the bot
#[async_trait]
pub trait UserRegistry: Send + Sync {
    async fn register_user(&self, user_id: UserId, username: Option<&str>) -> Result<()>;

    async fn user_count(&self) -> Result<u64>;
}
