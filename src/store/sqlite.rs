// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! SQLite-backed document store
//!
//! One connection guarded by a mutex. Every method finishes its SQL work
//! before awaiting anything, so the guard never crosses an await point.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{
    AddDepartmentOutcome, Department, DepartmentId, Document, DocumentId, DocumentStore,
    NewDocument, UserId, UserRegistry, FALLBACK_DEPARTMENT_ID,
};
use crate::error::{BotError, Result};

const DOCUMENT_COLUMNS: &str = "id, title, contest_date, COALESCE(file_name, ''), \
     COALESCE(file_path, ''), COALESCE(department_id, 1), COALESCE(created_date, '')";

/// What a migration run changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// The `department_id` column had to be added
    pub added_department_column: bool,
    /// Documents reassigned to the fallback department
    pub reassigned_documents: usize,
    /// Default departments inserted
    pub seeded_departments: usize,
}

/// Column of the documents table as reported by SQLite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub position: i64,
    pub name: String,
    pub declared_type: String,
}

/// One stored document and the state of its file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFileStatus {
    pub id: DocumentId,
    pub title: String,
    pub file_name: String,
    pub file_path: PathBuf,
    /// File size in bytes, `None` when the file is missing
    pub size: Option<u64>,
}

/// Structure and content summary used by `check-db`
#[derive(Debug, Clone, Default)]
pub struct DbReport {
    pub columns: Vec<ColumnInfo>,
    pub documents: Vec<DocumentFileStatus>,
}

impl DbReport {
    /// Documents whose file is gone
    pub fn missing_files(&self) -> impl Iterator<Item = &DocumentFileStatus> {
        self.documents.iter().filter(|d| d.size.is_none())
    }
}

/// Document store over a single SQLite database
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
    upgraded_on_open: AtomicBool,
}

impl SqliteDocumentStore {
    /// Open or create the database at `path`, bringing the schema up to date
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| {
            BotError::Store(format!(
                "Failed to open database {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_connection(conn)
    }

    /// In-memory database, mainly for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            upgraded_on_open: AtomicBool::new(false),
        };
        store.init_schema()?;
        if store.upgrade_documents_table()? {
            store.upgraded_on_open.store(true, Ordering::SeqCst);
        }
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| BotError::Store("database lock poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS departments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL
            );
            CREATE TABLE IF NOT EXISTS contests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                contest_date TEXT NOT NULL,
                file_name TEXT,
                file_path TEXT,
                department_id INTEGER,
                created_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (department_id) REFERENCES departments(id)
            );
            CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                username TEXT,
                first_seen TEXT NOT NULL
            );",
        )
        .map_err(|e| BotError::Store(format!("Failed to create schema: {}", e)))?;
        Ok(())
    }

    /// Add `department_id` to a legacy documents table. Returns true if added.
    fn upgrade_documents_table(&self) -> Result<bool> {
        let conn = self.conn()?;
        let has_column = table_columns(&conn, "contests")?
            .iter()
            .any(|c| c.name == "department_id");
        if has_column {
            return Ok(false);
        }

        conn.execute("ALTER TABLE contests ADD COLUMN department_id INTEGER", [])
            .map_err(|e| BotError::Store(format!("Failed to add department_id: {}", e)))?;
        tracing::info!("Added department_id column to contests table");
        Ok(true)
    }

    /// Bring a database created by older releases up to date.
    ///
    /// Idempotent: running it twice changes nothing the second time.
    pub fn migrate(&self, default_departments: &[String]) -> Result<MigrationReport> {
        // Opening the store already upgrades the table; report that once.
        let added_department_column = self.upgraded_on_open.swap(false, Ordering::SeqCst)
            | self.upgrade_documents_table()?;
        let seeded_departments = self.seed_names(default_departments)?;

        // Foreign keys are enforced, so the fallback must exist before reassigning.
        if self.get_department_sync(FALLBACK_DEPARTMENT_ID)?.is_none() {
            tracing::warn!(
                department = FALLBACK_DEPARTMENT_ID,
                "Fallback department is missing, leaving documents unassigned"
            );
            return Ok(MigrationReport {
                added_department_column,
                reassigned_documents: 0,
                seeded_departments,
            });
        }

        let reassigned_documents = self.conn()?.execute(
            "UPDATE contests SET department_id = ?1 WHERE department_id IS NULL",
            params![FALLBACK_DEPARTMENT_ID],
        )?;

        Ok(MigrationReport {
            added_department_column,
            reassigned_documents,
            seeded_departments,
        })
    }

    /// Describe the documents table and check every stored file
    pub fn inspect(&self) -> Result<DbReport> {
        let conn = self.conn()?;
        let columns = table_columns(&conn, "contests")?;

        let mut stmt = conn.prepare(
            "SELECT id, title, COALESCE(file_name, ''), COALESCE(file_path, '') \
             FROM contests ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, title, file_name, file_path) = row?;
            let file_path = PathBuf::from(file_path);
            let size = std::fs::metadata(&file_path)
                .ok()
                .filter(|m| m.is_file())
                .map(|m| m.len());
            documents.push(DocumentFileStatus {
                id,
                title,
                file_name,
                file_path,
                size,
            });
        }

        Ok(DbReport { columns, documents })
    }

    fn get_department_sync(&self, id: DepartmentId) -> Result<Option<Department>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, name FROM departments WHERE id = ?1",
                params![id],
                row_to_department,
            )
            .optional()?)
    }

    fn seed_names(&self, names: &[String]) -> Result<usize> {
        let conn = self.conn()?;
        let mut added = 0;
        for name in names {
            added += conn.execute(
                "INSERT OR IGNORE INTO departments (name) VALUES (?1)",
                params![name],
            )?;
        }
        Ok(added)
    }
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let rows = stmt.query_map([], |row| {
        Ok(ColumnInfo {
            position: row.get(0)?,
            name: row.get(1)?,
            declared_type: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

fn row_to_department(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        title: row.get(1)?,
        date: row.get(2)?,
        file_name: row.get(3)?,
        file_path: PathBuf::from(row.get::<_, String>(4)?),
        department_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn list_departments(&self) -> Result<Vec<Department>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM departments ORDER BY name")?;
        let rows = stmt.query_map([], row_to_department)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    async fn get_department(&self, id: DepartmentId) -> Result<Option<Department>> {
        self.get_department_sync(id)
    }

    async fn add_department(&self, name: &str) -> Result<AddDepartmentOutcome> {
        let name = name.trim();
        let conn = self.conn()?;

        // SQLite's lower() only folds ASCII, so compare in Rust.
        let wanted = name.to_lowercase();
        let mut stmt = conn.prepare("SELECT name FROM departments")?;
        let existing = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for existing in existing {
            if existing?.to_lowercase() == wanted {
                return Ok(AddDepartmentOutcome::Duplicate);
            }
        }

        match conn.execute("INSERT INTO departments (name) VALUES (?1)", params![name]) {
            Ok(_) => Ok(AddDepartmentOutcome::Added(Department {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
            })),
            Err(e) if is_unique_violation(&e) => Ok(AddDepartmentOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_documents(&self, department_id: DepartmentId) -> Result<Vec<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM contests WHERE COALESCE(department_id, 1) = ?1 \
             ORDER BY contest_date DESC",
            DOCUMENT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![department_id], row_to_document)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<Document>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM contests WHERE id = ?1", DOCUMENT_COLUMNS),
                params![id],
                row_to_document,
            )
            .optional()?)
    }

    async fn add_document(&self, document: NewDocument) -> Result<Document> {
        let created_at = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let file_path = document.file_path.to_string_lossy().to_string();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO contests (title, contest_date, file_name, file_path, department_id, created_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &document.title,
                &document.date,
                &document.file_name,
                file_path,
                document.department_id,
                &created_at
            ],
        )?;

        Ok(Document {
            id: conn.last_insert_rowid(),
            title: document.title,
            date: document.date,
            file_name: document.file_name,
            file_path: document.file_path,
            department_id: document.department_id,
            created_at,
        })
    }

    async fn delete_document(&self, id: DocumentId) -> Result<bool> {
        let file_path = {
            let conn = self.conn()?;
            let path: Option<String> = conn
                .query_row(
                    "SELECT COALESCE(file_path, '') FROM contests WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(path) = path else {
                return Ok(false);
            };
            conn.execute("DELETE FROM contests WHERE id = ?1", params![id])?;
            path
        };

        if !file_path.is_empty() {
            if let Err(e) = tokio::fs::remove_file(&file_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %file_path, error = %e, "Failed to remove document file");
                }
            }
        }
        Ok(true)
    }

    async fn seed_default_departments(&self, names: &[String]) -> Result<usize> {
        self.seed_names(names)
    }
}

#[async_trait]
impl UserRegistry for SqliteDocumentStore {
    async fn register_user(&self, user_id: UserId, username: Option<&str>) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO users (user_id, username, first_seen) VALUES (?1, ?2, ?3)",
            params![user_id, username, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    async fn user_count(&self) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}
