// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use tempfile::TempDir;

use contest_assistant::config::Settings;
use contest_assistant::store::{
    AddDepartmentOutcome, DocumentStore, FileStore, NewDocument, SqliteDocumentStore,
    UserRegistry,
};

fn defaults() -> Vec<String> {
    Settings::default().storage.default_departments
}

fn document(department_id: i64, title: &str, date: &str, files: &FileStore) -> NewDocument {
    NewDocument {
        title: title.to_string(),
        date: date.to_string(),
        file_name: format!("{}.pdf", title),
        file_path: files.root().join(format!("{}.pdf", title)),
        department_id,
    }
}

#[tokio::test]
async fn test_documents_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("contests.db");
    let files = FileStore::new(temp_dir.path().join("files"));

    let id = {
        let store = SqliteDocumentStore::open(&db_path).unwrap();
        store.seed_default_departments(&defaults()).await.unwrap();
        store
            .add_document(document(6, "Robotics", "2024-05-01", &files))
            .await
            .unwrap()
            .id
    };

    let store = SqliteDocumentStore::open(&db_path).unwrap();
    let doc = store.get_document(id).await.unwrap().unwrap();
    assert_eq!(doc.title, "Robotics");
    assert_eq!(doc.department_id, 6);
    assert_eq!(doc.file_path, files.root().join("Robotics.pdf"));
    assert!(!doc.created_at.is_empty());

    // Seeding again adds nothing
    assert_eq!(store.seed_default_departments(&defaults()).await.unwrap(), 0);
    assert_eq!(store.list_departments().await.unwrap().len(), 6);
}

#[tokio::test]
async fn test_documents_listed_per_department_newest_date_first() {
    let temp_dir = TempDir::new().unwrap();
    let files = FileStore::new(temp_dir.path());
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    store.seed_default_departments(&defaults()).await.unwrap();

    store
        .add_document(document(6, "Old", "2022-01-10", &files))
        .await
        .unwrap();
    store
        .add_document(document(6, "New", "2024-03-01", &files))
        .await
        .unwrap();
    store
        .add_document(document(3, "Checkers", "2023-06-01", &files))
        .await
        .unwrap();

    let titles: Vec<String> = store
        .list_documents(6)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.title)
        .collect();
    assert_eq!(titles, vec!["New", "Old"]);
    assert_eq!(store.list_documents(3).await.unwrap().len(), 1);
    assert!(store.list_documents(4).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_department_duplicates_ignore_case() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    store.seed_default_departments(&defaults()).await.unwrap();

    assert_eq!(
        store.add_department("бпла").await.unwrap(),
        AddDepartmentOutcome::Duplicate
    );
    assert_eq!(
        store.add_department("  РОБОТОТЕХНИКА ").await.unwrap(),
        AddDepartmentOutcome::Duplicate
    );

    match store.add_department(" Шахматы ").await.unwrap() {
        AddDepartmentOutcome::Added(department) => {
            assert_eq!(department.name, "Шахматы");
            let stored = store.get_department(department.id).await.unwrap().unwrap();
            assert_eq!(stored, department);
        }
        AddDepartmentOutcome::Duplicate => panic!("new department reported as duplicate"),
    }
}

#[tokio::test]
async fn test_staged_file_removed_with_document() {
    let temp_dir = TempDir::new().unwrap();
    let files = FileStore::new(temp_dir.path().join("files"));
    files.ensure().await.unwrap();
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    store.seed_default_departments(&defaults()).await.unwrap();

    let path = files.stage(b"%PDF-1.4 rules").await.unwrap();
    assert!(files.exists(&path).await);
    let doc = store
        .add_document(NewDocument {
            file_path: path.clone(),
            ..document(1, "Fire safety", "2024", &files)
        })
        .await
        .unwrap();

    assert!(store.delete_document(doc.id).await.unwrap());
    assert!(!files.exists(&path).await);
}

#[tokio::test]
async fn test_check_report_after_file_loss() {
    let temp_dir = TempDir::new().unwrap();
    let files = FileStore::new(temp_dir.path());
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    store.seed_default_departments(&defaults()).await.unwrap();

    let kept = files.stage(b"%PDF-1.4 kept").await.unwrap();
    let lost = files.stage(b"%PDF-1.4 lost").await.unwrap();
    for (title, path) in [("Kept", &kept), ("Lost", &lost)] {
        store
            .add_document(NewDocument {
                file_path: path.clone(),
                ..document(1, title, "2024", &files)
            })
            .await
            .unwrap();
    }
    files.discard(&lost).await.unwrap();

    let report = store.inspect().unwrap();
    assert_eq!(report.documents.len(), 2);
    let missing: Vec<&str> = report.missing_files().map(|d| d.title.as_str()).collect();
    assert_eq!(missing, vec!["Lost"]);
    assert_eq!(report.documents[0].size, Some(13));
}

#[tokio::test]
async fn test_registered_users_are_counted_once() {
    let store = SqliteDocumentStore::open_in_memory().unwrap();
    assert_eq!(store.user_count().await.unwrap(), 0);

    for id in [1, 2, 2, 3, 1] {
        store.register_user(id, None).await.unwrap();
    }
    assert_eq!(store.user_count().await.unwrap(), 3);
}
