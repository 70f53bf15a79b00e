// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Storage for uploaded document bytes

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::Result;

/// Flat directory of uploaded PDFs, each under a generated unique name
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if needed
    pub async fn ensure(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Persist uploaded bytes as `<uuid-hex>.pdf` and return the path.
    pub async fn stage(&self, bytes: &[u8]) -> Result<PathBuf> {
        self.ensure().await?;
        let path = self
            .root
            .join(format!("{}.pdf", Uuid::new_v4().simple()));
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "Staged upload");
        Ok(path)
    }

    /// Delete a staged file. A file that is already gone is not an error.
    pub async fn discard(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }
}
