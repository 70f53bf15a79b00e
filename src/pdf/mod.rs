// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! PDF text extraction
//!
//! Extraction is best effort: an unreadable file yields an empty string and a
//! warning in the log, never an error.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Pulls plain text out of a stored document
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// At most `max_chars` characters of text, or "" on any failure.
    async fn extract_text(&self, path: &Path, max_chars: usize) -> String;
}

/// Extractor backed by `lopdf`
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_text(&self, path: &Path, max_chars: usize) -> String {
        let path: PathBuf = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || read_pages(&path)).await;

        match result {
            Ok(Ok(text)) => truncate_chars(&text, max_chars),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to read PDF text");
                String::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "PDF extraction task failed");
                String::new()
            }
        }
    }
}

fn read_pages(path: &Path) -> std::result::Result<String, lopdf::Error> {
    let document = lopdf::Document::load(path)?;
    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Ok(String::new());
    }
    document.extract_text(&pages)
}

/// First `max_chars` characters of `text`, split on char boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
