// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Per-user conversation sessions

pub mod state;
pub mod store;

pub use state::{BrowseData, DocumentRef, FlowData, FlowState, QaSession, Session, UploadDraft};
pub use store::SessionStore;
