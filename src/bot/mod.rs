// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Bot assembly and the update loop

pub mod dispatcher;

pub use dispatcher::Dispatcher;

use std::sync::Arc;

use crate::commands::{AdminState, CommandHandler};
use crate::config::Settings;
use crate::error::Result;
use crate::flow::{FlowDeps, FlowEngine};
use crate::llm::provider::LlmProvider;
use crate::pdf::TextExtractor;
use crate::session::SessionStore;
use crate::store::{DocumentStore, FileStore, UserRegistry};
use crate::transport::ChatTransport;

/// Everything the bot talks to
pub struct Services {
    pub transport: Arc<dyn ChatTransport>,
    pub store: Arc<dyn DocumentStore>,
    pub users: Arc<dyn UserRegistry>,
    pub files: FileStore,
    pub llm: Arc<dyn LlmProvider>,
    pub extractor: Arc<dyn TextExtractor>,
}

/// Wire services into a dispatcher, seeding departments on first run
pub async fn build(services: Services, settings: &Settings) -> Result<Dispatcher> {
    let admin = Arc::new(AdminState::new(settings.get_admin_id()));
    if admin.admin_id().is_none() {
        tracing::warn!("No operator id configured; operator features are disabled");
    }

    services.files.ensure().await?;
    let seeded = services
        .store
        .seed_default_departments(&settings.storage.default_departments)
        .await?;
    if seeded > 0 {
        tracing::info!(count = seeded, "Seeded default departments");
    }

    let engine = FlowEngine::new(
        FlowDeps {
            sessions: Arc::new(SessionStore::new()),
            store: services.store,
            files: services.files,
            transport: Arc::clone(&services.transport),
            llm: services.llm,
            extractor: services.extractor,
            admin: Arc::clone(&admin),
        },
        settings,
    );
    let commands = CommandHandler::new(
        Arc::clone(&services.transport),
        Arc::clone(&services.users),
        Arc::clone(&admin),
        settings,
    );

    Ok(Dispatcher::new(
        services.transport,
        services.users,
        admin,
        commands,
        engine,
    ))
}
