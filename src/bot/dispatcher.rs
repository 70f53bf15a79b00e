// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Update loop and routing
//!
//! Each inbound event runs in its own task so a slow model call for one user
//! never holds up anyone else. Events from the same user are not serialized.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::commands::{AdminState, Command, CommandHandler};
use crate::error::Result;
use crate::flow::FlowEngine;
use crate::store::UserRegistry;
use crate::transport::{ChatTransport, EventKind, InboundEvent};

const BLOCKED_REPLY: &str = "🚫 Вы в черном списке.";
const FAILURE_REPLY: &str = "⚠️ Что-то пошло не так. Попробуйте ещё раз.";
const RECEIVE_BACKOFF: Duration = Duration::from_secs(2);

pub struct Dispatcher {
    transport: Arc<dyn ChatTransport>,
    users: Arc<dyn UserRegistry>,
    admin: Arc<AdminState>,
    commands: CommandHandler,
    engine: FlowEngine,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        users: Arc<dyn UserRegistry>,
        admin: Arc<AdminState>,
        commands: CommandHandler,
        engine: FlowEngine,
    ) -> Self {
        Self {
            transport,
            users,
            admin,
            commands,
            engine,
        }
    }

    pub fn engine(&self) -> &FlowEngine {
        &self.engine
    }

    /// Poll until Ctrl-C
    pub async fn run(self: Arc<Self>) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received Ctrl+C, stopping");
        })
        .await
    }

    /// Poll until `shutdown` resolves. In-flight event tasks are left to finish.
    pub async fn run_until<S>(self: Arc<Self>, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!("Dispatcher started");

        loop {
            let events = tokio::select! {
                () = &mut shutdown => break,
                received = self.transport.receive() => received,
            };

            let events = match events {
                Ok(events) => events,
                Err(e) => {
                    tracing::warn!(error = %e, "Receiving updates failed");
                    tokio::select! {
                        () = &mut shutdown => break,
                        () = tokio::time::sleep(RECEIVE_BACKOFF) => continue,
                    }
                }
            };

            for event in events {
                let dispatcher = Arc::clone(&self);
                tokio::spawn(async move {
                    dispatcher.dispatch(event).await;
                });
            }
        }

        tracing::info!("Dispatcher stopped");
        Ok(())
    }

    /// Route one event, reporting any failure to the user
    pub async fn dispatch(&self, event: InboundEvent) {
        let user = event.user_id();
        if let Err(e) = self.route(&event).await {
            tracing::error!(user, error = %e, "Handler failed");
            if let Err(e) = self
                .transport
                .send_text(event.chat_id, FAILURE_REPLY, None)
                .await
            {
                tracing::warn!(user, error = %e, "Could not report failure");
            }
        }
    }

    async fn route(&self, event: &InboundEvent) -> Result<()> {
        if self.admin.is_blocked(&event.sender) {
            tracing::info!(user = event.user_id(), "Refusing blocked user");
            return self.refuse(event).await;
        }

        if let Err(e) = self
            .users
            .register_user(event.user_id(), event.sender.username.as_deref())
            .await
        {
            tracing::warn!(user = event.user_id(), error = %e, "Could not register user");
        }

        if let Some(command) = event.text().and_then(Command::parse) {
            return self.commands.execute(event, command).await;
        }
        self.engine.handle(event).await
    }

    async fn refuse(&self, event: &InboundEvent) -> Result<()> {
        match &event.kind {
            EventKind::Selection { query_id, .. } => {
                self.transport
                    .answer_selection(query_id, Some(BLOCKED_REPLY))
                    .await
            }
            _ => {
                self.transport
                    .send_text(event.chat_id, BLOCKED_REPLY, None)
                    .await?;
                Ok(())
            }
        }
    }
}
