// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Subcommand implementations

use std::fmt::Write as _;
use std::sync::Arc;

use crate::bot::{self, Services};
use crate::config::Settings;
use crate::error::{BotError, Result};
use crate::llm::message::Message;
use crate::llm::provider::{CompletionRequest, LlmProvider};
use crate::llm::providers::DeepSeekProvider;
use crate::pdf::PdfTextExtractor;
use crate::store::{DbReport, FileStore, MigrationReport, SqliteDocumentStore};
use crate::transport::TelegramTransport;

const PING_MAX_TOKENS: u32 = 50;

fn llm_provider(settings: &Settings) -> Result<DeepSeekProvider> {
    let api_key = settings.get_llm_api_key().ok_or_else(|| {
        BotError::Config(format!(
            "DeepSeek API key missing (set {})",
            settings.llm.api_key_env
        ))
    })?;
    DeepSeekProvider::from_config(api_key, &settings.llm)
}

/// Run the bot until Ctrl-C
pub async fn run_bot(settings: &Settings) -> Result<()> {
    settings.validate()?;
    settings.ensure_directories()?;

    let token = settings
        .get_telegram_token()
        .ok_or_else(|| BotError::Config("bot token missing".to_string()))?;
    let transport = Arc::new(TelegramTransport::new(token, &settings.telegram)?);

    let database = settings.database_path();
    let store = Arc::new(SqliteDocumentStore::open(&database)?);
    tracing::info!(path = %database.display(), "Opened document store");

    let services = Services {
        transport,
        store: store.clone(),
        users: store,
        files: FileStore::new(settings.files_dir()),
        llm: Arc::new(llm_provider(settings)?),
        extractor: Arc::new(PdfTextExtractor::new()),
    };
    let dispatcher = Arc::new(bot::build(services, settings).await?);

    println!("✅ Бот запущен! Ctrl+C для остановки.");
    dispatcher.run().await
}

/// Upgrade the schema and seed departments
pub fn run_migrate(settings: &Settings) -> Result<()> {
    settings.ensure_directories()?;
    println!("Миграция базы данных...");

    let store = SqliteDocumentStore::open(settings.database_path())?;
    let report = store.migrate(&settings.storage.default_departments)?;
    print!("{}", format_migration_report(&report));
    Ok(())
}

pub fn format_migration_report(report: &MigrationReport) -> String {
    let mut out = String::new();
    if report.added_department_column {
        let _ = writeln!(out, "✅ Добавлено поле department_id в таблицу contests");
    }
    if report.seeded_departments > 0 {
        let _ = writeln!(out, "✅ Добавлено отделов: {}", report.seeded_departments);
    }
    if report.reassigned_documents > 0 {
        let _ = writeln!(
            out,
            "⚠️  Конкурсов без отдела привязано к отделу по умолчанию: {}",
            report.reassigned_documents
        );
    }
    let _ = writeln!(out, "✅ Миграция завершена успешно!");
    out
}

/// Print the documents table layout and check every stored file
pub fn run_check_db(settings: &Settings) -> Result<()> {
    let path = settings.database_path();
    if !path.exists() {
        println!("❌ База данных не найдена: {}", path.display());
        return Ok(());
    }

    let store = SqliteDocumentStore::open(&path)?;
    let report = store.inspect()?;
    print!("{}", format_db_report(&report));
    Ok(())
}

pub fn format_db_report(report: &DbReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Структура таблицы contests:");
    for column in &report.columns {
        let _ = writeln!(
            out,
            "  {} - {} (id: {})",
            column.name, column.declared_type, column.position
        );
    }

    let _ = writeln!(out, "\nВсего записей: {}", report.documents.len());
    for document in &report.documents {
        let _ = writeln!(out, "\nКонкурс ID {}:", document.id);
        let _ = writeln!(out, "  Название: {}", document.title);
        let _ = writeln!(out, "  Имя файла: {}", document.file_name);
        let _ = writeln!(out, "  Путь: {}", document.file_path.display());
        match document.size {
            Some(size) => {
                let _ = writeln!(out, "  Файл существует: ✅");
                let _ = writeln!(out, "  Размер: {} байт", size);
            }
            None => {
                let _ = writeln!(out, "  Файл существует: ❌");
            }
        }
    }

    let missing = report.missing_files().count();
    if missing > 0 {
        let _ = writeln!(out, "\n⚠️  Файлов не найдено: {}", missing);
    }
    out
}

/// List models and send one test completion
pub async fn run_ping_ai(settings: &Settings) -> Result<()> {
    let provider = llm_provider(settings)?;
    ping(&provider, &settings.llm.model).await
}

pub async fn ping(provider: &dyn LlmProvider, model: &str) -> Result<()> {
    println!("Проверяем сервер {}...", provider.name());
    match provider.list_models().await {
        Ok(models) => {
            println!("✅ Сервер доступен. Доступные модели:");
            for model in models {
                println!(" - {}", model);
            }
        }
        Err(e) => println!("❌ Сервер недоступен: {}", e),
    }

    println!("\nПроверяем работу AI модели...");
    let request = CompletionRequest::new(
        model,
        vec![
            Message::system("You are a helpful assistant."),
            Message::user("Ответь одним словом: работаешь?"),
        ],
    )
    .with_max_tokens(PING_MAX_TOKENS);

    match provider.complete(request).await {
        Ok(response) => {
            println!("✅ AI ответил успешно:");
            println!("{}", response.text);
            Ok(())
        }
        Err(e) => {
            println!("❌ AI не ответил: {}", e);
            Err(e)
        }
    }
}
