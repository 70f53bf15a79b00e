// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Slash commands
//!
//! Commands run regardless of the sender's flow state and never change it.
//! `/cancel` is not a command here; the flow engine owns it.

use dashmap::DashMap;
use std::sync::Arc;

use crate::config::Settings;
use crate::error::Result;
use crate::flow::keyboards;
use crate::store::{UserId, UserRegistry};
use crate::transport::{ChatTransport, InboundEvent};

pub mod admin;

pub use admin::{AdminState, BlockTarget};

const NO_RIGHTS: &str = "❌ У вас нет прав админа";

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Menu,
    MyId,
    Author,
    Help,
    /// Text after `/echo`
    Echo(String),
    AdminMode,
    /// Raw argument after `/troll`, if any
    Troll(Option<String>),
    Stats,
}

impl Command {
    /// Parse `/name[@bot] [args]`. Unknown names yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;
        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_lowercase();

        let command = match name.as_str() {
            "start" => Command::Start,
            "menu" => Command::Menu,
            "myid" => Command::MyId,
            "author" => Command::Author,
            "help" | "commands" => Command::Help,
            "echo" => Command::Echo(args.to_string()),
            "admin_mode" => Command::AdminMode,
            "troll" => Command::Troll(args.split_whitespace().next().map(str::to_string)),
            "stats" => Command::Stats,
            _ => return None,
        };
        Some(command)
    }

    pub fn operator_only(&self) -> bool {
        matches!(
            self,
            Command::AdminMode | Command::Troll(_) | Command::Stats
        )
    }
}

/// Remembers each user's last `/echo` text
#[derive(Debug, Default)]
pub struct EchoTracker {
    last: DashMap<UserId, String>,
}

impl EchoTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` as the user's latest, returning whether it repeats the previous one
    pub fn record(&self, user: UserId, text: &str) -> bool {
        match self.last.insert(user, text.to_string()) {
            Some(previous) => previous == text,
            None => false,
        }
    }
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Latin and Cyrillic letters only
pub fn count_letters(text: &str) -> usize {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic() || ('А'..='я').contains(c) || *c == 'Ё' || *c == 'ё')
        .count()
}

pub struct CommandHandler {
    transport: Arc<dyn ChatTransport>,
    users: Arc<dyn UserRegistry>,
    admin: Arc<AdminState>,
    echo: EchoTracker,
    author: String,
}

impl CommandHandler {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        users: Arc<dyn UserRegistry>,
        admin: Arc<AdminState>,
        settings: &Settings,
    ) -> Self {
        Self {
            transport,
            users,
            admin,
            echo: EchoTracker::new(),
            author: settings.about.author.clone(),
        }
    }

    pub async fn execute(&self, event: &InboundEvent, command: Command) -> Result<()> {
        let user = event.user_id();
        tracing::debug!(user, ?command, "Command");

        if command.operator_only() && !self.admin.is_admin(user) {
            return self.say(event, NO_RIGHTS).await;
        }

        match command {
            Command::Start => {
                self.say_with_menu(
                    event,
                    "👋 Добро пожаловать в бот для работы с конкурсами!\n\
                     Используйте кнопки ниже для навигации.",
                )
                .await
            }
            Command::Menu => self.say_with_menu(event, "📋 Главное меню:").await,
            Command::MyId => self.say(event, &self.my_id_text(user)).await,
            Command::Author => {
                self.say(event, &format!("👨‍💻 Автор бота: {}", self.author))
                    .await
            }
            Command::Help => self.say(event, &self.help_text(user)).await,
            Command::Echo(text) => self.echo(event, &text).await,
            Command::AdminMode => {
                let enabled = self.admin.toggle_rude_mode();
                tracing::info!(
                    target: "contest_assistant::audit",
                    user,
                    enabled,
                    "Rude mode toggled"
                );
                let status = if enabled { "включён 🔥" } else { "выключен ✅" };
                self.say(event, &format!("Грубый режим ИИ {}", status)).await
            }
            Command::Troll(arg) => self.troll(event, arg.as_deref()).await,
            Command::Stats => self.say(event, &self.stats_text().await).await,
        }
    }

    async fn echo(&self, event: &InboundEvent, text: &str) -> Result<()> {
        if text.is_empty() {
            return self.say(event, "Пустое сообщение не анализирую.").await;
        }

        let repeated = self.echo.record(event.user_id(), text);
        let mut reply = format!(
            "В вашем сообщении: {} слов, {} букв.",
            count_words(text),
            count_letters(text)
        );
        if repeated {
            reply.push_str(" Вы уже отправляли это сообщение ранее.");
        }
        self.say(event, &reply).await
    }

    async fn troll(&self, event: &InboundEvent, arg: Option<&str>) -> Result<()> {
        let Some(arg) = arg else {
            return self
                .say(event, "❌ Укажи пользователя: /troll @username или /troll user_id")
                .await;
        };
        let Some(target) = BlockTarget::parse(arg) else {
            return self
                .say(
                    event,
                    "❌ Неверный формат. Используйте: /troll @username или /troll 123456789",
                )
                .await;
        };

        let label = target.to_string();
        if !self.admin.block(target) {
            return self
                .say(event, &format!("ℹ️ Пользователь {} уже в черном списке", label))
                .await;
        }
        tracing::info!(
            target: "contest_assistant::audit",
            user = event.user_id(),
            blocked = %label,
            "User blocked"
        );
        self.say(
            event,
            &format!("✅ Пользователь {} добавлен в черный список 😏", label),
        )
        .await
    }

    fn my_id_text(&self, user: UserId) -> String {
        if self.admin.is_admin(user) {
            format!(
                "👑 Твой ID: {}\n\n\
                 Ты админ! Доступные команды:\n\
                 /admin_mode - грубый режим ИИ\n\
                 /troll @user - заблокировать\n\
                 /stats - статистика\n\
                 /author - автор бота",
                user
            )
        } else {
            format!("🆔 Твой ID: {}", user)
        }
    }

    fn help_text(&self, user: UserId) -> String {
        let mut text = String::from(
            "📋 Доступные команды:\n\n\
             Для всех:\n\
             /start - начать работу\n\
             /menu - главное меню\n\
             /myid - узнать свой ID\n\
             /author - автор бота\n\
             /help - эта справка\n\n\
             Кнопки меню:\n\
             ❓ Задать вопрос - AI-помощник\n\
             📂 Положения конкурсов - скачать PDF",
        );
        if self.admin.is_admin(user) {
            text.push_str(
                "\n\n👑 Админские команды:\n\
                 /admin_mode - грубый режим ИИ\n\
                 /troll @user - заблокировать\n\
                 /stats - статистика\n\n\
                 Админские кнопки:\n\
                 📄 Загрузить положение\n\
                 🗑 Удалить положение\n\
                 ➕ Добавить отдел",
            );
        }
        text
    }

    async fn stats_text(&self) -> String {
        let users = match self.users.user_count().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(error = %e, "Could not count users");
                0
            }
        };
        let admin_id = self
            .admin
            .admin_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "не задан".to_string());
        let rude = if self.admin.rude_mode() { "ВКЛ" } else { "ВЫКЛ" };

        format!(
            "📊 Статистика бота:\n\n\
             👑 Админ ID: {}\n\
             👥 Всего пользователей: {}\n\
             🚫 Заблокированных: {}\n\
             🤖 Грубый режим ИИ: {}\n\n\
             Доступные команды:\n\
             /myid - узнать свой ID\n\
             /admin_mode - грубый режим\n\
             /troll @user - заблокировать\n\
             /author - автор",
            admin_id,
            users,
            self.admin.blocked_count(),
            rude
        )
    }

    async fn say(&self, event: &InboundEvent, text: &str) -> Result<()> {
        self.transport.send_text(event.chat_id, text, None).await?;
        Ok(())
    }

    async fn say_with_menu(&self, event: &InboundEvent, text: &str) -> Result<()> {
        let markup = keyboards::main_keyboard(self.admin.is_admin(event.user_id()));
        self.transport
            .send_text(event.chat_id, text, Some(markup))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteDocumentStore;
    use crate::transport::mock::RecordingTransport;
    use crate::transport::{EventKind, Sender};

    const ADMIN: UserId = 42;

    fn event(user: UserId, text: &str) -> InboundEvent {
        InboundEvent {
            sender: Sender {
                id: user,
                username: Some("tester".to_string()),
            },
            chat_id: user,
            kind: EventKind::Text(text.to_string()),
        }
    }

    fn handler() -> (CommandHandler, Arc<RecordingTransport>, Arc<AdminState>) {
        let transport = Arc::new(RecordingTransport::new());
        let store = Arc::new(SqliteDocumentStore::open_in_memory().unwrap());
        let admin = Arc::new(AdminState::new(Some(ADMIN)));
        let handler = CommandHandler::new(
            transport.clone(),
            store,
            admin.clone(),
            &Settings::default(),
        );
        (handler, transport, admin)
    }

    async fn run(handler: &CommandHandler, user: UserId, text: &str) {
        let command = Command::parse(text).unwrap();
        handler.execute(&event(user, text), command).await.unwrap();
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/menu@contest_bot"), Some(Command::Menu));
        assert_eq!(Command::parse("/commands"), Some(Command::Help));
        assert_eq!(
            Command::parse("/echo  hello world "),
            Some(Command::Echo("hello world".to_string()))
        );
        assert_eq!(
            Command::parse("/troll @Someone extra"),
            Some(Command::Troll(Some("@Someone".to_string())))
        );
        assert_eq!(Command::parse("/troll"), Some(Command::Troll(None)));
        assert_eq!(Command::parse("/cancel"), None);
        assert_eq!(Command::parse("hello"), None);
    }

    #[test]
    fn test_counts() {
        assert_eq!(count_words("  one two\tthree "), 3);
        assert_eq!(count_letters("Привет, world! 123 Ёж"), 13);
    }

    #[test]
    fn test_echo_tracker_flags_repeats() {
        let tracker = EchoTracker::new();
        assert!(!tracker.record(1, "hi"));
        assert!(tracker.record(1, "hi"));
        assert!(!tracker.record(1, "bye"));
        assert!(!tracker.record(2, "bye"));
    }

    #[tokio::test]
    async fn test_echo_reports_counts_and_duplicates() {
        let (handler, transport, _) = handler();
        run(&handler, 7, "/echo привет мир").await;
        run(&handler, 7, "/echo привет мир").await;

        let texts = transport.sent_texts();
        assert_eq!(texts[0], "В вашем сообщении: 2 слов, 9 букв.");
        assert!(texts[1].ends_with("Вы уже отправляли это сообщение ранее."));
    }

    #[tokio::test]
    async fn test_operator_commands_refused_for_others() {
        let (handler, transport, admin) = handler();
        run(&handler, 7, "/admin_mode").await;
        run(&handler, 7, "/troll @bob").await;

        assert_eq!(transport.sent_texts(), vec![NO_RIGHTS, NO_RIGHTS]);
        assert!(!admin.rude_mode());
        assert_eq!(admin.blocked_count(), 0);
    }

    #[tokio::test]
    async fn test_admin_mode_toggles() {
        let (handler, transport, admin) = handler();
        run(&handler, ADMIN, "/admin_mode").await;
        assert!(admin.rude_mode());
        run(&handler, ADMIN, "/admin_mode").await;
        assert!(!admin.rude_mode());

        let texts = transport.sent_texts();
        assert_eq!(texts[0], "Грубый режим ИИ включён 🔥");
        assert_eq!(texts[1], "Грубый режим ИИ выключен ✅");
    }

    #[tokio::test]
    async fn test_troll_blocks_user() {
        let (handler, transport, admin) = handler();
        run(&handler, ADMIN, "/troll @Spammer").await;
        run(&handler, ADMIN, "/troll @spammer").await;
        run(&handler, ADMIN, "/troll abc").await;

        let texts = transport.sent_texts();
        assert_eq!(texts[0], "✅ Пользователь @spammer добавлен в черный список 😏");
        assert!(texts[1].contains("уже в черном списке"));
        assert!(texts[2].starts_with("❌ Неверный формат"));
        assert!(admin.is_blocked(&Sender {
            id: 5,
            username: Some("SPAMMER".to_string()),
        }));
    }

    #[tokio::test]
    async fn test_stats_and_myid() {
        let (handler, transport, _) = handler();
        run(&handler, ADMIN, "/stats").await;
        run(&handler, ADMIN, "/myid").await;
        run(&handler, 7, "/myid").await;

        let texts = transport.sent_texts();
        assert!(texts[0].contains("👑 Админ ID: 42"));
        assert!(texts[0].contains("👥 Всего пользователей: 0"));
        assert!(texts[0].contains("Грубый режим ИИ: ВЫКЛ"));
        assert!(texts[1].starts_with("👑 Твой ID: 42"));
        assert_eq!(texts[2], "🆔 Твой ID: 7");
    }

    #[tokio::test]
    async fn test_start_shows_menu_for_role() {
        let (handler, transport, _) = handler();
        run(&handler, 7, "/start").await;
        run(&handler, ADMIN, "/help").await;

        let outbound = transport.outbound();
        assert_eq!(outbound[0].markup(), Some(&keyboards::main_keyboard(false)));
        assert!(transport.sent_texts()[1].contains("👑 Админские команды"));
    }
}
