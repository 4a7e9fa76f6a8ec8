//! Operator commands.
//!
//! Each command is parsed here and forwarded to the engine as a request;
//! the reply describes what happened.

pub mod moderation;
pub mod settings;
pub mod start;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use teloxide::utils::command::BotCommands;
use tracing::error;

use warden::EngineError;

use crate::bot::dispatcher::{AppState, ThrottledBot};

/// All bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "Запустить бота")]
    Start,

    #[command(description = "Список команд")]
    Help,

    #[command(description = "Текущие настройки чата")]
    Settings,

    // Moderation
    #[command(description = "Предупредить пользователя (ответом)")]
    Warn(String),

    #[command(description = "Снять предупреждения (ответом)")]
    Unwarn(String),

    // Toggles
    #[command(description = "Приветствие on|off")]
    Welcome(String),

    #[command(description = "Прощание on|off")]
    Goodbye(String),

    #[command(description = "Анти-спам on|off")]
    Antispam(String),

    #[command(description = "Удалять ссылки on|off")]
    Antilinks(String),

    #[command(description = "Удалять пересылки on|off")]
    Antiforward(String),

    // Values
    #[command(description = "Текст приветствия")]
    Setwelcome(String),

    #[command(description = "Текст прощания")]
    Setgoodbye(String),

    #[command(description = "Лимит сообщений в минуту")]
    Setflood(String),

    #[command(description = "Лимит предупреждений")]
    Setwarnlimit(String),

    // Filters
    #[command(description = "Добавить запрещённое слово")]
    Addword(String),

    #[command(description = "Удалить запрещённое слово")]
    Delword(String),

    #[command(description = "Добавить автоответ: триггер | ответ")]
    Addresponse(String),

    #[command(description = "Удалить автоответ")]
    Delresponse(String),
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(start::start_command))
        .branch(case![Command::Help].endpoint(start::help_command))
        .branch(case![Command::Settings].endpoint(settings::settings_command))
        .branch(case![Command::Warn(args)].endpoint(moderation::warn_command))
        .branch(case![Command::Unwarn(args)].endpoint(moderation::unwarn_command))
        .branch(
            dptree::filter(|cmd: Command| settings::policy_change(&cmd).is_some())
                .endpoint(settings::config_command),
        )
}

/// Reply to the command message.
pub(crate) async fn reply(bot: &ThrottledBot, msg: &Message, text: String) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Group-only commands answer with a hint elsewhere. Returns true when the
/// command may proceed.
pub(crate) async fn require_group(bot: &ThrottledBot, msg: &Message, state: &AppState) -> anyhow::Result<bool> {
    if msg.chat.is_group() || msg.chat.is_supergroup() {
        return Ok(true);
    }
    reply(bot, msg, state.text("common.group_only")).await?;
    Ok(false)
}

/// User-facing text for a failed request.
pub(crate) fn error_text(state: &AppState, err: &EngineError) -> String {
    match err {
        EngineError::Unauthorized => state.text("common.admin_only"),
        EngineError::Transport(_) => state.text("common.role_failed"),
        EngineError::Config(e) => state.text("settings.invalid").replace("{error}", &e.to_string()),
        EngineError::Store(e) => {
            error!("Store failure while handling a command: {}", e);
            state.text("common.failed")
        }
    }
}
