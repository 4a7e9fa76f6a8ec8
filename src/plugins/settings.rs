//! Chat settings commands.
//!
//! `/settings` shows the policy; every other command here turns into a
//! single `PolicyChange`.

use teloxide::prelude::*;
use tracing::debug;

use warden::database::models::{ChatId, Policy, PolicyChange, UserId};
use warden::EngineError;
use warden::events::ConfigRequest;

use super::{Command, error_text, reply, require_group};
use crate::bot::dispatcher::{AppState, ThrottledBot};

/// Expected argument shape of a settings command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Toggle(&'static str),
    Number(&'static str),
    Text(&'static str),
    Response,
}

impl Usage {
    fn text(self, state: &AppState) -> String {
        let (key, command) = match self {
            Usage::Toggle(command) => ("settings.usage_toggle", command),
            Usage::Number(command) => ("settings.usage_number", command),
            Usage::Text(command) => ("settings.usage_text", command),
            Usage::Response => return state.text("settings.usage_response"),
        };
        state.text(key).replace("{command}", command)
    }
}

/// The policy edit a command asks for.
///
/// `None` for commands that are not settings edits, `Some(Err(_))` when the
/// arguments do not fit.
pub fn policy_change(cmd: &Command) -> Option<Result<PolicyChange, Usage>> {
    let change = match cmd {
        Command::Welcome(arg) => toggle("welcome", arg).map(PolicyChange::SetWelcomeEnabled),
        Command::Goodbye(arg) => toggle("goodbye", arg).map(PolicyChange::SetGoodbyeEnabled),
        Command::Antispam(arg) => toggle("antispam", arg).map(PolicyChange::SetAntispamEnabled),
        Command::Antilinks(arg) => toggle("antilinks", arg).map(PolicyChange::SetDeleteLinks),
        Command::Antiforward(arg) => toggle("antiforward", arg).map(PolicyChange::SetDeleteForwards),
        Command::Setwelcome(arg) => text("setwelcome", arg).map(PolicyChange::SetWelcomeMessage),
        Command::Setgoodbye(arg) => text("setgoodbye", arg).map(PolicyChange::SetGoodbyeMessage),
        Command::Setflood(arg) => number("setflood", arg).map(PolicyChange::SetMaxMessagesPerMinute),
        Command::Setwarnlimit(arg) => number("setwarnlimit", arg).map(PolicyChange::SetWarnLimit),
        Command::Addword(arg) => text("addword", arg).map(PolicyChange::AddBannedTerm),
        Command::Delword(arg) => text("delword", arg).map(PolicyChange::RemoveBannedTerm),
        Command::Addresponse(arg) => auto_response(arg),
        Command::Delresponse(arg) => text("delresponse", arg).map(PolicyChange::RemoveAutoResponse),
        Command::Start | Command::Help | Command::Settings | Command::Warn(_) | Command::Unwarn(_) => {
            return None;
        }
    };
    Some(change)
}

fn toggle(command: &'static str, arg: &str) -> Result<bool, Usage> {
    match arg.trim().to_lowercase().as_str() {
        "on" | "вкл" | "yes" | "true" | "1" => Ok(true),
        "off" | "выкл" | "no" | "false" | "0" => Ok(false),
        _ => Err(Usage::Toggle(command)),
    }
}

/// Range checks are left to the policy, which rejects non-positive values.
fn number(command: &'static str, arg: &str) -> Result<i64, Usage> {
    arg.trim().parse().map_err(|_| Usage::Number(command))
}

fn text(command: &'static str, arg: &str) -> Result<String, Usage> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err(Usage::Text(command));
    }
    Ok(arg.to_string())
}

/// `<trigger> | <response>`
fn auto_response(arg: &str) -> Result<PolicyChange, Usage> {
    let (trigger, response) = arg.split_once('|').ok_or(Usage::Response)?;
    let (trigger, response) = (trigger.trim(), response.trim());
    if trigger.is_empty() || response.is_empty() {
        return Err(Usage::Response);
    }
    Ok(PolicyChange::AddAutoResponse {
        trigger: trigger.to_string(),
        response: response.to_string(),
    })
}

/// Handle every settings edit command.
pub async fn config_command(bot: ThrottledBot, msg: Message, state: AppState, cmd: Command) -> anyhow::Result<()> {
    if !require_group(&bot, &msg, &state).await? {
        return Ok(());
    }
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };

    let change = match policy_change(&cmd) {
        Some(Ok(change)) => change,
        Some(Err(usage)) => return reply(&bot, &msg, usage.text(&state)).await,
        None => return Ok(()),
    };

    let request = ConfigRequest {
        chat: ChatId(msg.chat.id.0),
        requester: UserId(from.id.0),
        change,
    };

    match state.engine.handle_config(&request).await {
        Ok(_) => reply(&bot, &msg, state.text("settings.saved")).await,
        Err(e) => {
            debug!("Settings change in chat {} rejected: {}", msg.chat.id, e);
            reply(&bot, &msg, error_text(&state, &e)).await
        }
    }
}

/// Handle /settings (admins only).
pub async fn settings_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    if !require_group(&bot, &msg, &state).await? {
        return Ok(());
    }
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };

    let chat = ChatId(msg.chat.id.0);
    match state.engine.permissions().is_elevated(chat, UserId(from.id.0)).await {
        Ok(true) => {}
        Ok(false) => return reply(&bot, &msg, state.text("common.admin_only")).await,
        Err(e) => return reply(&bot, &msg, error_text(&state, &EngineError::from(e))).await,
    }

    let policy = match state.engine.configs().get(chat).await {
        Ok(policy) => policy,
        Err(e) => return reply(&bot, &msg, error_text(&state, &EngineError::from(e))).await,
    };

    reply(&bot, &msg, summary(&state.text("settings.summary"), &policy)).await
}

/// Fill the settings summary template.
pub fn summary(template: &str, policy: &Policy) -> String {
    let flag = |on: bool| if on { "✅" } else { "❌" };
    let terms = if policy.banned_terms.is_empty() {
        "-".to_string()
    } else {
        policy.banned_terms.join(", ")
    };
    let responses = if policy.auto_responses.is_empty() {
        "-".to_string()
    } else {
        policy
            .auto_responses
            .iter()
            .map(|r| r.trigger.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    template
        .replace("{welcome}", flag(policy.welcome_enabled))
        .replace("{goodbye}", flag(policy.goodbye_enabled))
        .replace("{antispam}", flag(policy.antispam_enabled))
        .replace("{links}", flag(policy.delete_links))
        .replace("{forwards}", flag(policy.delete_forwards))
        .replace("{max_messages}", &policy.max_messages_per_minute.to_string())
        .replace("{warn_limit}", &policy.warn_limit.to_string())
        .replace("{terms}", &terms)
        .replace("{responses}", &responses)
        // Templates last: they contain placeholders of their own
        .replace("{welcome_message}", &policy.welcome_message)
        .replace("{goodbye_message}", &policy.goodbye_message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles() {
        assert_eq!(
            policy_change(&Command::Antilinks("ON".to_string())),
            Some(Ok(PolicyChange::SetDeleteLinks(true)))
        );
        assert_eq!(
            policy_change(&Command::Welcome("выкл".to_string())),
            Some(Ok(PolicyChange::SetWelcomeEnabled(false)))
        );
        assert_eq!(
            policy_change(&Command::Antispam("maybe".to_string())),
            Some(Err(Usage::Toggle("antispam")))
        );
    }

    #[test]
    fn test_numbers_are_passed_through_for_validation() {
        assert_eq!(
            policy_change(&Command::Setflood(" 10 ".to_string())),
            Some(Ok(PolicyChange::SetMaxMessagesPerMinute(10)))
        );
        assert_eq!(
            policy_change(&Command::Setwarnlimit("0".to_string())),
            Some(Ok(PolicyChange::SetWarnLimit(0)))
        );
        assert_eq!(
            policy_change(&Command::Setwarnlimit("three".to_string())),
            Some(Err(Usage::Number("setwarnlimit")))
        );
    }

    #[test]
    fn test_add_response_needs_both_parts() {
        assert_eq!(
            policy_change(&Command::Addresponse("правила | Читайте закреп".to_string())),
            Some(Ok(PolicyChange::AddAutoResponse {
                trigger: "правила".to_string(),
                response: "Читайте закреп".to_string(),
            }))
        );
        assert_eq!(
            policy_change(&Command::Addresponse("правила".to_string())),
            Some(Err(Usage::Response))
        );
        assert_eq!(
            policy_change(&Command::Addresponse(" | ответ".to_string())),
            Some(Err(Usage::Response))
        );
    }

    #[test]
    fn test_empty_text_is_usage_error() {
        assert_eq!(
            policy_change(&Command::Addword("  ".to_string())),
            Some(Err(Usage::Text("addword")))
        );
    }

    #[test]
    fn test_other_commands_are_not_settings() {
        assert_eq!(policy_change(&Command::Settings), None);
        assert_eq!(policy_change(&Command::Warn(String::new())), None);
    }

    #[test]
    fn test_summary_keeps_template_placeholders() {
        let text = summary("{welcome} {welcome_message} {terms} {responses} {warn_limit}", &Policy::default());
        assert_eq!(text, "✅ Добро пожаловать в чат, {name}! 👋 спам, реклама - 3");
    }
}
