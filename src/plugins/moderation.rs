//! Warning commands.
//!
//! The target is the author of the replied-to message, or a user mentioned
//! by a text mention (a mention of someone without a public handle).

use teloxide::prelude::*;
use teloxide::types::{MessageEntityKind, User};

use warden::database::models::{ChatId, UserId};
use warden::events::{ClearWarningsRequest, WarnRequest};

use super::{error_text, reply, require_group};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::bot::updates::chat_user;

/// Handle /warn.
pub async fn warn_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    if !require_group(&bot, &msg, &state).await? {
        return Ok(());
    }
    let (Some(requester), Some(target)) = (msg.from.as_ref(), target_user(&msg)) else {
        return reply(&bot, &msg, state.text("warn.no_target")).await;
    };

    let request = WarnRequest {
        chat: ChatId(msg.chat.id.0),
        requester: UserId(requester.id.0),
        target: chat_user(target),
    };

    // Success notices are sent by the engine itself
    if let Err(e) = state.engine.handle_warn(&request).await {
        reply(&bot, &msg, error_text(&state, &e)).await?;
    }
    Ok(())
}

/// Handle /unwarn.
pub async fn unwarn_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    if !require_group(&bot, &msg, &state).await? {
        return Ok(());
    }
    let (Some(requester), Some(target)) = (msg.from.as_ref(), target_user(&msg)) else {
        return reply(&bot, &msg, state.text("warn.no_target")).await;
    };

    let request = ClearWarningsRequest {
        chat: ChatId(msg.chat.id.0),
        requester: UserId(requester.id.0),
        target: chat_user(target),
    };

    if let Err(e) = state.engine.handle_clear_warnings(&request).await {
        reply(&bot, &msg, error_text(&state, &e)).await?;
    }
    Ok(())
}

/// Reply author first, then the first text mention.
fn target_user(msg: &Message) -> Option<&User> {
    if let Some(user) = msg.reply_to_message().and_then(|reply| reply.from.as_ref()) {
        return Some(user);
    }

    msg.entities()?.iter().find_map(|entity| match &entity.kind {
        MessageEntityKind::TextMention { user } => Some(user),
        _ => None,
    })
}
