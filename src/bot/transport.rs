//! Telegram implementation of the engine transport.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{self as tg, ChatMemberKind};
use teloxide::{ApiError, RequestError};

use warden::TransportError;
use warden::database::models::{ChatId, MessageId, UserId};
use warden::transport::{Role, Transport};

use super::dispatcher::ThrottledBot;

/// Bot API calls behind the [`Transport`] trait.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: ThrottledBot,
}

impl TelegramTransport {
    pub fn new(bot: ThrottledBot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), TransportError> {
        self.bot
            .delete_message(tg::ChatId(chat.0), tg::MessageId(message.0))
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), TransportError> {
        self.bot
            .send_message(tg::ChatId(chat.0), text)
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn ban_user(&self, chat: ChatId, user: UserId) -> Result<(), TransportError> {
        self.bot
            .ban_chat_member(tg::ChatId(chat.0), tg::UserId(user.0))
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn get_role(&self, chat: ChatId, user: UserId) -> Result<Role, TransportError> {
        let member = self
            .bot
            .get_chat_member(tg::ChatId(chat.0), tg::UserId(user.0))
            .await
            .map_err(map_error)?;

        Ok(match member.kind {
            ChatMemberKind::Owner(_) => Role::Owner,
            ChatMemberKind::Administrator(_) => Role::Admin,
            _ => Role::Member,
        })
    }
}

fn map_error(err: RequestError) -> TransportError {
    match &err {
        RequestError::Api(
            ApiError::BotBlocked
            | ApiError::BotKicked
            | ApiError::BotKickedFromSupergroup
            | ApiError::MessageCantBeDeleted
            | ApiError::NotEnoughRightsToRestrict,
        ) => TransportError::Forbidden(err.to_string()),
        RequestError::Network(_) | RequestError::Io(_) | RequestError::RetryAfter(_) => {
            TransportError::Network(err.to_string())
        }
        _ => TransportError::Other(err.to_string()),
    }
}
