//! Abstract chat transport.
//!
//! The engine never talks to the network itself. Everything it decides is
//! carried out through this trait, implemented by the front-end (Telegram
//! in the `warden` binary, a recording fake in tests).

use async_trait::async_trait;

use crate::database::models::{ChatId, MessageId, UserId};
use crate::error::TransportError;

/// Membership role of a user in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Member,
    Admin,
    Owner,
}

impl Role {
    /// Admins and owners may issue moderation commands.
    pub fn is_elevated(self) -> bool {
        matches!(self, Role::Admin | Role::Owner)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), TransportError>;

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), TransportError>;

    async fn ban_user(&self, chat: ChatId, user: UserId) -> Result<(), TransportError>;

    async fn get_role(&self, chat: ChatId, user: UserId) -> Result<Role, TransportError>;
}
