//! Goodbye messages for members who left.

use tracing::debug;

use super::Action;
use crate::database::models::{ChatId, ChatUser, Policy};
use crate::utils::render;

pub fn plan(policy: &Policy, chat: ChatId, user: &ChatUser) -> Vec<Action> {
    if !policy.goodbye_enabled {
        debug!("Goodbye disabled for chat {}", chat);
        return Vec::new();
    }

    vec![Action::SendText {
        chat,
        text: render(&policy.goodbye_message, user),
    }]
}
