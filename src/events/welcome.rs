//! Welcome messages for new members.

use tracing::debug;

use super::Action;
use crate::database::models::{ChatId, ChatUser, Policy};
use crate::utils::render;

/// Plan the greeting for a member who joined `chat`.
pub fn plan(policy: &Policy, chat: ChatId, user: &ChatUser) -> Vec<Action> {
    if !policy.welcome_enabled {
        debug!("Welcome disabled for chat {}", chat);
        return Vec::new();
    }

    vec![Action::SendText {
        chat,
        text: render(&policy.welcome_message, user),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_greeting() {
        let user = ChatUser::new(5, "Ivan");
        let actions = plan(&Policy::default(), ChatId(-1), &user);
        assert_eq!(
            actions,
            vec![Action::SendText {
                chat: ChatId(-1),
                text: "Добро пожаловать в чат, Ivan! 👋".to_string(),
            }]
        );
    }

    #[test]
    fn test_disabled_greeting() {
        let policy = Policy {
            welcome_enabled: false,
            ..Policy::default()
        };
        assert!(plan(&policy, ChatId(-1), &ChatUser::new(5, "Ivan")).is_empty());
    }
}
