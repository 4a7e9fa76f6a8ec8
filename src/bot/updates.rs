//! Telegram updates to engine events.
//!
//! Group messages become `MessageSent`, chat member changes become
//! `MemberJoined` / `MemberLeft`. Updates that map to no event are logged
//! and dropped.

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberKind, ChatMemberUpdated, MessageKind, User};
use tracing::{debug, error, warn};

use warden::Event;
use warden::database::models::{ChatId, ChatUser, MessageId, UserId};
use warden::utils::preview;

use super::dispatcher::AppState;

/// Handler for group messages that are not commands.
pub fn message_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|msg: Message| msg.chat.is_group() || msg.chat.is_supergroup())
        .endpoint(handle_message)
}

/// Handler for members joining or leaving.
pub fn member_handler() -> UpdateHandler<anyhow::Error> {
    dptree::endpoint(handle_member)
}

async fn handle_message(msg: Message, state: AppState) -> anyhow::Result<()> {
    let event = match message_event(&msg) {
        Ok(event) => event,
        Err(Skipped::Service) => {
            debug!("Ignoring service message {} in chat {}", msg.id, msg.chat.id);
            return Ok(());
        }
        Err(Skipped::NoSender) => {
            warn!("Ignoring message {} in chat {}: no sender", msg.id, msg.chat.id);
            return Ok(());
        }
    };

    if let Event::MessageSent { ref text, .. } = event {
        debug!("Message in chat {}: '{}'", msg.chat.id, preview(text, 30));
    }

    if let Err(e) = state.engine.dispatch(&event).await {
        error!("Failed to moderate message {} in chat {}: {}", msg.id, msg.chat.id, e);
    }
    Ok(())
}

async fn handle_member(update: ChatMemberUpdated, state: AppState) -> anyhow::Result<()> {
    if elevation_changed(&update.old_chat_member.kind, &update.new_chat_member.kind) {
        let chat = ChatId(update.chat.id.0);
        let user = UserId(update.new_chat_member.user.id.0);
        debug!("Role of user {} changed in chat {}, dropping cached role", user, chat);
        state.engine.permissions().invalidate(chat, user);
    }

    let Some(event) = member_event(&update) else {
        debug!("Ignoring member update in chat {}", update.chat.id);
        return Ok(());
    };

    if let Err(e) = state.engine.dispatch(&event).await {
        error!("Failed to handle member update in chat {}: {}", update.chat.id, e);
    }
    Ok(())
}

/// Why a message maps to no event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skipped {
    /// Joins, pins, title changes and the like.
    Service,
    NoSender,
}

/// Map a regular user message.
pub fn message_event(msg: &Message) -> Result<Event, Skipped> {
    if !matches!(msg.kind, MessageKind::Common(_)) {
        return Err(Skipped::Service);
    }
    let from = msg.from.as_ref().ok_or(Skipped::NoSender)?;

    Ok(Event::MessageSent {
        chat: ChatId(msg.chat.id.0),
        user: chat_user(from),
        text: msg.text().or_else(|| msg.caption()).unwrap_or_default().to_string(),
        message_id: MessageId(msg.id.0),
        is_forward: msg.forward_origin().is_some(),
    })
}

/// Map a membership transition. Bots joining are not greeted.
pub fn member_event(update: &ChatMemberUpdated) -> Option<Event> {
    let old = &update.old_chat_member;
    let new = &update.new_chat_member;
    let chat = ChatId(update.chat.id.0);
    let user = chat_user(&new.user);

    if !old.is_present() && new.is_present() && !new.user.is_bot {
        Some(Event::MemberJoined { chat, user })
    } else if old.is_present() && !new.is_present() {
        Some(Event::MemberLeft { chat, user })
    } else {
        None
    }
}

/// True when a member gained or lost owner/admin status.
pub fn elevation_changed(old: &ChatMemberKind, new: &ChatMemberKind) -> bool {
    is_elevated(old) != is_elevated(new)
}

fn is_elevated(kind: &ChatMemberKind) -> bool {
    matches!(kind, ChatMemberKind::Owner(_) | ChatMemberKind::Administrator(_))
}

pub fn chat_user(user: &User) -> ChatUser {
    let chat_user = ChatUser::new(user.id.0, user.first_name.clone());
    match &user.username {
        Some(username) => chat_user.with_username(username.clone()),
        None => chat_user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::{Owner, UserId};

    fn user(id: u64, name: &str, username: Option<&str>) -> User {
        User {
            id: UserId(id),
            is_bot: false,
            first_name: name.to_string(),
            last_name: None,
            username: username.map(str::to_string),
            language_code: None,
            is_premium: false,
            added_to_attachment_menu: false,
        }
    }

    #[test]
    fn test_chat_user_keeps_handle() {
        let mapped = chat_user(&user(7, "Ivan", Some("ivan42")));
        assert_eq!(mapped, ChatUser::new(7, "Ivan").with_username("ivan42"));
        assert_eq!(mapped.handle(), "@ivan42");
    }

    #[test]
    fn test_chat_user_without_handle() {
        let mapped = chat_user(&user(7, "Ivan", None));
        assert_eq!(mapped.username, None);
        assert_eq!(mapped.handle(), "Ivan");
    }

    const GROUP: &str = r#"{"id":-1001331354980,"title":"test","type":"supergroup"}"#;
    const SENDER: &str = r#"{"id":7,"is_bot":false,"first_name":"Ivan","username":"ivan42"}"#;

    fn parse(fields: &str) -> Message {
        let json = format!(r#"{{"message_id":5,"date":1638236631,"chat":{GROUP},{fields}}}"#);
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_text_message_maps_to_event() {
        let msg = parse(&format!(r#""from":{SENDER},"text":"Привет""#));

        assert_eq!(
            message_event(&msg),
            Ok(Event::MessageSent {
                chat: ChatId(-1001331354980),
                user: ChatUser::new(7, "Ivan").with_username("ivan42"),
                text: "Привет".to_string(),
                message_id: MessageId(5),
                is_forward: false,
            })
        );
    }

    #[test]
    fn test_service_message_is_skipped_as_service() {
        let msg = parse(&format!(r#""from":{SENDER},"video_chat_started":{{}}"#));
        assert_eq!(message_event(&msg), Err(Skipped::Service));
    }

    #[test]
    fn test_message_without_sender_is_skipped() {
        let msg = parse(r#""text":"Привет""#);
        assert_eq!(message_event(&msg), Err(Skipped::NoSender));
    }

    fn owner() -> ChatMemberKind {
        ChatMemberKind::Owner(Owner {
            custom_title: None,
            is_anonymous: false,
        })
    }

    #[test]
    fn test_promotion_and_demotion_change_elevation() {
        assert!(elevation_changed(&ChatMemberKind::Member, &owner()));
        assert!(elevation_changed(&owner(), &ChatMemberKind::Left));
    }

    #[test]
    fn test_plain_membership_changes_keep_elevation() {
        assert!(!elevation_changed(&ChatMemberKind::Member, &ChatMemberKind::Left));
        assert!(!elevation_changed(&ChatMemberKind::Left, &ChatMemberKind::Member));
        assert!(!elevation_changed(&owner(), &owner()));
    }
}
