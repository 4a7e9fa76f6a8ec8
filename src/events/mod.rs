//! Event model and the moderation pipeline.
//!
//! The front-end turns platform updates into [`Event`]s and operator
//! commands into requests; the [`Engine`] decides and executes the
//! resulting [`Action`]s.
//!
//! Pipeline stages live in their own files:
//! - `antiflood` - sliding-window spam limiter and its sweeper
//! - `filters` - banned terms, auto-responses, link detection
//! - `welcome` / `bye` - membership greetings

pub mod antiflood;
pub mod bye;
pub mod filters;
pub mod welcome;

mod engine;

pub use antiflood::{SPAM_WINDOW, SpamLimiter, spawn_sweeper};
pub use engine::Engine;

use crate::database::models::{ChatId, ChatUser, MessageId, PolicyChange, UserId};

/// Inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    MessageSent {
        chat: ChatId,
        user: ChatUser,
        text: String,
        message_id: MessageId,
        is_forward: bool,
    },
    MemberJoined {
        chat: ChatId,
        user: ChatUser,
    },
    MemberLeft {
        chat: ChatId,
        user: ChatUser,
    },
}

impl Event {
    pub fn chat(&self) -> ChatId {
        match self {
            Event::MessageSent { chat, .. }
            | Event::MemberJoined { chat, .. }
            | Event::MemberLeft { chat, .. } => *chat,
        }
    }
}

/// Something the engine wants the transport to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    DeleteMessage { chat: ChatId, message_id: MessageId },
    SendText { chat: ChatId, text: String },
    BanUser { chat: ChatId, user: UserId },
    NoOp,
}

impl Action {
    /// Enforcement actions. Notices that follow one in a batch are only
    /// sent when it succeeded.
    pub fn is_gating(&self) -> bool {
        matches!(self, Action::DeleteMessage { .. } | Action::BanUser { .. })
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Action::NoOp)
    }
}

/// Administrative warning of `target`, issued by `requester`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarnRequest {
    pub chat: ChatId,
    pub requester: UserId,
    pub target: ChatUser,
}

/// Administrative reset of the warnings of `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearWarningsRequest {
    pub chat: ChatId,
    pub requester: UserId,
    pub target: ChatUser,
}

/// Operator edit of the chat policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRequest {
    pub chat: ChatId,
    pub requester: UserId,
    pub change: PolicyChange,
}
