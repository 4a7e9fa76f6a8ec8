//! Event dispatcher.
//!
//! Loads the chat policy, runs the pipeline for the event and executes the
//! resulting actions through the transport.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::antiflood::{SPAM_WINDOW, SpamLimiter};
use super::filters::{contains_link, match_auto_response, match_banned_term};
use super::{Action, ClearWarningsRequest, ConfigRequest, Event, WarnRequest, bye, welcome};
use crate::database::models::{ChatId, ChatUser, MessageId, Policy, UserId, WarnOutcome};
use crate::database::{ConfigStore, KvStore, WarningTracker};
use crate::error::EngineError;
use crate::i18n::get_text;
use crate::permissions::Permissions;
use crate::transport::Transport;
use crate::utils::{preview, render};

const DEFAULT_LOCALE: &str = "ru";

/// The moderation engine.
///
/// Owns no persistent state itself: policies and warnings live in the
/// store, spam windows in the limiter.
pub struct Engine {
    configs: ConfigStore,
    warnings: WarningTracker,
    spam: SpamLimiter,
    permissions: Permissions,
    transport: Arc<dyn Transport>,
    locale: String,
}

impl Engine {
    pub fn new(store: Arc<dyn KvStore>, transport: Arc<dyn Transport>, owner_ids: Vec<u64>) -> Self {
        Self {
            configs: ConfigStore::new(store.clone()),
            warnings: WarningTracker::new(store),
            spam: SpamLimiter::new(),
            permissions: Permissions::new(transport.clone(), owner_ids),
            transport,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Language of the notices the engine sends.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn configs(&self) -> &ConfigStore {
        &self.configs
    }

    pub fn warnings(&self) -> &WarningTracker {
        &self.warnings
    }

    pub fn spam(&self) -> &SpamLimiter {
        &self.spam
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    /// Notice text in the engine locale.
    pub fn text(&self, key: &str) -> String {
        get_text(&self.locale, key)
    }

    /// Handle an inbound event. Returns the actions that were planned.
    pub async fn dispatch(&self, event: &Event) -> Result<Vec<Action>, EngineError> {
        self.dispatch_at(event, Instant::now()).await
    }

    /// Same as [`Engine::dispatch`] with an explicit clock reading.
    pub async fn dispatch_at(&self, event: &Event, now: Instant) -> Result<Vec<Action>, EngineError> {
        let policy = self.configs.get(event.chat()).await?;
        let actions = self.plan(event, &policy, now);

        if actions.iter().any(|a| !a.is_noop()) {
            self.execute(&actions).await;
        }
        Ok(actions)
    }

    /// Decide what to do about `event`.
    ///
    /// Message events are recorded in the spam limiter as a side effect,
    /// and a member leaving forgets their window.
    pub fn plan(&self, event: &Event, policy: &Policy, now: Instant) -> Vec<Action> {
        match event {
            Event::MessageSent {
                chat,
                user,
                text,
                message_id,
                is_forward,
            } => self.plan_message(policy, *chat, user, text, *message_id, *is_forward, now),
            Event::MemberJoined { chat, user } => welcome::plan(policy, *chat, user),
            Event::MemberLeft { chat, user } => {
                self.spam.reset(*chat, user.id);
                bye::plan(policy, *chat, user)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn plan_message(
        &self,
        policy: &Policy,
        chat: ChatId,
        user: &ChatUser,
        text: &str,
        message_id: MessageId,
        is_forward: bool,
        now: Instant,
    ) -> Vec<Action> {
        let delete = Action::DeleteMessage { chat, message_id };

        if policy.antispam_enabled
            && self
                .spam
                .record_and_check(chat, user.id, now, SPAM_WINDOW, policy.max_messages_per_minute)
        {
            info!("Spam from user {} in chat {}, deleting message {}", user.id, chat, message_id);
            return vec![
                delete,
                Action::SendText {
                    chat,
                    text: render(&self.text("spam.warning"), user),
                },
            ];
        }

        if policy.delete_forwards && is_forward {
            info!("Deleting forwarded message {} in chat {}", message_id, chat);
            return vec![delete];
        }

        if policy.delete_links && contains_link(text) {
            info!("Deleting message {} with a link in chat {}", message_id, chat);
            return vec![delete];
        }

        if let Some(term) = match_banned_term(text, policy) {
            info!(
                "Banned term '{}' from user {} in chat {}, deleting message {}",
                term, user.id, chat, message_id
            );
            return vec![
                delete,
                Action::SendText {
                    chat,
                    text: self.text("filter.violation"),
                },
            ];
        }

        if let Some(response) = match_auto_response(text, policy) {
            debug!("Auto-response in chat {} for '{}'", chat, preview(text, 30));
            return vec![Action::SendText {
                chat,
                text: response.to_string(),
            }];
        }

        Vec::new()
    }

    /// Warn a user on behalf of an admin, banning at the chat's limit.
    pub async fn handle_warn(&self, request: &WarnRequest) -> Result<WarnOutcome, EngineError> {
        let WarnRequest { chat, requester, target } = request;
        self.authorize(*chat, *requester).await?;

        let policy = self.configs.get(*chat).await?;
        let limit = i64::from(policy.warn_limit);
        let outcome = self.warnings.warn(*chat, target.id, limit).await?;

        let actions = if outcome.escalated {
            info!(
                "User {} reached {} warnings in chat {}, banning",
                target.id, outcome.count, chat
            );
            let notice = self
                .text("warn.banned")
                .replace("{count}", &outcome.count.to_string());
            vec![
                Action::BanUser { chat: *chat, user: target.id },
                Action::SendText {
                    chat: *chat,
                    text: render(&notice, target),
                },
            ]
        } else {
            let notice = self
                .text("warn.issued")
                .replace("{count}", &outcome.count.to_string())
                .replace("{limit}", &limit.to_string());
            vec![Action::SendText {
                chat: *chat,
                text: render(&notice, target),
            }]
        };

        self.execute(&actions).await;
        Ok(outcome)
    }

    /// Reset the warnings of a user on behalf of an admin.
    pub async fn handle_clear_warnings(&self, request: &ClearWarningsRequest) -> Result<(), EngineError> {
        let ClearWarningsRequest { chat, requester, target } = request;
        self.authorize(*chat, *requester).await?;

        self.warnings.clear(*chat, target.id).await?;
        info!("Warnings of user {} in chat {} cleared by {}", target.id, chat, requester);

        self.execute(&[Action::SendText {
            chat: *chat,
            text: render(&self.text("warn.cleared"), target),
        }])
        .await;
        Ok(())
    }

    /// Apply an operator policy edit. Returns the policy now in effect.
    pub async fn handle_config(&self, request: &ConfigRequest) -> Result<Arc<Policy>, EngineError> {
        let ConfigRequest { chat, requester, change } = request;
        self.authorize(*chat, *requester).await?;

        let policy = self.configs.update(*chat, |policy| policy.apply(change)).await?;
        info!("Policy of chat {} changed by {}: {:?}", chat, requester, change);
        Ok(policy)
    }

    async fn authorize(&self, chat: ChatId, requester: UserId) -> Result<(), EngineError> {
        if self.permissions.is_elevated(chat, requester).await? {
            Ok(())
        } else {
            debug!("User {} is not an admin in chat {}", requester, chat);
            Err(EngineError::Unauthorized)
        }
    }

    /// Run actions in order. Transport failures are logged, not returned.
    ///
    /// After a failed delete or ban, the notices left in the batch are
    /// dropped. Returns the number of actions that went through.
    pub async fn execute(&self, actions: &[Action]) -> usize {
        let mut done = 0;
        let mut enforcement_failed = false;

        for action in actions {
            let result = match action {
                Action::NoOp => continue,
                Action::SendText { chat, .. } if enforcement_failed => {
                    debug!("Dropping notice for chat {} after failed enforcement", chat);
                    continue;
                }
                Action::DeleteMessage { chat, message_id } => {
                    self.transport.delete_message(*chat, *message_id).await
                }
                Action::SendText { chat, text } => self.transport.send_text(*chat, text).await,
                Action::BanUser { chat, user } => self.transport.ban_user(*chat, *user).await,
            };

            match result {
                Ok(()) => done += 1,
                Err(e) => {
                    warn!("Failed to execute {:?}: {}", action, e);
                    if action.is_gating() {
                        enforcement_failed = true;
                    }
                }
            }
        }

        done
    }
}
