//! Message dispatcher setup.
//!
//! Builds the dispatcher with the command handlers and the update adapters
//! that feed the engine.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use warden::Engine;

use super::updates;
use crate::plugins;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Moderation engine (policies, warnings, spam windows, roles).
    pub engine: Arc<Engine>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    /// Notice text in the engine locale.
    pub fn text(&self, key: &str) -> String {
        self.engine.text(key)
    }
}

/// Build the dispatcher with all handlers.
///
/// Updates of one chat are handled in arrival order, different chats in
/// parallel. Ctrl-C stops the listener and waits for running handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    engine: Arc<Engine>,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    let state = AppState::new(engine);

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    // Commands first; everything else goes through the moderation pipeline
    let message_handler = Update::filter_message()
        .branch(plugins::command_handler())
        .branch(updates::message_handler());

    let member_handler = Update::filter_chat_member().branch(updates::member_handler());

    dptree::entry()
        .branch(message_handler)
        .branch(member_handler)
}
