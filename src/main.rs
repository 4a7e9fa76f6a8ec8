//! Warden - Telegram front-end for the moderation engine.
//!
//! ## Architecture
//!
//! - `bot` - Dispatcher, Telegram transport, polling/webhook runtime
//! - `plugins` - Operator commands
//!
//! All moderation decisions live in the `warden` library.

mod bot;
mod plugins;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use warden::Engine;
use warden::config::Config;
use warden::database::{Database, KvStore, MemoryStore, MongoStore};
use warden::events::{SPAM_WINDOW, spawn_sweeper};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warden=info,teloxide=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Warden...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    let store: Arc<dyn KvStore> = match &config.mongodb_uri {
        Some(uri) => {
            info!("Connecting to MongoDB...");
            let db = Database::connect(uri, &config.mongodb_database).await?;
            info!("Database connected");
            Arc::new(MongoStore::new(&db))
        }
        None => {
            info!("MONGODB_URI not set, keeping state in memory");
            Arc::new(MemoryStore::new())
        }
    };

    // Throttle respects Telegram's rate limits:
    // - 30 messages per second globally
    // - 1 message per second to the same chat
    // - 20 messages per minute to the same group
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());
    info!("Bot initialized with rate limiting (Throttle)");

    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    if config.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    let transport = Arc::new(bot::TelegramTransport::new(bot.clone()));
    let engine = Arc::new(
        Engine::new(store, transport, config.owner_ids.clone()).with_locale(config.locale.clone()),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = spawn_sweeper(engine.spam().clone(), config.sweep_interval, SPAM_WINDOW, shutdown_rx);
    info!("Spam window sweeper running every {:?}", config.sweep_interval);

    let dispatcher = bot::build_dispatcher(bot.clone(), engine);
    let result = bot::run(&config, dispatcher, bot).await;

    // The dispatcher has drained; stop background work
    shutdown_tx.send(true).ok();
    sweeper.await?;
    info!("Warden stopped");

    result
}
