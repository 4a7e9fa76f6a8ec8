//! Warden - per-chat moderation policy engine.
//!
//! Decides, for every inbound chat event, whether to suppress content,
//! warn or ban a user, or send an automated reply.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - Key-value store abstraction, policy and warning storage
//! - `cache` - LRU-based caching with Moka
//! - `events` - Event model, moderation pipeline and its stages
//! - `permissions` - Role lookups with caching
//! - `transport` - Abstract chat transport the engine calls into
//! - `i18n` - Notice catalogues
//! - `utils` - Template rendering helpers

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod i18n;
pub mod permissions;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod testing;

pub use error::{ConfigError, EngineError, StoreError, TransportError};
pub use events::{Action, Engine, Event};
