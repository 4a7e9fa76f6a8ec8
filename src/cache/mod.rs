//! Cache module - typed caches on top of Moka.
//!
//! Hot-path lookups (chat policies, member roles) are served from
//! in-process caches so the moderation pipeline never waits on the
//! backing store or the chat API for data it has already seen.
//!
//! ## Usage
//!
//! ```rust
//! use warden::cache::{CacheConfig, TypedCache};
//!
//! let roles: TypedCache<(i64, u64), bool> = TypedCache::new("roles", CacheConfig::roles());
//! roles.insert((1, 2), true);
//! assert_eq!(roles.get(&(1, 2)), Some(true));
//! ```

mod config;
mod typed;

pub use config::CacheConfig;
pub use typed::TypedCache;
