//! Database module exports.

pub mod models;
mod memory;
mod mongo;
mod repository;
mod store;

pub use memory::MemoryStore;
pub use models::*;
pub use mongo::{Database, MongoStore};
pub use repository::{ConfigStore, WarningTracker};
pub use store::{KvStore, Versioned, policy_key, warn_key};
