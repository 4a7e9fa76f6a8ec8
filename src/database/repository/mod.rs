//! Repository module - typed access to engine state over the key-value store.

mod policy_repository;
mod warns_repository;

pub use policy_repository::ConfigStore;
pub use warns_repository::WarningTracker;
