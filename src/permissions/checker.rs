//! Permission checker with caching.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheConfig, TypedCache};
use crate::database::models::{ChatId, UserId};
use crate::error::TransportError;
use crate::transport::{Role, Transport};

/// Cache key for role lookups.
type RoleCacheKey = (ChatId, UserId);

/// Role checker with caching support.
///
/// Bot owners (from OWNER_IDS env) are treated as chat owners everywhere.
#[derive(Clone)]
pub struct Permissions {
    transport: Arc<dyn Transport>,
    cache: TypedCache<RoleCacheKey, Role>,
    owner_ids: Arc<[u64]>,
}

impl Permissions {
    pub fn new(transport: Arc<dyn Transport>, owner_ids: Vec<u64>) -> Self {
        Self {
            transport,
            cache: TypedCache::new("member_roles", CacheConfig::roles()),
            owner_ids: owner_ids.into(),
        }
    }

    /// Check if a user is a bot owner.
    #[inline]
    pub fn is_bot_owner(&self, user: UserId) -> bool {
        self.owner_ids.contains(&user.0)
    }

    /// Resolve the role of a user in a chat.
    ///
    /// A failing lookup is returned as an error and is not cached.
    pub async fn role(&self, chat: ChatId, user: UserId) -> Result<Role, TransportError> {
        if self.is_bot_owner(user) {
            debug!("User {} is bot owner, granting owner role", user);
            return Ok(Role::Owner);
        }

        let cache_key = (chat, user);
        if let Some(role) = self.cache.get(&cache_key) {
            debug!("Role cache hit for user {} in chat {}", user, chat);
            return Ok(role);
        }

        debug!("Role cache miss for user {} in chat {}", user, chat);
        let role = self.transport.get_role(chat, user).await?;
        self.cache.insert(cache_key, role);

        Ok(role)
    }

    /// Check if a user is an admin or owner.
    pub async fn is_elevated(&self, chat: ChatId, user: UserId) -> Result<bool, TransportError> {
        Ok(self.role(chat, user).await?.is_elevated())
    }

    /// Invalidate cached role for a user.
    ///
    /// Call this when admin status might have changed.
    pub fn invalidate(&self, chat: ChatId, user: UserId) {
        self.cache.invalidate(&(chat, user));
        debug!("Invalidated role cache for user {} in chat {}", user, chat);
    }
}
