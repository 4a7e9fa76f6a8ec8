//! Test doubles shared by unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::database::MemoryStore;
use crate::database::models::{ChatId, MessageId, UserId};
use crate::error::TransportError;
use crate::events::Engine;
use crate::transport::{Role, Transport};

/// A transport call as observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Delete(ChatId, MessageId),
    Send(ChatId, String),
    Ban(ChatId, UserId),
}

/// Transport that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    roles: Mutex<HashMap<(ChatId, UserId), Role>>,
    role_lookups: AtomicUsize,
    pub fail_deletes: AtomicBool,
    pub fail_bans: AtomicBool,
    pub fail_roles: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_role(&self, chat: ChatId, user: UserId, role: Role) {
        self.roles.lock().insert((chat, user), role);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock())
    }

    pub fn role_lookups(&self) -> usize {
        self.role_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), TransportError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(TransportError::Forbidden("can't delete messages".to_string()));
        }
        self.calls.lock().push(Call::Delete(chat, message));
        Ok(())
    }

    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), TransportError> {
        self.calls.lock().push(Call::Send(chat, text.to_string()));
        Ok(())
    }

    async fn ban_user(&self, chat: ChatId, user: UserId) -> Result<(), TransportError> {
        if self.fail_bans.load(Ordering::SeqCst) {
            return Err(TransportError::Forbidden("can't restrict members".to_string()));
        }
        self.calls.lock().push(Call::Ban(chat, user));
        Ok(())
    }

    async fn get_role(&self, chat: ChatId, user: UserId) -> Result<Role, TransportError> {
        self.role_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_roles.load(Ordering::SeqCst) {
            return Err(TransportError::Network("timed out".to_string()));
        }
        Ok(self
            .roles
            .lock()
            .get(&(chat, user))
            .copied()
            .unwrap_or(Role::Member))
    }
}

/// Engine over a fresh in-memory store and a recording transport.
pub fn engine() -> (Engine, Arc<RecordingTransport>) {
    let transport = RecordingTransport::new();
    let engine = Engine::new(Arc::new(MemoryStore::new()), transport.clone(), Vec::new());
    (engine, transport)
}
