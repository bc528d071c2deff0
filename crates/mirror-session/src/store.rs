// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host-level session store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use mirror_protocol::Value;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tracing::debug;

use crate::session::{SessionHandle, UiSession};

/// Transport-level session: host attributes plus the UI session slot.
///
/// The slot's mutex is the per-session execution lock. It is FIFO-fair, so
/// queued requests run in the order they started waiting.
#[derive(Debug)]
pub struct HostSession {
    id: String,
    attributes: Mutex<HashMap<String, Value>>,
    ui: AsyncMutex<Option<UiSession>>,
}

impl HostSession {
    fn new(id: String) -> Self {
        Self {
            id,
            attributes: Mutex::new(HashMap::new()),
            ui: AsyncMutex::new(None),
        }
    }

    /// Transport-level id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Host attribute; survives UI session restarts.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Write a host attribute.
    pub fn set_attribute(&self, name: impl Into<String>, value: Value) {
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value);
    }

    /// Whether any host attribute is set.
    pub fn has_attributes(&self) -> bool {
        !self
            .attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Acquire the execution lock and the UI session slot behind it.
    pub async fn lock(&self) -> MutexGuard<'_, Option<UiSession>> {
        self.ui.lock().await
    }

    /// Handle of the bound UI session, if any.
    pub async fn ui_session(&self) -> Option<SessionHandle> {
        self.lock().await.as_ref().map(UiSession::handle)
    }
}

/// All host sessions of one process.
#[derive(Debug, Default)]
pub struct SessionStore {
    hosts: Mutex<HashMap<String, Arc<HostSession>>>,
    next_ui_id: AtomicU64,
}

impl SessionStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host session for `id`, created on first use.
    pub fn host(&self, id: &str) -> Arc<HostSession> {
        self.hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.to_owned())
            .or_insert_with(|| Arc::new(HostSession::new(id.to_owned())))
            .clone()
    }

    /// Existing host session for `id`.
    pub fn get(&self, id: &str) -> Option<Arc<HostSession>> {
        self.hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Whether `host` is still the session registered under its id.
    pub fn holds(&self, host: &Arc<HostSession>) -> bool {
        self.hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(host.id())
            .is_some_and(|current| Arc::ptr_eq(current, host))
    }

    /// Forget `host` if it is still registered and carries no attributes.
    ///
    /// Call with the host's execution lock held and its slot empty. Requests
    /// already queued on the lock see [`holds`](Self::holds) fail and look
    /// the host up again.
    pub fn evict_if_idle(&self, host: &Arc<HostSession>) -> bool {
        let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = hosts
            .get(host.id())
            .is_some_and(|current| Arc::ptr_eq(current, host))
            && !host.has_attributes();
        if idle {
            hosts.remove(host.id());
            debug!(host = %host.id(), "host session evicted");
        }
        idle
    }

    /// Number of registered host sessions.
    pub fn len(&self) -> usize {
        self.hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no host session is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle of the UI session bound to host `id`.
    pub async fn ui_session(&self, id: &str) -> Option<SessionHandle> {
        match self.get(id) {
            Some(host) => host.ui_session().await,
            None => None,
        }
    }

    /// Fresh UI session with a process-unique id.
    pub fn new_ui_session(&self) -> UiSession {
        let n = self.next_ui_id.fetch_add(1, Ordering::Relaxed) + 1;
        UiSession::new(format!("ui-{n}"))
    }
}
