// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! UI session state machine: `Created → Started → Shutdown`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use mirror_protocol::Value;
use mirror_render::{Application, ObjectGraph};
use tracing::info;

use crate::counter::SyncState;
use crate::error::SessionError;

/// Lifecycle state of a UI session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, no request processed yet.
    Created,
    /// At least one request was processed.
    Started,
    /// Terminal.
    Shutdown,
}

/// Notified when a UI session shuts down.
pub trait SessionListener: Send + Sync {
    /// Called exactly once, before the session becomes unbound.
    fn before_destroy(&self, session: &SessionHandle);
}

struct Shared {
    id: String,
    bound: AtomicBool,
    attributes: Mutex<HashMap<String, Value>>,
    // `None` once the session started shutting down.
    listeners: Mutex<Option<Vec<Arc<dyn SessionListener>>>>,
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("id", &self.id)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

/// Cloneable reference to a UI session's identity, attribute store and
/// shutdown listeners.
///
/// Outlives the session itself; once the session shut down every attribute
/// access and listener registration fails with [`SessionError::Unbound`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    shared: Arc<Shared>,
}

impl SessionHandle {
    fn new(id: String) -> Self {
        Self {
            shared: Arc::new(Shared {
                id,
                bound: AtomicBool::new(true),
                attributes: Mutex::new(HashMap::new()),
                listeners: Mutex::new(Some(Vec::new())),
            }),
        }
    }

    /// Session id.
    pub fn id(&self) -> &str {
        &self.shared.id
    }

    /// Whether the session is still attached to its host.
    pub fn is_bound(&self) -> bool {
        self.shared.bound.load(Ordering::Acquire)
    }

    /// Whether both handles refer to the same session.
    pub fn same_session(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Read an attribute.
    pub fn attribute(&self, name: &str) -> Result<Option<Value>, SessionError> {
        let attributes = self.attributes()?;
        Ok(attributes.get(name).cloned())
    }

    /// Write an attribute, returning the previous value.
    pub fn set_attribute(
        &self,
        name: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, SessionError> {
        let mut attributes = self.attributes()?;
        Ok(attributes.insert(name.into(), value))
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attribute(&self, name: &str) -> Result<Option<Value>, SessionError> {
        let mut attributes = self.attributes()?;
        Ok(attributes.remove(name))
    }

    /// Register a listener fired when the session shuts down.
    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) -> Result<(), SessionError> {
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
            .map(|listeners| listeners.push(listener))
            .ok_or_else(|| SessionError::Unbound(self.shared.id.clone()))
    }

    fn take_listeners(&self) -> Vec<Arc<dyn SessionListener>> {
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_default()
    }

    fn attributes(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Value>>, SessionError> {
        if !self.is_bound() {
            return Err(SessionError::Unbound(self.shared.id.clone()));
        }
        Ok(self
            .shared
            .attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner))
    }

    fn unbind(&self) {
        self.shared.bound.store(false, Ordering::Release);
        self.shared
            .attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Server-side anchor of one client connection.
pub struct UiSession {
    handle: SessionHandle,
    state: SessionState,
    graph: ObjectGraph,
    application: Option<Box<dyn Application>>,
    sync: SyncState,
}

impl std::fmt::Debug for UiSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiSession")
            .field("id", &self.handle.id())
            .field("state", &self.state)
            .field("objects", &self.graph.len())
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}

impl UiSession {
    /// Fresh session in state [`SessionState::Created`].
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            handle: SessionHandle::new(id.into()),
            state: SessionState::Created,
            graph: ObjectGraph::new(),
            application: None,
            sync: SyncState::default(),
        }
    }

    /// Session id.
    pub fn id(&self) -> &str {
        self.handle.id()
    }

    /// Shareable handle to this session.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a request was already processed.
    pub fn is_started(&self) -> bool {
        self.state == SessionState::Started
    }

    /// Whether the session is still attached to its host.
    pub fn is_bound(&self) -> bool {
        self.handle.is_bound()
    }

    /// `Created → Started`; no-op in any other state.
    pub fn mark_started(&mut self) {
        if self.state == SessionState::Created {
            self.state = SessionState::Started;
            info!(session = %self.id(), "ui session started");
        }
    }

    /// Register a shutdown listener; see [`SessionHandle::add_listener`].
    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) -> Result<(), SessionError> {
        self.handle.add_listener(listener)
    }

    /// Read an attribute; fails after shutdown.
    pub fn attribute(&self, name: &str) -> Result<Option<Value>, SessionError> {
        self.handle.attribute(name)
    }

    /// Write an attribute; fails after shutdown.
    pub fn set_attribute(
        &self,
        name: impl Into<String>,
        value: Value,
    ) -> Result<Option<Value>, SessionError> {
        self.handle.set_attribute(name, value)
    }

    /// The session's object graph.
    pub fn graph(&self) -> &ObjectGraph {
        &self.graph
    }

    /// Mutable object graph.
    pub fn graph_mut(&mut self) -> &mut ObjectGraph {
        &mut self.graph
    }

    /// Install the application driving this session.
    pub fn set_application(&mut self, application: Box<dyn Application>) {
        self.application = Some(application);
    }

    /// Whether an application was installed.
    pub fn has_application(&self) -> bool {
        self.application.is_some()
    }

    /// Graph and application borrowed together for one life-cycle run.
    pub fn graph_and_application(
        &mut self,
    ) -> (&mut ObjectGraph, Option<&mut (dyn Application + 'static)>) {
        (&mut self.graph, self.application.as_deref_mut())
    }

    /// Counter state.
    pub fn sync(&self) -> &SyncState {
        &self.sync
    }

    /// Mutable counter state.
    pub fn sync_mut(&mut self) -> &mut SyncState {
        &mut self.sync
    }

    /// Fire listeners in registration order, drop the UI, and unbind.
    ///
    /// Idempotent: a second call does nothing.
    pub fn shutdown(&mut self) {
        if self.state == SessionState::Shutdown {
            return;
        }
        self.state = SessionState::Shutdown;
        for listener in self.handle.take_listeners() {
            listener.before_destroy(&self.handle);
        }
        self.application = None;
        self.graph = ObjectGraph::new();
        self.handle.unbind();
        info!(session = %self.id(), "ui session shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_protocol::json;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
        saw_bound: AtomicBool,
    }

    impl SessionListener for Counting {
        fn before_destroy(&self, session: &SessionHandle) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.saw_bound.store(session.is_bound(), Ordering::SeqCst);
        }
    }

    #[test]
    fn lifecycle_states() {
        let mut session = UiSession::new("s1");
        assert_eq!(session.state(), SessionState::Created);
        session.mark_started();
        assert!(session.is_started());
        session.shutdown();
        assert_eq!(session.state(), SessionState::Shutdown);
        session.mark_started();
        assert_eq!(session.state(), SessionState::Shutdown);
    }

    #[test]
    fn shutdown_fires_listeners_once_while_still_bound() {
        let listener = Arc::new(Counting::default());
        let mut session = UiSession::new("s1");
        session.add_listener(listener.clone()).unwrap();
        session.shutdown();
        session.shutdown();
        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
        assert!(listener.saw_bound.load(Ordering::SeqCst));
        assert!(!session.is_bound());
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        struct Ordered(Arc<Mutex<Vec<u8>>>, u8);
        impl SessionListener for Ordered {
            fn before_destroy(&self, _: &SessionHandle) {
                self.0.lock().unwrap().push(self.1);
            }
        }
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut session = UiSession::new("s1");
        for n in 1..=3 {
            session.add_listener(Arc::new(Ordered(log.clone(), n))).unwrap();
        }
        session.shutdown();
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn listeners_registered_through_a_handle_fire_on_shutdown() {
        let listener = Arc::new(Counting::default());
        let mut session = UiSession::new("s1");
        let handle = session.handle();
        handle.add_listener(listener.clone()).unwrap();
        session.shutdown();
        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
        assert!(listener.saw_bound.load(Ordering::SeqCst));
        assert_eq!(
            handle.add_listener(listener.clone()),
            Err(SessionError::Unbound("s1".into()))
        );
    }

    #[test]
    fn attribute_access_fails_after_shutdown() {
        let mut session = UiSession::new("s1");
        let handle = session.handle();
        session.set_attribute("user", json!("ada")).unwrap();
        assert_eq!(handle.attribute("user").unwrap(), Some(json!("ada")));

        session.shutdown();
        assert_eq!(
            handle.attribute("user"),
            Err(SessionError::Unbound("s1".into()))
        );
        assert!(handle.set_attribute("user", json!("bob")).is_err());
        assert!(handle.remove_attribute("user").is_err());
    }
}
