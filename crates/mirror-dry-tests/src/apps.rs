// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Application doubles.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::bail;
use mirror_render::{Application, Event, MethodCall, ObjectGraph};

type StartFn = Box<dyn FnMut(&mut ObjectGraph) -> anyhow::Result<()> + Send>;
type EventFn = Box<dyn FnMut(&mut ObjectGraph, &Event) -> anyhow::Result<()> + Send>;
type CallFn = Box<dyn FnMut(&mut ObjectGraph, &MethodCall) -> anyhow::Result<()> + Send>;

/// Application assembled from closures; records every delivered event.
///
/// # Example
///
/// ```
/// use mirror_dry_tests::ScriptedApp;
///
/// let app = ScriptedApp::new(|graph| {
///     graph.create("Shell", None, &[])?;
///     Ok(())
/// });
/// assert!(app.events().is_empty());
/// ```
pub struct ScriptedApp {
    start: StartFn,
    on_event: EventFn,
    on_call: CallFn,
    events: Arc<Mutex<Vec<Event>>>,
}

impl ScriptedApp {
    /// App whose [`Application::start`] runs `start`.
    pub fn new(
        start: impl FnMut(&mut ObjectGraph) -> anyhow::Result<()> + Send + 'static,
    ) -> Self {
        Self {
            start: Box::new(start),
            on_event: Box::new(|_, _| Ok(())),
            on_call: Box::new(|_, _| Ok(())),
            events: Arc::default(),
        }
    }

    /// Run `f` for each delivered event.
    pub fn on_event(
        mut self,
        f: impl FnMut(&mut ObjectGraph, &Event) -> anyhow::Result<()> + Send + 'static,
    ) -> Self {
        self.on_event = Box::new(f);
        self
    }

    /// Run `f` for each delivered call.
    pub fn on_call(
        mut self,
        f: impl FnMut(&mut ObjectGraph, &MethodCall) -> anyhow::Result<()> + Send + 'static,
    ) -> Self {
        self.on_call = Box::new(f);
        self
    }

    /// Shared log of delivered events; stays readable after the app is boxed.
    pub fn event_log(&self) -> Arc<Mutex<Vec<Event>>> {
        self.events.clone()
    }

    /// Events delivered so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Application for ScriptedApp {
    fn start(&mut self, graph: &mut ObjectGraph) -> anyhow::Result<()> {
        (self.start)(graph)
    }

    fn handle_event(&mut self, graph: &mut ObjectGraph, event: &Event) -> anyhow::Result<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        (self.on_event)(graph, event)
    }

    fn handle_call(&mut self, graph: &mut ObjectGraph, call: &MethodCall) -> anyhow::Result<()> {
        (self.on_call)(graph, call)
    }
}

/// Application whose start always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingApp {
    /// Error text.
    pub reason: String,
}

impl FailingApp {
    /// Fails with `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Application for FailingApp {
    fn start(&mut self, _graph: &mut ObjectGraph) -> anyhow::Result<()> {
        bail!("{}", self.reason)
    }
}
