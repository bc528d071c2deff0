// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Message handlers run under the session lock.

use std::sync::Arc;

use anyhow::anyhow;
use mirror_protocol::Message;
use mirror_render::{Application, LifeCycle, RenderOptions, RendererRegistry};

use crate::session::{SessionHandle, UiSession};

/// Processes one admitted request for a UI session.
///
/// Runs with the session lock held. Any error is fatal to the session.
pub trait MessageHandler: Send + Sync {
    /// Produce the response operations for `request`. The head is filled in
    /// by the synchronizer.
    fn handle(&self, session: &mut UiSession, request: &Message) -> anyhow::Result<Message>;
}

/// Builds the application for a new UI session.
///
/// The handle stays valid for the session's lifetime; factories keep a clone
/// to read attributes or to register shutdown listeners.
pub type ApplicationFactory = Arc<dyn Fn(&SessionHandle) -> Box<dyn Application> + Send + Sync>;

/// Runs the preserve/apply/render life cycle against the session's graph.
pub struct LifeCycleHandler {
    registry: RendererRegistry,
    options: RenderOptions,
    factory: ApplicationFactory,
}

impl std::fmt::Debug for LifeCycleHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifeCycleHandler")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl LifeCycleHandler {
    /// Handler that starts one application per UI session via `factory`.
    pub fn new(
        registry: RendererRegistry,
        options: RenderOptions,
        factory: impl Fn(&SessionHandle) -> Box<dyn Application> + Send + Sync + 'static,
    ) -> Self {
        Self {
            registry,
            options,
            factory: Arc::new(factory),
        }
    }
}

impl MessageHandler for LifeCycleHandler {
    fn handle(&self, session: &mut UiSession, request: &Message) -> anyhow::Result<Message> {
        let start = !session.has_application();
        if start {
            let application = (self.factory)(&session.handle());
            session.set_application(application);
        }
        let (graph, application) = session.graph_and_application();
        let application = application.ok_or_else(|| anyhow!("ui session has no application"))?;
        let response = LifeCycle::new(&self.registry, &self.options).execute(
            graph,
            application,
            request,
            start,
        )?;
        Ok(response)
    }
}
