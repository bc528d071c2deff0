// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One preserve → apply → render execution over an object graph.

use mirror_protocol::{Message, Operation, Properties};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RenderError;
use crate::graph::ObjectGraph;
use crate::renderer::{RenderContext, RendererRegistry};
use crate::snapshot::PreservedState;
use crate::writer::OperationWriter;

/// Client-reported event delivered to the application.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Object the event originated from.
    pub target: String,
    /// Event kind, e.g. `"Selection"`.
    pub kind: String,
    /// Event payload.
    pub properties: Properties,
}

/// Client-requested method invocation delivered to the application.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Receiving object.
    pub target: String,
    /// Method name.
    pub method: String,
    /// Arguments.
    pub parameters: Properties,
}

/// Host application code driving one UI session.
pub trait Application: Send {
    /// Build the initial UI. Runs once, in the first cycle of a session.
    fn start(&mut self, graph: &mut ObjectGraph) -> anyhow::Result<()>;

    /// React to an event for which the target has a registered listener.
    fn handle_event(&mut self, graph: &mut ObjectGraph, event: &Event) -> anyhow::Result<()> {
        let _ = (graph, event);
        Ok(())
    }

    /// React to a client `call` operation.
    fn handle_call(&mut self, graph: &mut ObjectGraph, call: &MethodCall) -> anyhow::Result<()> {
        let _ = (graph, call);
        Ok(())
    }
}

/// Tunables of the render phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Skip text-selection updates for invisible widgets.
    pub gate_text_selection_on_visibility: bool,
}

/// Executes life cycles with a fixed renderer registry.
#[derive(Debug, Clone, Copy)]
pub struct LifeCycle<'r> {
    registry: &'r RendererRegistry,
    options: &'r RenderOptions,
}

impl<'r> LifeCycle<'r> {
    /// Life cycle rendering through `registry`.
    pub fn new(registry: &'r RendererRegistry, options: &'r RenderOptions) -> Self {
        Self { registry, options }
    }

    /// Run one cycle for `request` and return the operations to send back.
    ///
    /// `start` runs [`Application::start`] after preserving, so the initial
    /// UI renders against declared defaults. The returned message has an
    /// empty head; the caller owns head conventions.
    ///
    /// # Errors
    /// Any renderer or application failure aborts the cycle and is returned
    /// unchanged. The graph may be left partially updated.
    pub fn execute(
        &self,
        graph: &mut ObjectGraph,
        app: &mut dyn Application,
        request: &Message,
        start: bool,
    ) -> Result<Message, RenderError> {
        let mut preserved = self.preserve(graph)?;
        if start {
            app.start(graph)?;
        }
        self.apply_sets(graph, request, &mut preserved)?;
        self.dispatch(graph, app, request)?;
        let response = self.render(graph, &preserved)?;
        debug!(
            preserved = preserved.len(),
            operations = response.operations().len(),
            "life cycle complete"
        );
        Ok(response)
    }

    fn preserve(&self, graph: &ObjectGraph) -> Result<PreservedState, RenderError> {
        let mut preserved = PreservedState::default();
        for object in graph.objects().filter(|o| o.is_initialized()) {
            let renderer = self.registry.get(object.widget_type())?;
            renderer.preserve(object, preserved.entry(object.id()));
        }
        Ok(preserved)
    }

    fn apply_sets(
        &self,
        graph: &mut ObjectGraph,
        request: &Message,
        preserved: &mut PreservedState,
    ) -> Result<(), RenderError> {
        for op in request.operations() {
            let Operation::Set { target, properties } = op else {
                continue;
            };
            let Some(object) = graph.get_mut(target) else {
                debug!(object = %target, "set for unknown object ignored");
                continue;
            };
            let renderer = self.registry.get(object.widget_type())?;
            renderer.read_data(object, properties, preserved.entry(target))?;
        }
        Ok(())
    }

    fn dispatch(
        &self,
        graph: &mut ObjectGraph,
        app: &mut dyn Application,
        request: &Message,
    ) -> Result<(), RenderError> {
        for op in request.operations() {
            match op {
                Operation::Notify {
                    target,
                    event_type,
                    properties,
                } => {
                    let hooked = graph
                        .get(target)
                        .is_some_and(|o| o.events().hooks(event_type));
                    if !hooked {
                        debug!(
                            object = %target,
                            kind = %event_type,
                            "event without listener dropped"
                        );
                        continue;
                    }
                    app.handle_event(
                        graph,
                        &Event {
                            target: target.clone(),
                            kind: event_type.clone(),
                            properties: properties.clone(),
                        },
                    )?;
                }
                Operation::Call {
                    target,
                    method,
                    parameters,
                } => {
                    app.handle_call(
                        graph,
                        &MethodCall {
                            target: target.clone(),
                            method: method.clone(),
                            parameters: parameters.clone(),
                        },
                    )?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn render(
        &self,
        graph: &mut ObjectGraph,
        preserved: &PreservedState,
    ) -> Result<Message, RenderError> {
        let mut response = Message::new();
        let mut writer = OperationWriter::new(&mut response);
        for disposed in graph.take_disposed() {
            self.registry
                .get(&disposed.widget_type)?
                .render_dispose(&disposed.id, &mut writer)?;
        }
        for object in graph.objects() {
            let renderer = self.registry.get(object.widget_type())?;
            let ctx = RenderContext::new(object, preserved.get(object.id()), self.options);
            if !object.is_initialized() {
                renderer.render_initialization(&ctx, &mut writer)?;
            }
            renderer.render_changes(&ctx, &mut writer)?;
            if object.needs_redraw() {
                renderer.render_redraw(object.id(), &mut writer)?;
            }
        }
        graph.finish_render();
        Ok(response)
    }
}
