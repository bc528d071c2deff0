// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-widget-kind renderers and the registry that selects them.

use std::collections::HashMap;
use std::sync::Arc;

use mirror_protocol::{Properties, Value};
use serde_json::json;

use crate::combo::ComboRenderer;
use crate::error::RenderError;
use crate::event;
use crate::graph::RemoteObject;
use crate::lifecycle::RenderOptions;
use crate::snapshot::Snapshot;
use crate::writer::OperationWriter;

/// A tracked property and the value the client assumes before it is told otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    /// Property name, used both in the snapshot and on the wire.
    pub name: &'static str,
    /// Client-side default; `None` means "always render on creation".
    pub default: Option<Value>,
    /// Whether client `set` operations may write it.
    pub writable: bool,
}

impl PropertySpec {
    /// Server-owned property with a client default.
    pub fn new(name: &'static str, default: Value) -> Self {
        Self {
            name,
            default: Some(default),
            writable: false,
        }
    }

    /// Server-owned property without a client default.
    pub fn required(name: &'static str) -> Self {
        Self {
            name,
            default: None,
            writable: false,
        }
    }

    /// Allow client writes.
    pub fn writable(mut self) -> Self {
        self.writable = true;
        self
    }
}

/// Properties shared by every control.
pub fn control_properties() -> Vec<PropertySpec> {
    vec![
        PropertySpec::new("bounds", json!([0, 0, 0, 0])).writable(),
        PropertySpec::new("visibility", json!(true)),
        PropertySpec::new("enabled", json!(true)),
        PropertySpec::new("toolTip", Value::Null),
        PropertySpec::new("foreground", Value::Null),
        PropertySpec::new("background", Value::Null),
        PropertySpec::new("font", Value::Null),
        PropertySpec::new("customVariant", Value::Null),
    ]
}

/// Snapshot key under which a listener flag is preserved.
pub(crate) fn listener_key(kind: &str) -> String {
    format!("listener:{kind}")
}

/// Read-only view handed to renderers during the render phase.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    object: &'a RemoteObject,
    snapshot: Option<&'a Snapshot>,
    options: &'a RenderOptions,
}

impl<'a> RenderContext<'a> {
    /// Context for `object` with its preserved values (if any).
    pub fn new(
        object: &'a RemoteObject,
        snapshot: Option<&'a Snapshot>,
        options: &'a RenderOptions,
    ) -> Self {
        Self {
            object,
            snapshot,
            options,
        }
    }

    /// Object being rendered.
    pub fn object(&self) -> &'a RemoteObject {
        self.object
    }

    /// Active render options.
    pub fn options(&self) -> &'a RenderOptions {
        self.options
    }

    /// Whether `current` must be sent to the client.
    ///
    /// Objects the client already knows compare against the preserved value.
    /// Fresh objects, and properties that were never preserved, compare
    /// against `default`; without a default they always count as changed.
    pub fn has_changed(&self, name: &str, current: &Value, default: Option<&Value>) -> bool {
        let preserved = if self.object.is_initialized() {
            self.snapshot.and_then(|s| s.get(name))
        } else {
            None
        };
        match preserved.or(default) {
            Some(baseline) => baseline != current,
            None => true,
        }
    }
}

/// Renders one widget kind: preserve, read client data, emit operations.
///
/// Every method has a default that drives [`Renderer::properties`] and
/// [`Renderer::listeners`]; widget kinds with compound rules override the
/// phases they need.
pub trait Renderer: Send + Sync {
    /// Type name the client instantiates.
    fn client_type(&self) -> &str;

    /// Tracked properties.
    fn properties(&self) -> &[PropertySpec];

    /// Listener kinds rendered as `listen` flags.
    fn listeners(&self) -> &[&'static str] {
        &[]
    }

    /// Current value of a tracked property, falling back to its default.
    fn value(&self, object: &RemoteObject, name: &str) -> Value {
        object
            .property(name)
            .cloned()
            .or_else(|| {
                self.properties()
                    .iter()
                    .find(|spec| spec.name == name)
                    .and_then(|spec| spec.default.clone())
            })
            .unwrap_or(Value::Null)
    }

    /// Whether the client must report events of `kind`.
    fn listener_state(&self, object: &RemoteObject, kind: &str) -> bool {
        object.events().hooks(kind)
    }

    /// Snapshot every tracked property and listener flag.
    fn preserve(&self, object: &RemoteObject, snapshot: &mut Snapshot) {
        for spec in self.properties() {
            snapshot.preserve(spec.name, self.value(object, spec.name));
        }
        for kind in self.listeners() {
            snapshot.preserve(
                listener_key(kind),
                Value::Bool(self.listener_state(object, kind)),
            );
        }
    }

    /// Apply client-written values and record them as already known to the client.
    ///
    /// Unknown or read-only property names are ignored.
    fn read_data(
        &self,
        object: &mut RemoteObject,
        properties: &Properties,
        snapshot: &mut Snapshot,
    ) -> Result<(), RenderError> {
        for (name, value) in properties {
            let writable = self
                .properties()
                .iter()
                .any(|spec| spec.writable && spec.name == name);
            if writable {
                object.set_property(name.clone(), value.clone());
                snapshot.preserve(name.clone(), value.clone());
            }
        }
        Ok(())
    }

    /// Emit `create` plus the creation-time properties.
    fn render_initialization(
        &self,
        ctx: &RenderContext<'_>,
        writer: &mut OperationWriter<'_>,
    ) -> Result<(), RenderError> {
        let object = ctx.object();
        writer.create(object.id(), self.client_type());
        if let Some(parent) = object.parent() {
            writer.set(object.id(), "parent", json!(parent));
        }
        if !object.style().is_empty() {
            writer.set(object.id(), "style", json!(object.style()));
        }
        Ok(())
    }

    /// Emit `set`/`listen` for everything that changed this cycle.
    fn render_changes(
        &self,
        ctx: &RenderContext<'_>,
        writer: &mut OperationWriter<'_>,
    ) -> Result<(), RenderError> {
        render_properties(self, ctx, writer, self.properties());
        render_listeners(self, ctx, writer, self.listeners());
        Ok(())
    }

    /// Ask the client to repaint.
    fn render_redraw(&self, id: &str, writer: &mut OperationWriter<'_>) -> Result<(), RenderError> {
        writer.call(id, "redraw", Properties::new());
        Ok(())
    }

    /// Emit `destroy` for a disposed object.
    fn render_dispose(
        &self,
        id: &str,
        writer: &mut OperationWriter<'_>,
    ) -> Result<(), RenderError> {
        writer.destroy(id);
        Ok(())
    }
}

/// Emit a `set` for each property in `specs` that changed.
pub(crate) fn render_properties<R: Renderer + ?Sized>(
    renderer: &R,
    ctx: &RenderContext<'_>,
    writer: &mut OperationWriter<'_>,
    specs: &[PropertySpec],
) {
    let object = ctx.object();
    for spec in specs {
        let current = renderer.value(object, spec.name);
        if ctx.has_changed(spec.name, &current, spec.default.as_ref()) {
            writer.set(object.id(), spec.name, current);
        }
    }
}

/// Emit a `listen` flag for each kind whose registration state changed.
pub(crate) fn render_listeners<R: Renderer + ?Sized>(
    renderer: &R,
    ctx: &RenderContext<'_>,
    writer: &mut OperationWriter<'_>,
    kinds: &[&'static str],
) {
    let object = ctx.object();
    let default = Value::Bool(false);
    for kind in kinds {
        let hooked = renderer.listener_state(object, kind);
        if ctx.has_changed(&listener_key(kind), &Value::Bool(hooked), Some(&default)) {
            writer.listen(object.id(), kind, hooked);
        }
    }
}

/// Table-driven renderer for widget kinds without compound rules.
#[derive(Debug, Clone)]
pub struct WidgetRenderer {
    client_type: String,
    properties: Vec<PropertySpec>,
    listeners: Vec<&'static str>,
}

impl WidgetRenderer {
    /// Renderer for `client_type` tracking the common control properties.
    pub fn new(client_type: impl Into<String>) -> Self {
        Self {
            client_type: client_type.into(),
            properties: control_properties(),
            listeners: vec![event::CONTROL],
        }
    }

    /// Track an additional property.
    pub fn with_property(mut self, spec: PropertySpec) -> Self {
        self.properties.push(spec);
        self
    }

    /// Render an additional listener kind.
    pub fn with_listener(mut self, kind: &'static str) -> Self {
        self.listeners.push(kind);
        self
    }
}

impl Renderer for WidgetRenderer {
    fn client_type(&self) -> &str {
        &self.client_type
    }

    fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }

    fn listeners(&self) -> &[&'static str] {
        &self.listeners
    }
}

/// Maps server-side widget types to their renderer.
#[derive(Clone, Default)]
pub struct RendererRegistry {
    renderers: HashMap<String, Arc<dyn Renderer>>,
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.renderers.keys().collect();
        kinds.sort();
        f.debug_struct("RendererRegistry")
            .field("widget_types", &kinds)
            .finish()
    }
}

impl RendererRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the stock widget kinds: `Shell`, `Composite`, `Button`,
    /// `Label`, `Text` and `Combo`.
    pub fn with_defaults() -> Self {
        let text = || PropertySpec::new("text", json!(""));
        let mut registry = Self::new();
        registry.register(
            "Shell",
            WidgetRenderer::new("rwt.widgets.Shell")
                .with_property(text())
                .with_property(PropertySpec::new("active", json!(false)))
                .with_listener(event::ACTIVATE),
        );
        registry.register("Composite", WidgetRenderer::new("rwt.widgets.Composite"));
        registry.register(
            "Button",
            WidgetRenderer::new("rwt.widgets.Button")
                .with_property(text())
                .with_property(PropertySpec::new("selection", json!(false)).writable())
                .with_listener(event::SELECTION)
                .with_listener(event::FOCUS),
        );
        registry.register(
            "Label",
            WidgetRenderer::new("rwt.widgets.Label").with_property(text()),
        );
        registry.register(
            "Text",
            WidgetRenderer::new("rwt.widgets.Text")
                .with_property(text().writable())
                .with_property(PropertySpec::new("editable", json!(true)))
                .with_listener(event::MODIFY)
                .with_listener(event::VERIFY)
                .with_listener(event::FOCUS),
        );
        registry.register("Combo", ComboRenderer::new());
        registry
    }

    /// Register (or replace) the renderer for `widget_type`.
    pub fn register(&mut self, widget_type: impl Into<String>, renderer: impl Renderer + 'static) {
        self.renderers.insert(widget_type.into(), Arc::new(renderer));
    }

    /// Renderer for `widget_type`.
    ///
    /// # Errors
    /// [`RenderError::UnknownWidgetType`] when nothing is registered for it.
    pub fn get(&self, widget_type: &str) -> Result<&dyn Renderer, RenderError> {
        self.renderers
            .get(widget_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| RenderError::UnknownWidgetType(widget_type.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ObjectGraph;
    use mirror_protocol::{Message, Operation};

    fn render(graph: &ObjectGraph, id: &str, snapshot: Option<&Snapshot>) -> Message {
        let registry = RendererRegistry::with_defaults();
        let options = RenderOptions::default();
        let object = graph.object(id).unwrap();
        let renderer = registry.get(object.widget_type()).unwrap();
        let mut message = Message::new();
        let mut writer = OperationWriter::new(&mut message);
        let ctx = RenderContext::new(object, snapshot, &options);
        if !object.is_initialized() {
            renderer.render_initialization(&ctx, &mut writer).unwrap();
        }
        renderer.render_changes(&ctx, &mut writer).unwrap();
        message
    }

    fn preserve(graph: &ObjectGraph, id: &str) -> Snapshot {
        let registry = RendererRegistry::with_defaults();
        let object = graph.object(id).unwrap();
        let mut snapshot = Snapshot::default();
        registry
            .get(object.widget_type())
            .unwrap()
            .preserve(object, &mut snapshot);
        snapshot
    }

    fn set_keys(message: &Message) -> Vec<String> {
        message
            .operations()
            .iter()
            .filter_map(Operation::properties)
            .flat_map(|p| p.keys().cloned())
            .collect()
    }

    #[test]
    fn initialization_emits_create_parent_and_style() {
        let mut graph = ObjectGraph::new();
        let shell = graph.create("Shell", None, &[]).unwrap();
        let button = graph.create("Button", Some(&shell), &["PUSH"]).unwrap();

        let message = render(&graph, &button, None);
        assert_eq!(
            message.operations()[0],
            Operation::Create {
                target: button.clone(),
                object_type: "rwt.widgets.Button".into()
            }
        );
        assert_eq!(set_keys(&message), vec!["parent", "style"]);
    }

    #[test]
    fn unchanged_visibility_is_not_rendered() {
        let mut graph = ObjectGraph::new();
        let shell = graph.create("Shell", None, &[]).unwrap();
        let button = graph.create("Button", Some(&shell), &[]).unwrap();
        assert!(!set_keys(&render(&graph, &button, None)).contains(&"visibility".to_owned()));

        graph.finish_render();
        let snapshot = preserve(&graph, &button);
        assert!(render(&graph, &button, Some(&snapshot))
            .operations()
            .is_empty());

        let snapshot = preserve(&graph, &button);
        graph
            .object_mut(&button)
            .unwrap()
            .set_property("visibility", json!(false));
        let message = render(&graph, &button, Some(&snapshot));
        assert_eq!(
            message.operations(),
            &[Operation::set(button.clone(), "visibility", json!(false))]
        );
    }

    #[test]
    fn focus_listener_only_for_focusable_controls() {
        let mut graph = ObjectGraph::new();
        let shell = graph.create("Shell", None, &[]).unwrap();
        let label = graph.create("Label", Some(&shell), &[]).unwrap();
        let button = graph.create("Button", Some(&shell), &[]).unwrap();
        graph
            .object_mut(&label)
            .unwrap()
            .events_mut()
            .hook(event::FOCUS);
        graph
            .object_mut(&button)
            .unwrap()
            .events_mut()
            .hook(event::FOCUS);

        let listens = |message: &Message| {
            message
                .operations()
                .iter()
                .filter(|op| matches!(op, Operation::Listen { .. }))
                .count()
        };
        assert_eq!(listens(&render(&graph, &button, None)), 1);
        assert_eq!(listens(&render(&graph, &label, None)), 0);
    }

    #[test]
    fn property_without_default_renders_on_creation() {
        let mut registry = RendererRegistry::new();
        registry.register(
            "Canvas",
            WidgetRenderer::new("rwt.widgets.Canvas").with_property(PropertySpec::required("gc")),
        );
        let mut graph = ObjectGraph::new();
        let canvas = graph.create("Canvas", None, &[]).unwrap();
        let object = graph.object(&canvas).unwrap();
        let options = RenderOptions::default();
        let ctx = RenderContext::new(object, None, &options);
        assert!(ctx.has_changed("gc", &Value::Null, None));
        assert!(!ctx.has_changed("visibility", &json!(true), Some(&json!(true))));
    }

    #[test]
    fn unknown_widget_type_is_an_error() {
        let registry = RendererRegistry::with_defaults();
        assert!(matches!(
            registry.get("Spinner"),
            Err(RenderError::UnknownWidgetType(kind)) if kind == "Spinner"
        ));
    }
}
