// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Server-side object graph mirrored to the client.
//!
//! Objects live in creation order, which is also parent-before-child order
//! because a parent must exist before a child can name it.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::GraphError;
use crate::events::EventTable;

/// Object identifier as it appears in operation targets.
pub type ObjectId = String;

/// One stateful server-side widget.
#[derive(Debug, Clone)]
pub struct RemoteObject {
    id: ObjectId,
    widget_type: String,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    style: Vec<String>,
    properties: IndexMap<String, Value>,
    events: EventTable,
    redraw: bool,
    initialized: bool,
}

impl RemoteObject {
    /// Stable identifier used as the operation target.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Server-side widget type, the renderer registry key.
    pub fn widget_type(&self) -> &str {
        &self.widget_type
    }

    /// Parent id, `None` for top-level objects.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Live children in creation order.
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// Creation-time style flags.
    pub fn style(&self) -> &[String] {
        &self.style
    }

    /// Whether the object was created with `flag`.
    pub fn has_style(&self, flag: &str) -> bool {
        self.style.iter().any(|s| s == flag)
    }

    /// Current value of a property, if it was ever written.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Write a property value.
    pub fn set_property(&mut self, name: impl Into<String>, value: Value) {
        self.properties.insert(name.into(), value);
    }

    /// Listener registrations.
    pub fn events(&self) -> &EventTable {
        &self.events
    }

    /// Mutable listener registrations.
    pub fn events_mut(&mut self) -> &mut EventTable {
        &mut self.events
    }

    /// Request a client-side repaint in the next render.
    pub fn redraw(&mut self) {
        self.redraw = true;
    }

    /// Whether a repaint is pending.
    pub fn needs_redraw(&self) -> bool {
        self.redraw
    }

    /// Whether the client already knows this object.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// A disposed object the client still holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposedObject {
    /// Former id.
    pub id: ObjectId,
    /// Former widget type, used to pick the renderer for `destroy`.
    pub widget_type: String,
}

/// Every live object of one UI session plus pending disposals.
#[derive(Debug, Default)]
pub struct ObjectGraph {
    objects: IndexMap<ObjectId, RemoteObject>,
    disposed: Vec<DisposedObject>,
    next_id: u64,
}

impl ObjectGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an object under `parent` and return its id.
    ///
    /// # Errors
    /// [`GraphError::UnknownParent`] when `parent` is not a live object.
    pub fn create(
        &mut self,
        widget_type: &str,
        parent: Option<&str>,
        style: &[&str],
    ) -> Result<ObjectId, GraphError> {
        if let Some(parent) = parent {
            if !self.objects.contains_key(parent) {
                return Err(GraphError::UnknownParent(parent.to_owned()));
            }
        }
        self.next_id += 1;
        let id = format!("w{}", self.next_id);
        if let Some(parent) = parent.and_then(|p| self.objects.get_mut(p)) {
            parent.children.push(id.clone());
        }
        self.objects.insert(
            id.clone(),
            RemoteObject {
                id: id.clone(),
                widget_type: widget_type.to_owned(),
                parent: parent.map(str::to_owned),
                children: Vec::new(),
                style: style.iter().map(|s| (*s).to_owned()).collect(),
                properties: IndexMap::new(),
                events: EventTable::default(),
                redraw: false,
                initialized: false,
            },
        );
        Ok(id)
    }

    /// Live object by id.
    pub fn get(&self, id: &str) -> Option<&RemoteObject> {
        self.objects.get(id)
    }

    /// Mutable live object by id.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut RemoteObject> {
        self.objects.get_mut(id)
    }

    /// Live object by id, or [`GraphError::UnknownObject`].
    pub fn object(&self, id: &str) -> Result<&RemoteObject, GraphError> {
        self.get(id)
            .ok_or_else(|| GraphError::UnknownObject(id.to_owned()))
    }

    /// Mutable live object by id, or [`GraphError::UnknownObject`].
    pub fn object_mut(&mut self, id: &str) -> Result<&mut RemoteObject, GraphError> {
        self.get_mut(id)
            .ok_or_else(|| GraphError::UnknownObject(id.to_owned()))
    }

    /// Dispose `id` and its whole subtree.
    ///
    /// Objects the client never saw vanish silently; the others are queued
    /// for `destroy`, children before their parent.
    pub fn dispose(&mut self, id: &str) -> Result<(), GraphError> {
        let parent = self.object(id)?.parent.clone();
        if let Some(parent) = parent.and_then(|p| self.objects.get_mut(&p)) {
            parent.children.retain(|c| c != id);
        }
        let mut order = Vec::new();
        self.collect_post_order(id, &mut order);
        for victim in order {
            if let Some(object) = self.objects.shift_remove(&victim) {
                if object.initialized {
                    self.disposed.push(DisposedObject {
                        id: object.id,
                        widget_type: object.widget_type,
                    });
                }
            }
        }
        Ok(())
    }

    fn collect_post_order(&self, id: &str, out: &mut Vec<ObjectId>) {
        if let Some(object) = self.objects.get(id) {
            for child in &object.children {
                self.collect_post_order(child, out);
            }
            out.push(object.id.clone());
        }
    }

    /// Drain the disposals queued since the last render.
    pub fn take_disposed(&mut self) -> Vec<DisposedObject> {
        std::mem::take(&mut self.disposed)
    }

    /// Live ids in creation order.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.keys().cloned().collect()
    }

    /// Live objects in creation order.
    pub fn objects(&self) -> impl Iterator<Item = &RemoteObject> {
        self.objects.values()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no object is alive.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Mark every live object as known to the client and clear redraw requests.
    pub fn finish_render(&mut self) {
        for object in self.objects.values_mut() {
            object.initialized = true;
            object.redraw = false;
        }
    }
}
