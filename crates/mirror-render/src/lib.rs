// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Server-side object graph and the preserve/diff/render life cycle.
//!
//! One life-cycle execution runs three phases over an [`ObjectGraph`]:
//!
//! 1. **preserve**: every already-rendered object snapshots its tracked
//!    properties into a [`PreservedState`] owned by the execution;
//! 2. **apply**: client `set` operations are read back into the graph, then
//!    `call`/`notify` operations are dispatched to the [`Application`];
//! 3. **render**: each object's [`Renderer`] compares current values against
//!    the snapshot (or its declared defaults for fresh objects) and appends
//!    the minimal operations to the outgoing message.

pub mod combo;
mod error;
mod events;
mod graph;
mod lifecycle;
mod renderer;
mod snapshot;
mod writer;

pub use error::{GraphError, RenderError};
pub use events::{EventTable, ListenerId};
pub use graph::{DisposedObject, ObjectGraph, ObjectId, RemoteObject};
pub use lifecycle::{Application, Event, LifeCycle, MethodCall, RenderOptions};
pub use renderer::{
    control_properties, PropertySpec, RenderContext, Renderer, RendererRegistry, WidgetRenderer,
};
pub use snapshot::{PreservedState, Snapshot};
pub use writer::OperationWriter;

/// Well-known event kinds used by the stock renderers.
pub mod event {
    /// Widget-specific default selection.
    pub const SELECTION: &str = "Selection";
    /// Text changed.
    pub const MODIFY: &str = "Modify";
    /// Text about to change; handlers may veto.
    pub const VERIFY: &str = "Verify";
    /// Keyboard focus gained/lost.
    pub const FOCUS: &str = "Focus";
    /// Shell or control activated.
    pub const ACTIVATE: &str = "Activate";
    /// Control moved or resized.
    pub const CONTROL: &str = "Control";
}
