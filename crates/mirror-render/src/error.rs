// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for graph mutation and rendering.

use thiserror::Error;

/// Object-graph lookups and structural mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// No live object carries this id.
    #[error("unknown object: {0}")]
    UnknownObject(String),
    /// The requested parent does not exist (or was disposed).
    #[error("unknown parent: {0}")]
    UnknownParent(String),
}

/// Failures inside a life-cycle execution. These always propagate to the caller.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Graph lookup failed while applying or rendering.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// No renderer is registered for the object's widget type.
    #[error("no renderer registered for widget type {0}")]
    UnknownWidgetType(String),
    /// A render rule rejected the current object state.
    #[error("render rule failed for {target}: {reason}")]
    Rule {
        /// Object being rendered.
        target: String,
        /// What went wrong.
        reason: String,
    },
    /// Application code failed while building the UI or handling an event.
    #[error(transparent)]
    Application(#[from] anyhow::Error),
}
