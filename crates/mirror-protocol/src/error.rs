// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decode failures for the JSON wire form.

use thiserror::Error;

/// Malformed wire input. Never retried; the offending fragment is kept in the message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The `head` member is missing or not an object.
    #[error("Failed to read head from JSON message: {fragment}")]
    Head {
        /// The JSON value that was inspected.
        fragment: String,
    },
    /// The `operations` member is missing, not an array, or holds a bad element.
    #[error("Failed to read operations from JSON message")]
    Operations {
        /// Underlying reason (missing member or a single operation failing to decode).
        #[source]
        cause: Box<ProtocolError>,
    },
    /// A single operation array has an unknown tag or wrong arity/shape.
    #[error("Could not read operation: {fragment}")]
    Operation {
        /// The offending operation array, re-serialised.
        fragment: String,
    },
    /// A member that must exist is absent or has the wrong JSON type.
    #[error("Missing or malformed member: {0}")]
    Member(&'static str),
    /// A head member that must be an integer is not.
    #[error("Not a number: {0}")]
    NotANumber(String),
    /// A required argument was absent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The payload is not JSON at all.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
