// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Operation model: one atomic client-visible mutation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ProtocolError, Properties};

/// Event-kind → enabled flags carried by a `listen` operation.
pub type Listeners = IndexMap<String, bool>;

/// Operation tag as it appears in the first slot of the wire array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// `["create", target, type]`
    Create,
    /// `["destroy", target]`
    Destroy,
    /// `["set", target, {props}]`
    Set,
    /// `["call", target, method, {args}]`
    Call,
    /// `["listen", target, {eventType: bool}]`
    Listen,
    /// `["notify", target, eventType, {props}]`
    Notify,
}

impl OperationKind {
    /// Canonical tag string for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Destroy => "destroy",
            Self::Set => "set",
            Self::Call => "call",
            Self::Listen => "listen",
            Self::Notify => "notify",
        }
    }

    /// Resolve a wire tag; `None` for anything unrecognised.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "create" => Self::Create,
            "destroy" => Self::Destroy,
            "set" => Self::Set,
            "call" => Self::Call,
            "listen" => Self::Listen,
            "notify" => Self::Notify,
            _ => return None,
        })
    }

    /// Exact length of the wire array for this kind.
    fn arity(self) -> usize {
        match self {
            Self::Destroy => 2,
            Self::Create | Self::Set | Self::Listen => 3,
            Self::Call | Self::Notify => 4,
        }
    }
}

/// Structural mutations exchanged between server and client.
///
/// Equality is structural (tag + target + payload); payload maps compare
/// independent of member order.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Instantiate a client-side object.
    Create {
        /// Stable object identifier.
        target: String,
        /// Client-side type name.
        object_type: String,
    },
    /// Remove a client-side object.
    Destroy {
        /// Stable object identifier.
        target: String,
    },
    /// Update properties.
    Set {
        /// Stable object identifier.
        target: String,
        /// Property name → new value.
        properties: Properties,
    },
    /// Invoke a method.
    Call {
        /// Stable object identifier.
        target: String,
        /// Method name.
        method: String,
        /// Named arguments.
        parameters: Properties,
    },
    /// Toggle interest in event kinds.
    Listen {
        /// Stable object identifier.
        target: String,
        /// Event kind → whether the peer should report it.
        listeners: Listeners,
    },
    /// Report an event that happened on the sending side.
    Notify {
        /// Stable object identifier.
        target: String,
        /// Event kind.
        event_type: String,
        /// Event payload.
        properties: Properties,
    },
}

impl Operation {
    /// Convenience constructor for a single-property `set`.
    pub fn set(target: impl Into<String>, name: impl Into<String>, value: Value) -> Self {
        let mut properties = Properties::new();
        properties.insert(name.into(), value);
        Self::Set {
            target: target.into(),
            properties,
        }
    }

    /// Convenience constructor for a single-kind `listen`.
    pub fn listen(target: impl Into<String>, event_type: impl Into<String>, enabled: bool) -> Self {
        let mut listeners = Listeners::new();
        listeners.insert(event_type.into(), enabled);
        Self::Listen {
            target: target.into(),
            listeners,
        }
    }

    /// Tag of this operation.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Destroy { .. } => OperationKind::Destroy,
            Self::Set { .. } => OperationKind::Set,
            Self::Call { .. } => OperationKind::Call,
            Self::Listen { .. } => OperationKind::Listen,
            Self::Notify { .. } => OperationKind::Notify,
        }
    }

    /// Identifier of the object this operation addresses.
    pub fn target(&self) -> &str {
        match self {
            Self::Create { target, .. }
            | Self::Destroy { target }
            | Self::Set { target, .. }
            | Self::Call { target, .. }
            | Self::Listen { target, .. }
            | Self::Notify { target, .. } => target,
        }
    }

    /// Property payload of `set`, `call` (arguments) and `notify` operations.
    pub fn properties(&self) -> Option<&Properties> {
        match self {
            Self::Set { properties, .. } | Self::Notify { properties, .. } => Some(properties),
            Self::Call { parameters, .. } => Some(parameters),
            Self::Create { .. } | Self::Destroy { .. } | Self::Listen { .. } => None,
        }
    }

    /// Encode as the wire array.
    pub fn to_wire(&self) -> Value {
        let tag = Value::from(self.kind().as_str());
        let target = Value::from(self.target());
        let rest = match self {
            Self::Create { object_type, .. } => vec![Value::from(object_type.as_str())],
            Self::Destroy { .. } => vec![],
            Self::Set { properties, .. } => vec![Value::Object(properties.clone())],
            Self::Call {
                method, parameters, ..
            } => vec![
                Value::from(method.as_str()),
                Value::Object(parameters.clone()),
            ],
            Self::Listen { listeners, .. } => {
                let map = listeners
                    .iter()
                    .map(|(kind, enabled)| (kind.clone(), Value::Bool(*enabled)))
                    .collect();
                vec![Value::Object(map)]
            }
            Self::Notify {
                event_type,
                properties,
                ..
            } => vec![
                Value::from(event_type.as_str()),
                Value::Object(properties.clone()),
            ],
        };
        let mut out = Vec::with_capacity(2 + rest.len());
        out.push(tag);
        out.push(target);
        out.extend(rest);
        Value::Array(out)
    }

    /// Decode one wire array, validating tag and arity.
    pub fn from_wire(json: &Value) -> Result<Self, ProtocolError> {
        let malformed = || ProtocolError::Operation {
            fragment: json.to_string(),
        };
        let parts = json.as_array().ok_or_else(malformed)?;
        let kind = parts
            .first()
            .and_then(Value::as_str)
            .and_then(OperationKind::from_tag)
            .ok_or_else(malformed)?;
        if parts.len() != kind.arity() {
            return Err(malformed());
        }
        let target = parts[1].as_str().ok_or_else(malformed)?.to_owned();
        let string_at = |i: usize| parts[i].as_str().map(str::to_owned).ok_or_else(malformed);
        let object_at = |i: usize| parts[i].as_object().cloned().ok_or_else(malformed);

        let op = match kind {
            OperationKind::Create => Self::Create {
                target,
                object_type: string_at(2)?,
            },
            OperationKind::Destroy => Self::Destroy { target },
            OperationKind::Set => Self::Set {
                target,
                properties: object_at(2)?,
            },
            OperationKind::Call => Self::Call {
                target,
                method: string_at(2)?,
                parameters: object_at(3)?,
            },
            OperationKind::Listen => {
                let mut listeners = Listeners::new();
                for (event_type, enabled) in object_at(2)? {
                    let enabled = enabled.as_bool().ok_or_else(malformed)?;
                    listeners.insert(event_type, enabled);
                }
                Self::Listen { target, listeners }
            }
            OperationKind::Notify => Self::Notify {
                target,
                event_type: string_at(2)?,
                properties: object_at(3)?,
            },
        };
        Ok(op)
    }
}

impl Serialize for Operation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let json = Value::deserialize(deserializer)?;
        Self::from_wire(&json).map_err(serde::de::Error::custom)
    }
}
