// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Message: head + ordered operations, one per request/response cycle.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{head, Operation, ProtocolError, Properties};

/// Header plus ordered operation list.
///
/// Both parts are always present and independently mutable through
/// [`Message::head_mut`] and [`Message::operations_mut`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    head: Properties,
    operations: Vec<Operation>,
}

impl Message {
    /// Empty head, no operations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep copy of `source`; `InvalidArgument` when there is nothing to copy.
    pub fn copy_from(source: Option<&Message>) -> Result<Self, ProtocolError> {
        source
            .cloned()
            .ok_or(ProtocolError::InvalidArgument("source message is absent"))
    }

    /// Build from the wire object; requires `head` (object) and `operations` (array of arrays).
    pub fn from_json(json: &Value) -> Result<Self, ProtocolError> {
        let head = json
            .get("head")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| ProtocolError::Head {
                fragment: json.to_string(),
            })?;
        let operations = read_operations(json).map_err(|cause| ProtocolError::Operations {
            cause: Box::new(cause),
        })?;
        Ok(Self { head, operations })
    }

    /// Parse the textual wire form.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let json: Value = serde_json::from_str(text)?;
        Self::from_json(&json)
    }

    /// Encode as the wire object.
    pub fn to_json(&self) -> Value {
        let operations = self.operations.iter().map(Operation::to_wire).collect();
        let mut out = Properties::new();
        out.insert("head".into(), Value::Object(self.head.clone()));
        out.insert("operations".into(), Value::Array(operations));
        Value::Object(out)
    }

    /// Header members.
    pub fn head(&self) -> &Properties {
        &self.head
    }

    /// Live, mutable header.
    pub fn head_mut(&mut self) -> &mut Properties {
        &mut self.head
    }

    /// Operations in emission order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Live, mutable operation list (the render phase appends here).
    pub fn operations_mut(&mut self) -> &mut Vec<Operation> {
        &mut self.operations
    }

    /// `head.requestCounter`; `Ok(None)` when absent, `NotANumber` when not an unsigned integer.
    pub fn request_counter(&self) -> Result<Option<u64>, ProtocolError> {
        match self.head.get(head::REQUEST_COUNTER) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| ProtocolError::NotANumber(value.to_string())),
        }
    }

    /// Set `head.requestCounter`.
    pub fn set_request_counter(&mut self, counter: u64) {
        self.head
            .insert(head::REQUEST_COUNTER.into(), Value::from(counter));
    }

    /// `head.error`, if present and a string.
    pub fn error(&self) -> Option<&str> {
        self.head.get(head::ERROR).and_then(Value::as_str)
    }

    /// Set `head.error`.
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.head.insert(head::ERROR.into(), Value::String(error.into()));
    }

    /// Whether the head carries the initialize flag.
    pub fn is_initialize(&self) -> bool {
        self.flag(head::INITIALIZE)
    }

    /// Whether the head carries the shutdown flag.
    pub fn is_shutdown(&self) -> bool {
        self.flag(head::SHUTDOWN)
    }

    fn flag(&self, name: &str) -> bool {
        self.head.get(name).and_then(Value::as_bool).unwrap_or(false)
    }
}

fn read_operations(json: &Value) -> Result<Vec<Operation>, ProtocolError> {
    let array = json
        .get("operations")
        .and_then(Value::as_array)
        .ok_or(ProtocolError::Member("operations"))?;
    array.iter().map(Operation::from_wire).collect()
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut m = serializer.serialize_map(Some(2))?;
        m.serialize_entry("head", &self.head)?;
        m.serialize_entry("operations", &self.operations)?;
        m.end()
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let json = Value::deserialize(deserializer)?;
        Self::from_json(&json).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::error::Error as _;

    #[test]
    fn empty_message_has_empty_parts() {
        let message = Message::new();
        assert!(message.head().is_empty());
        assert!(message.operations().is_empty());
    }

    #[test]
    fn copy_is_deep() {
        let mut original = Message::new();
        original.head_mut().insert("foo".into(), json!(23));
        original
            .operations_mut()
            .push(Operation::set("target", "bar", json!(42)));

        let copy = Message::copy_from(Some(&original)).unwrap();
        original.head_mut().insert("foo".into(), json!(0));
        original.operations_mut().clear();

        assert_eq!(copy.head().get("foo"), Some(&json!(23)));
        assert_eq!(
            copy.operations(),
            &[Operation::set("target", "bar", json!(42))]
        );
    }

    #[test]
    fn copy_of_nothing_is_invalid_argument() {
        let err = Message::copy_from(None).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidArgument(_)));
    }

    #[test]
    fn missing_head_is_reported() {
        let err = Message::from_json(&json!({})).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Failed to read head from JSON message"));
    }

    #[test]
    fn missing_operations_is_reported() {
        let err = Message::from_json(&json!({ "head": {} })).unwrap_err();
        assert!(err
            .to_string()
            .contains("Failed to read operations from JSON message"));
    }

    #[test]
    fn non_array_operations_is_reported() {
        let err = Message::parse(r#"{ "head" : {}, "operations" : 23 }"#).unwrap_err();
        assert!(err
            .to_string()
            .contains("Failed to read operations from JSON message"));
    }

    #[test]
    fn illegal_operation_surfaces_as_cause() {
        let err = Message::parse(r#"{ "head" : {}, "operations" : [ [ "illegal" ] ] }"#)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read operations"));
        let cause = err.source().expect("cause").to_string();
        assert!(cause.contains("Could not read operation"), "{cause}");
    }

    #[test]
    fn head_and_operations_are_live_views() {
        let mut message = Message::parse(
            r#"{ "head" : { "foo" : 23 }, "operations" : [
                [ "set", "w3", { "foo" : 23 } ],
                [ "call", "w4", "method", { "bar" : 42 } ] ] }"#,
        )
        .unwrap();

        message.head_mut().insert("foo".into(), json!(42));
        message.operations_mut().remove(1);

        assert_eq!(message.head().get("foo"), Some(&json!(42)));
        assert_eq!(message.operations().len(), 1);
    }

    #[test]
    fn to_string_is_valid_json() {
        let text = r#"{ "head" : {}, "operations" : [ [ "set", "w3", { "foo" : 23 } ] ] }"#;
        let message = Message::parse(text).unwrap();

        let reparsed: Value = serde_json::from_str(&message.to_string()).unwrap();
        let original: Value = serde_json::from_str(text).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn request_counter_accessors() {
        let mut message = Message::new();
        assert_eq!(message.request_counter().unwrap(), None);

        message.set_request_counter(7);
        assert_eq!(message.request_counter().unwrap(), Some(7));

        message
            .head_mut()
            .insert(head::REQUEST_COUNTER.into(), json!("not-a-number"));
        let err = message.request_counter().unwrap_err();
        assert!(err.to_string().contains("Not a number"));
    }

    #[test]
    fn flags_default_to_false() {
        let mut message = Message::new();
        assert!(!message.is_initialize());
        assert!(!message.is_shutdown());

        message.head_mut().insert(head::SHUTDOWN.into(), json!(true));
        assert!(message.is_shutdown());
    }
}
