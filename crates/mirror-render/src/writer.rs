// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Appends render output to a message, folding consecutive `set`/`listen`
//! operations for the same target into one.

use mirror_protocol::{Message, Operation, Properties, Value};

/// Write cursor over a message's live operation list.
#[derive(Debug)]
pub struct OperationWriter<'m> {
    message: &'m mut Message,
}

impl<'m> OperationWriter<'m> {
    /// Write into `message`, after any operations it already holds.
    pub fn new(message: &'m mut Message) -> Self {
        Self { message }
    }

    /// `["create", target, type]`
    pub fn create(&mut self, target: &str, object_type: &str) {
        self.push(Operation::Create {
            target: target.to_owned(),
            object_type: object_type.to_owned(),
        });
    }

    /// `["destroy", target]`
    pub fn destroy(&mut self, target: &str) {
        self.push(Operation::Destroy {
            target: target.to_owned(),
        });
    }

    /// Add one property to the trailing `set` of `target`, or start a new one.
    pub fn set(&mut self, target: &str, name: &str, value: Value) {
        if let Some(Operation::Set {
            target: last,
            properties,
        }) = self.message.operations_mut().last_mut()
        {
            if last == target {
                properties.insert(name.to_owned(), value);
                return;
            }
        }
        self.push(Operation::set(target, name, value));
    }

    /// `["call", target, method, {args}]`
    pub fn call(&mut self, target: &str, method: &str, parameters: Properties) {
        self.push(Operation::Call {
            target: target.to_owned(),
            method: method.to_owned(),
            parameters,
        });
    }

    /// Add one listener flag to the trailing `listen` of `target`, or start a new one.
    pub fn listen(&mut self, target: &str, event_type: &str, enabled: bool) {
        if let Some(Operation::Listen {
            target: last,
            listeners,
        }) = self.message.operations_mut().last_mut()
        {
            if last == target {
                listeners.insert(event_type.to_owned(), enabled);
                return;
            }
        }
        self.push(Operation::listen(target, event_type, enabled));
    }

    /// Number of operations written so far (including pre-existing ones).
    pub fn len(&self) -> usize {
        self.message.operations().len()
    }

    /// Whether the message holds no operations.
    pub fn is_empty(&self) -> bool {
        self.message.operations().is_empty()
    }

    fn push(&mut self, op: Operation) {
        self.message.operations_mut().push(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_protocol::json;

    #[test]
    fn sets_for_same_target_accumulate() {
        let mut message = Message::new();
        let mut writer = OperationWriter::new(&mut message);
        writer.set("w1", "text", json!("a"));
        writer.set("w1", "enabled", json!(false));
        writer.set("w2", "text", json!("b"));
        writer.set("w1", "visibility", json!(true));

        let ops = message.operations();
        assert_eq!(ops.len(), 3);
        assert_eq!(
            ops[0].properties().unwrap().keys().collect::<Vec<_>>(),
            vec!["text", "enabled"]
        );
        assert_eq!(ops[1].target(), "w2");
        assert_eq!(ops[2].target(), "w1");
    }

    #[test]
    fn set_after_create_starts_new_operation() {
        let mut message = Message::new();
        let mut writer = OperationWriter::new(&mut message);
        writer.create("w1", "rwt.widgets.Shell");
        writer.set("w1", "parent", json!("w0"));
        assert_eq!(writer.len(), 2);
    }

    #[test]
    fn listen_flags_accumulate() {
        let mut message = Message::new();
        let mut writer = OperationWriter::new(&mut message);
        writer.listen("w1", "Selection", true);
        writer.listen("w1", "Modify", false);

        let mut expected = mirror_protocol::Listeners::new();
        expected.insert("Selection".into(), true);
        expected.insert("Modify".into(), false);
        assert_eq!(
            message.operations(),
            &[Operation::Listen {
                target: "w1".into(),
                listeners: expected
            }]
        );
    }
}
