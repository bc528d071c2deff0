// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON framing helpers shared by every transport.
//!
//! The body of a request or response is exactly one message object
//! (`{"head": {...}, "operations": [...]}`) encoded as UTF-8 JSON.

use crate::{Message, ProtocolError};

/// Content type of every request and response body.
pub const CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Media type (without parameters) accepted on requests.
pub const MEDIA_TYPE: &str = "application/json";

/// Encode a message to its compact textual wire form.
pub fn encode_message(message: &Message) -> String {
    message.to_json().to_string()
}

/// Decode a request/response body.
pub fn decode_message(bytes: &[u8]) -> Result<Message, ProtocolError> {
    let json: serde_json::Value = serde_json::from_slice(bytes)?;
    Message::from_json(&json)
}

/// Error response: `head.error` set, no operations.
pub fn error_message(error: &str) -> Message {
    let mut message = Message::new();
    message.set_error(error);
    message
}

/// Whether a request `Content-Type` header announces JSON.
///
/// Parameters (charset) are ignored; the media type comparison is case-insensitive.
pub fn is_json_content_type(header: &str) -> bool {
    header
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(MEDIA_TYPE))
}

// --- Unit tests -----------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Operation, ERROR_SESSION_TIMEOUT};
    use serde_json::json;

    #[test]
    fn encode_is_compact_and_ordered() {
        let mut message = Message::new();
        message.set_request_counter(2);
        message
            .operations_mut()
            .push(Operation::set("w1", "text", json!("a")));

        assert_eq!(
            encode_message(&message),
            r#"{"head":{"requestCounter":2},"operations":[["set","w1",{"text":"a"}]]}"#
        );
    }

    #[test]
    fn decode_rejects_non_json() {
        let err = decode_message(b"<html>").unwrap_err();
        assert!(matches!(err, ProtocolError::Json(_)));
    }

    #[test]
    fn error_message_has_no_operations() {
        let message = error_message(ERROR_SESSION_TIMEOUT);
        assert_eq!(message.error(), Some("session timeout"));
        assert!(message.operations().is_empty());
    }

    #[test]
    fn content_type_check() {
        assert!(is_json_content_type(CONTENT_TYPE));
        assert!(is_json_content_type("Application/JSON"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type(""));
    }
}
