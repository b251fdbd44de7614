//! JSON wire format.
//!
//! Every message travels as the string payload of a `postMessage` call:
//! a single JSON object whose keys are the message's operation, mailbox,
//! and payload fields.

use serde_json::Value;

use crate::error::ProtocolError;
use crate::message::Message;

/// Encode a message as JSON text.
pub fn encode(message: &Message) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Decode JSON text into a message.
///
/// The text must be a JSON object. A missing `operation` decodes as the
/// empty tag; a non-string `operation` or `mailbox` is malformed.
pub fn decode(data: &str) -> Result<Message, ProtocolError> {
    let value: Value =
        serde_json::from_str(data).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(ProtocolError::NotAnObject);
    }
    serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorInfo, Operation};
    use serde_json::json;

    #[test]
    fn test_roundtrip_popup_request() {
        let original = Message::new(Operation::Popup)
            .with_mailbox("m0")
            .with_field("target", "_blank")
            .with_field("uri", "http://id.example/1/login")
            .with_field("left", 10)
            .with_field("width", 500);

        let decoded = decode(&encode(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_roundtrip_failure_with_nested_error() {
        let original = Message::failed(
            Operation::GetVerifiedEmail,
            Some(ErrorInfo::new("status 503").with_code(503)),
        );

        let decoded = decode(&encode(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.error().and_then(|e| e.code), Some(503));
    }

    #[test]
    fn test_encode_omits_absent_mailbox() {
        let text = encode(&Message::new(Operation::ClosePopup)).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({"operation": "closePopup"}));
    }

    #[test]
    fn test_decode_keeps_unknown_fields() {
        let msg = decode(r#"{"operation":"login","success":true,"assertion":"abc","extra":[1,2]}"#)
            .unwrap();

        assert_eq!(msg.op(), Some(Operation::Login));
        assert_eq!(msg.str_field("assertion"), Some("abc"));
        assert_eq!(msg.field("extra"), Some(&json!([1, 2])));
    }

    #[test]
    fn test_decode_missing_operation_is_empty_tag() {
        let msg = decode(r#"{"mailbox":"m1"}"#).unwrap();
        assert_eq!(msg.operation, "");
        assert_eq!(msg.op(), None);
        assert_eq!(msg.mailbox.as_deref(), Some("m1"));
    }

    #[test]
    fn test_decode_null_mailbox_is_absent() {
        let msg = decode(r#"{"operation":"popup","mailbox":null}"#).unwrap();
        assert!(msg.mailbox.is_none());
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(decode("not json at all"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(decode(""), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert_eq!(decode("[1,2,3]"), Err(ProtocolError::NotAnObject));
        assert_eq!(decode("\"getVerifiedEmail\""), Err(ProtocolError::NotAnObject));
        assert_eq!(decode("null"), Err(ProtocolError::NotAnObject));
    }

    #[test]
    fn test_decode_rejects_wrongly_typed_operation() {
        assert!(matches!(
            decode(r#"{"operation":42}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            decode(r#"{"operation":"popup","mailbox":7}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }
}
