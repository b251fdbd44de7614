//! The relay message.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ErrorInfo;
use crate::operation::Operation;

/// Field names with a dedicated slot on [`Message`].
const OPERATION_KEY: &str = "operation";
const MAILBOX_KEY: &str = "mailbox";

/// A single message exchanged over the cross-context transport.
///
/// `operation` and `mailbox` are lifted into typed fields; every other key
/// (`uri`, `target`, `success`, `result`, `error`, popup geometry, and
/// whatever a login page chooses to post) is kept in `fields` so that
/// relayed messages arrive with their payload intact.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Operation tag. Absent on the wire decodes as the empty tag.
    #[serde(default)]
    pub operation: String,
    /// Correlation token, present when the sender expects a reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailbox: Option<String>,
    /// Operation-specific payload
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Message {
    /// Create an empty message for a protocol operation.
    pub fn new(operation: Operation) -> Self {
        Self::with_tag(operation.as_str())
    }

    /// Create an empty message with an arbitrary operation tag.
    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self {
            operation: tag.into(),
            mailbox: None,
            fields: Map::new(),
        }
    }

    /// Successful reply: `{operation, success: true, result}`.
    pub fn succeeded(operation: Operation, result: impl Into<Value>) -> Self {
        Self::new(operation)
            .with_field("success", true)
            .with_field("result", result)
    }

    /// Failed reply: `{operation, success: false, error?}`.
    pub fn failed(operation: Operation, error: Option<ErrorInfo>) -> Self {
        let message = Self::new(operation).with_field("success", false);
        match error {
            Some(info) => message.with_error(info),
            None => message,
        }
    }

    /// Set the correlation token.
    pub fn with_mailbox(mut self, token: impl Into<String>) -> Self {
        self.mailbox = Some(token.into());
        self
    }

    /// Set the correlation token if one is given.
    pub fn with_mailbox_opt(mut self, token: Option<String>) -> Self {
        if token.is_some() {
            self.mailbox = token;
        }
        self
    }

    /// Set a payload field.
    ///
    /// `operation` and `mailbox` are routed to their typed slots; a
    /// non-string `mailbox` clears the token.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set_field(key, value.into());
        self
    }

    /// Attach structured error detail.
    pub fn with_error(self, error: ErrorInfo) -> Self {
        // ErrorInfo is a plain struct of an integer and a string.
        let value = serde_json::to_value(&error).unwrap_or(Value::Null);
        self.with_field("error", value)
    }

    /// Replace the operation tag, keeping the payload.
    pub fn retagged(mut self, operation: Operation) -> Self {
        self.operation = operation.as_str().into();
        self
    }

    /// Set a payload field in place.
    pub fn set_field(&mut self, key: &str, value: Value) {
        match key {
            OPERATION_KEY => {
                self.operation = value.as_str().unwrap_or_default().into();
            }
            MAILBOX_KEY => {
                self.mailbox = value.as_str().map(Into::into);
            }
            _ => {
                self.fields.insert(key.into(), value);
            }
        }
    }

    /// The operation, if it is one the protocol defines.
    pub fn op(&self) -> Option<Operation> {
        Operation::from_tag(&self.operation)
    }

    /// Whether the message carries a correlation token.
    pub fn expects_reply(&self) -> bool {
        self.mailbox.is_some()
    }

    /// Raw payload field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String payload field.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Truthiness of the `success` field. Absent counts as failure.
    pub fn success(&self) -> bool {
        self.fields.get("success").is_some_and(is_truthy)
    }

    /// The `result` field.
    pub fn result(&self) -> Option<&Value> {
        self.fields.get("result")
    }

    /// The `result` field as a string.
    pub fn result_str(&self) -> Option<&str> {
        self.result().and_then(Value::as_str)
    }

    /// The `error` field, accepting either an object or a bare string.
    pub fn error(&self) -> Option<ErrorInfo> {
        match self.fields.get("error")? {
            Value::String(reason) => Some(ErrorInfo::new(reason.clone())),
            value @ Value::Object(_) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }

    /// Positive numeric field, as used for popup geometry.
    ///
    /// Falsy values (absent, zero, empty, `false`) yield `None` so callers
    /// can substitute a default. Numeric strings are accepted.
    pub fn dimension(&self, key: &str) -> Option<u32> {
        let value = self.fields.get(key)?;
        if !is_truthy(value) {
            return None;
        }
        let number = match value {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        if number.is_finite() && number >= 1.0 && number <= f64::from(u32::MAX) {
            Some(number as u32)
        } else {
            None
        }
    }
}

/// JavaScript truthiness of a JSON value.
///
/// `null`, `false`, `0`, `NaN` and `""` are falsy; everything else,
/// including empty arrays and objects, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
