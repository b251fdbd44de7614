//! Error types for the message protocol.

use serde::{Deserialize, Serialize};

/// Errors raised while decoding or encoding wire messages.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Payload is not valid JSON, or a known field has the wrong type.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Payload is valid JSON but not an object.
    #[error("message is not a JSON object")]
    NotAnObject,

    /// Message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(String),
}

/// Structured failure detail carried in the `error` field of a reply.
///
/// Shape seen by callers:
///
/// ```json
/// {"code": 123, "reason": "problem"}
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Optional numeric code (HTTP status for remote failures)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// Human-readable reason
    #[serde(default)]
    pub reason: String,
}

impl ErrorInfo {
    /// Create an error with a reason and no code.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            code: None,
            reason: reason.into(),
        }
    }

    /// Attach a numeric code.
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }
}
