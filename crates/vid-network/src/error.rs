//! Remote API errors.

use vid_protocol::ErrorInfo;

/// Failure of a remote identity API call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request raised before a response was available.
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with a non-200 status.
    #[error("remote returned status {0}")]
    Status(u16),

    /// The body was missing, not JSON, or lacked an expected field.
    #[error("malformed response: {0}")]
    MalformedBody(String),

    /// The body parsed but reported `success: false`.
    #[error("request rejected{}", .0.as_ref().map(|e| format!(": {}", e.reason)).unwrap_or_default())]
    Rejected(Option<ErrorInfo>),
}

impl ApiError {
    /// Error detail for a failure reply.
    pub fn to_error_info(&self) -> ErrorInfo {
        match self {
            ApiError::Status(status) => ErrorInfo::new(self.to_string()).with_code(i64::from(*status)),
            ApiError::Rejected(Some(info)) => info.clone(),
            _ => ErrorInfo::new(self.to_string()),
        }
    }

    /// Message of the exception raised by the request, if that is what failed.
    pub fn exception(&self) -> Option<&str> {
        match self {
            ApiError::Transport(msg) => Some(msg),
            _ => None,
        }
    }
}
