//! Message builders for everything the service sends.

use vid_network::ApiError;
use vid_protocol::{Message, Operation};

/// Successful `getVerifiedEmail` reply.
pub fn verified_email(email: &str) -> Message {
    Message::succeeded(Operation::GetVerifiedEmail, email)
}

/// Failed `getVerifiedEmail` reply for a remote-API failure.
///
/// Carries the error detail, plus `exception` when the request itself raised.
pub fn api_failure(error: &ApiError) -> Message {
    let message = Message::failed(Operation::GetVerifiedEmail, Some(error.to_error_info()));
    match error.exception() {
        Some(exception) => message.with_field("exception", exception),
        None => message,
    }
}

/// Failed `getVerifiedEmail` reply for an unsuccessful login popup.
///
/// Passes through whatever error the login page reported.
pub fn login_failure(popup_reply: &Message) -> Message {
    Message::failed(Operation::GetVerifiedEmail, popup_reply.error())
}

/// Reply to an unsolicited message with an unrecognized operation.
pub fn unknown_operation(mailbox: Option<String>) -> Message {
    Message::failed(Operation::Unknown, None).with_mailbox_opt(mailbox)
}

/// Ask the hosting page to open a login window at `uri`.
pub fn popup_request(uri: &str) -> Message {
    Message::new(Operation::Popup)
        .with_field("target", "_blank")
        .with_field("uri", uri)
}

/// Ask the hosting page to close the login window.
pub fn close_popup() -> Message {
    Message::new(Operation::ClosePopup)
}
