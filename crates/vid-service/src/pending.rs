//! Per-request state tracking.
//!
//! A `getVerifiedEmail` flow that needs a login popup is suspended in the
//! mailbox router until the popup outcome is relayed back. The continuation
//! is stored as data rather than a closure.

use vid_transport::{ContextId, Origin};

/// Who started a flow and where its replies go.
///
/// Captured from the initiating message only; later messages never change
/// the reply target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    /// Context that sent `getVerifiedEmail` (the hosting page)
    pub source: ContextId,
    /// Origin of that context; also the audience for the email
    pub origin: Origin,
    /// Mailbox of the initiating message, echoed on replies
    pub mailbox: Option<String>,
}

impl RequestContext {
    /// Create a request context.
    pub fn new(source: ContextId, origin: Origin, mailbox: Option<String>) -> Self {
        Self {
            source,
            origin,
            mailbox,
        }
    }
}

/// Continuations lodged in the service's mailbox router.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingReply {
    /// Waiting for the outcome of a login popup
    PopupLogin {
        /// The flow to resume
        request: RequestContext,
    },
}

/// Where a `getVerifiedEmail` flow stands after a handler returns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowState {
    /// Popup requested; resumes when `mailbox` is answered
    AwaitPopup {
        /// Token the popup outcome must carry
        mailbox: String,
    },
    /// Email delivered to the requester
    Done,
    /// Failure delivered to the requester
    Failed,
}

impl FlowState {
    /// Whether the flow has finished (either way).
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Done | FlowState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_new() {
        let origin = Origin::parse("https://rp.example").unwrap();
        let ctx = RequestContext::new(ContextId(4), origin.clone(), Some("w0".into()));

        assert_eq!(ctx.source, ContextId(4));
        assert_eq!(ctx.origin, origin);
        assert_eq!(ctx.mailbox.as_deref(), Some("w0"));
    }

    #[test]
    fn test_terminal_states() {
        assert!(FlowState::Done.is_terminal());
        assert!(FlowState::Failed.is_terminal());
        assert!(!FlowState::AwaitPopup { mailbox: "m0".into() }.is_terminal());
    }
}
