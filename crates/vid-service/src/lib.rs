//! Identity Service Endpoint
//!
//! Runs inside the invisible, cross-origin service frame. It:
//! - Accepts `getVerifiedEmail` from the hosting page
//! - Checks the remote session and fetches the default email
//! - Asks the hosting page to open a login popup when there is no session
//! - Replies to the original requester and asks for the popup to be closed
//!
//! # Protocol
//!
//! Unsolicited messages (no matching mailbox):
//!
//! - `getVerifiedEmail`: start a verified-email flow
//! - anything else: answered with `{operation:"unknown", success:false, mailbox}`
//!
//! Correlated replies:
//!
//! - reply to a `popup` request (the relayed `login` message): resume the flow
//!
//! # Flow State
//!
//! ```text
//! START ──logged in──► FETCH_EMAIL ──► DONE
//!   │                       ▲
//!   └──not logged in──► AWAIT_POPUP
//!
//! FAIL is reachable from every state on remote-API or popup failure.
//! ```
//!
//! All replies go to the origin of the message that started the flow,
//! never to an origin supplied by a later message.

mod config;
mod error;
mod pending;
pub mod response;
mod service;

#[cfg(test)]
mod tests;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use pending::{FlowState, PendingReply, RequestContext};
pub use service::{audience_for, Handled, IdentityService};
