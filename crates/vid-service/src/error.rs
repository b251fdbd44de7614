//! Service errors.

use vid_transport::TransportError;

/// Errors surfaced by the identity service event handler.
///
/// Remote-API and popup failures are not errors here: they become failure
/// replies to the requester. Only failing to post a reply escapes.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// A reply or popup request could not be posted.
    #[error("failed to send: {0}")]
    Transport(#[from] TransportError),
}
