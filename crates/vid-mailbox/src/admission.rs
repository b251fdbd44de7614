//! Trust checks applied to every inbound envelope before routing.

use vid_protocol::{wire, Message, ProtocolError};
use vid_transport::{Envelope, Origin};

/// Reasons an inbound envelope is dropped before any routing occurs.
///
/// No correlated caller exists at this point, so rejections are logged and
/// never answered.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Transport reported a null (or absent) sender origin.
    #[error("message with null origin")]
    NullOrigin,

    /// Sender origin is not the one this endpoint trusts.
    #[error("message from unexpected origin {0}")]
    UnexpectedOrigin(String),

    /// Payload is not a JSON message object.
    #[error(transparent)]
    Malformed(#[from] ProtocolError),
}

/// Check the sender origin and decode the payload.
///
/// The origin check runs first: a null-origin envelope is rejected without
/// its payload being looked at.
pub fn admit(envelope: &Envelope) -> Result<(Origin, Message), Rejection> {
    let origin = envelope.origin().ok_or(Rejection::NullOrigin)?;
    let message = wire::decode(&envelope.data)?;
    Ok((origin, message))
}

/// Like [`admit`], but only for envelopes from `expected`.
///
/// The payload of an envelope from any other origin is never decoded.
pub fn admit_from(envelope: &Envelope, expected: &Origin) -> Result<Message, Rejection> {
    let origin = envelope.origin().ok_or(Rejection::NullOrigin)?;
    if &origin != expected {
        return Err(Rejection::UnexpectedOrigin(origin.to_string()));
    }
    Ok(wire::decode(&envelope.data)?)
}
