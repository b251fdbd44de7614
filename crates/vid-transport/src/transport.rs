//! Outbound transport trait and the origin-guarded send.

use vid_protocol::{wire, Message, ProtocolError};

use crate::debug;
use crate::origin::{ContextId, Origin};

/// Errors from posting a message.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No target origin was supplied; posting would leak to any origin.
    #[error("refusing to send to open origin")]
    OpenOrigin,

    /// Destination context is not known to the transport (closed or never opened).
    #[error("unknown destination context: {0}")]
    UnknownContext(ContextId),

    /// Message could not be encoded.
    #[error(transparent)]
    Encode(#[from] ProtocolError),

    /// The platform rejected the post.
    #[error("postMessage failed: {0}")]
    PostFailed(String),
}

/// One-way, asynchronous message post to another browsing context.
///
/// Implementations deliver `data` to `dest` only if `dest`'s origin matches
/// `target_origin`; a mismatch is silently dropped, as `postMessage` does.
pub trait Transport {
    /// Post a raw string payload.
    fn post(&self, dest: ContextId, data: &str, target_origin: &Origin)
        -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post(
        &self,
        dest: ContextId,
        data: &str,
        target_origin: &Origin,
    ) -> Result<(), TransportError> {
        (**self).post(dest, data, target_origin)
    }
}

/// Encode and post a message.
///
/// Fails with [`TransportError::OpenOrigin`] when `target_origin` is unset.
pub fn send<T: Transport + ?Sized>(
    transport: &T,
    dest: ContextId,
    message: &Message,
    target_origin: Option<&Origin>,
) -> Result<(), TransportError> {
    let Some(origin) = target_origin else {
        debug("Transport: refusing to send to open origin");
        return Err(TransportError::OpenOrigin);
    };
    let data = wire::encode(message)?;
    debug(&format!(
        "Transport: sending '{}' to {} at origin {}",
        message.operation, dest, origin
    ));
    transport.post(dest, &data, origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryBus;
    use vid_protocol::Operation;

    #[test]
    fn test_send_refuses_open_origin() {
        let bus = MemoryBus::new();
        let a = bus.open_context("https://a.example");
        let b = bus.open_context("https://b.example");

        let result = send(&a, b.id(), &Message::new(Operation::ClosePopup), None);

        assert_eq!(result, Err(TransportError::OpenOrigin));
        assert!(bus.deliveries().is_empty());
        assert_eq!(b.queued(), 0);
    }

    #[test]
    fn test_send_encodes_json() {
        let bus = MemoryBus::new();
        let a = bus.open_context("https://a.example");
        let b = bus.open_context("https://b.example");
        let origin = Origin::parse("https://b.example").unwrap();

        send(&a, b.id(), &Message::new(Operation::ClosePopup), Some(&origin)).unwrap();

        let envelope = b.on_message().next().unwrap();
        assert_eq!(envelope.data, r#"{"operation":"closePopup"}"#);
        assert_eq!(envelope.origin, "https://a.example");
        assert_eq!(envelope.source, a.id());
    }
}
