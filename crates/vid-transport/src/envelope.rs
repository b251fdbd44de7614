//! Inbound message envelope.

use crate::origin::{ContextId, Origin};

/// One inbound `message` event: who sent it, what they sent, and the origin
/// the browser attributes to them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Context that posted the message (`MessageEvent.source`)
    pub source: ContextId,
    /// Raw string payload (`MessageEvent.data`)
    pub data: String,
    /// Sender origin exactly as reported (`MessageEvent.origin`)
    pub origin: String,
}

impl Envelope {
    /// Create an envelope.
    pub fn new(source: ContextId, data: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            source,
            data: data.into(),
            origin: origin.into(),
        }
    }

    /// Sender origin, or `None` when the transport reported a null origin.
    pub fn origin(&self) -> Option<Origin> {
        Origin::parse(&self.origin)
    }
}
