//! Pending-reply table keyed by mailbox token.

use std::collections::BTreeMap;

use vid_protocol::Message;
use vid_transport::{debug, send, ContextId, Envelope, Origin, Transport, TransportError};

use crate::admission::{admit, Rejection};

/// Prefix used for tokens when none is configured.
pub const DEFAULT_TOKEN_PREFIX: &str = "m";

/// Where an admitted message was routed.
#[derive(Debug, PartialEq)]
pub enum Routed<P> {
    /// Reply to a registered mailbox; the continuation has been removed.
    Reply {
        /// Continuation lodged by `send_expecting_reply`
        pending: P,
        /// The reply itself
        message: Message,
    },
    /// No registered mailbox matched; use default handling.
    Unsolicited(Message),
}

/// An admitted inbound message together with its sender.
#[derive(Debug, PartialEq)]
pub struct Inbound<P> {
    /// Context that posted the message
    pub source: ContextId,
    /// Sender origin (never null)
    pub origin: Origin,
    /// Routing outcome
    pub routed: Routed<P>,
}

/// Per-endpoint mailbox registry.
///
/// Tokens are `prefix` followed by a counter that only ever increases, so
/// no token repeats within the router's lifetime.
pub struct MailboxRouter<P> {
    prefix: String,
    next_token: u64,
    mailboxes: BTreeMap<String, P>,
}

impl<P> Default for MailboxRouter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> MailboxRouter<P> {
    /// Create a router issuing `m0`, `m1`, ...
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_TOKEN_PREFIX)
    }

    /// Create a router with a custom token prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next_token: 0,
            mailboxes: BTreeMap::new(),
        }
    }

    /// Issue a fresh token.
    pub fn new_token(&mut self) -> String {
        let token = format!("{}{}", self.prefix, self.next_token);
        self.next_token += 1;
        token
    }

    /// Number of mailboxes still waiting for a reply.
    pub fn pending_len(&self) -> usize {
        self.mailboxes.len()
    }

    /// Whether `token` is waiting for a reply.
    pub fn is_pending(&self, token: &str) -> bool {
        self.mailboxes.contains_key(token)
    }

    /// Send `message`, lodging `pending` under its mailbox.
    ///
    /// A message without a mailbox gets a fresh token. Returns the token the
    /// reply must carry. If the send fails the registration is withdrawn.
    pub fn send_expecting_reply<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        dest: ContextId,
        mut message: Message,
        pending: P,
        target_origin: Option<&Origin>,
    ) -> Result<String, TransportError> {
        let token = match message.mailbox.clone() {
            Some(token) => token,
            None => {
                let token = self.new_token();
                message.mailbox = Some(token.clone());
                token
            }
        };

        self.mailboxes.insert(token.clone(), pending);
        if let Err(e) = send(transport, dest, &message, target_origin) {
            self.mailboxes.remove(&token);
            return Err(e);
        }
        Ok(token)
    }

    /// Route a decoded message.
    ///
    /// A registered mailbox is consumed here; a later message with the same
    /// token is unsolicited.
    pub fn dispatch(&mut self, message: Message) -> Routed<P> {
        let pending = message
            .mailbox
            .as_deref()
            .and_then(|token| self.mailboxes.remove(token));

        match pending {
            Some(pending) => {
                debug(&format!(
                    "MailboxRouter: got reply on mailbox {}",
                    message.mailbox.as_deref().unwrap_or_default()
                ));
                Routed::Reply { pending, message }
            }
            None => Routed::Unsolicited(message),
        }
    }

    /// Admit and route an inbound envelope.
    ///
    /// Rejected envelopes never touch the registry.
    pub fn receive(&mut self, envelope: &Envelope) -> Result<Inbound<P>, Rejection> {
        let (origin, message) = admit(envelope)?;
        Ok(Inbound {
            source: envelope.source,
            origin,
            routed: self.dispatch(message),
        })
    }
}
