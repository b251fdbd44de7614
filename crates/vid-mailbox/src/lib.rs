//! Mailbox Router
//!
//! `postMessage` is fire-and-forget: nothing pairs a reply with the request
//! that caused it. This crate rebuilds request/reply on top of it using only
//! the message payload as state:
//!
//! 1. A correlated request gets a fresh token in its `mailbox` field and its
//!    continuation is lodged under that token.
//! 2. The peer answers with a message carrying the same `mailbox`.
//! 3. On arrival the continuation is removed and handed back to the owning
//!    endpoint, exactly once. Anything else is unsolicited and goes to the
//!    endpoint's default handling.
//!
//! Continuations are plain data (`P`), typically an enum of "what to do
//! when the reply lands", the same way the identity service tracks its
//! pending network operations. Each endpoint owns its own router.
//!
//! There is no timeout: a reply that never arrives leaves its mailbox
//! registered for the lifetime of the router.

mod admission;
mod router;

pub use admission::{admit, admit_from, Rejection};
pub use router::{Inbound, MailboxRouter, Routed, DEFAULT_TOKEN_PREFIX};
