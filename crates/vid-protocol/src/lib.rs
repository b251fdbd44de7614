//! Message Protocol for the Verified Email Relay
//!
//! This crate defines the unit of communication exchanged between the
//! hosting page wrapper, the identity service frame, and the login popup:
//!
//! - **Operations**: the string tags identifying intent or response type
//! - **Message**: operation tag, optional mailbox token, free-form payload
//! - **Wire codec**: JSON text carried as the string payload of `postMessage`
//!
//! # Message Flow
//!
//! ```text
//! Hosting page (wrapper)            Service frame               Login popup
//!        │                                │                          │
//!        │ {operation:"getVerifiedEmail"} │                          │
//!        │───────────────────────────────►│                          │
//!        │   {operation:"popup", mailbox} │                          │
//!        │◄───────────────────────────────│                          │
//!        │ window.open(uri) ─────────────────────────────────────────►
//!        │                {operation:"login", success}               │
//!        │◄──────────────────────────────────────────────────────────│
//!        │ {operation:"login", mailbox}   │                          │
//!        │───────────────────────────────►│                          │
//!        │ {operation:"getVerifiedEmail", success, result}           │
//!        │◄───────────────────────────────│                          │
//!        │ {operation:"closePopup"}       │                          │
//!        │◄───────────────────────────────│                          │
//! ```
//!
//! A message carrying a `mailbox` is answered by a message carrying the
//! identical `mailbox`; messages without one are routed by operation.

mod error;
mod message;
mod operation;
pub mod wire;

pub use error::{ErrorInfo, ProtocolError};
pub use message::{is_truthy, Message};
pub use operation::Operation;
