//! Cross-Context Transport for the Verified Email Relay
//!
//! Wraps the browser's one-way, asynchronous `postMessage` primitive and its
//! inbound `message` event stream behind a small platform trait, so the
//! endpoints can run against a real `Window` in the browser or against the
//! in-memory [`testing::MemoryBus`] in native tests.
//!
//! # Guarantees
//!
//! - `send` refuses to post when the target origin is unset; there is no
//!   wildcard origin in this crate
//! - Every inbound [`Envelope`] carries the sender's declared origin string;
//!   [`Envelope::origin`] normalizes `"null"` to `None`
//! - Messages from one sender to one destination arrive in send order
//!
//! # Platform Implementations
//!
//! - **Browser**: `vid-web::WindowTransport` (`Window.postMessage`)
//! - **Tests**: [`testing::MemoryBus`]

mod envelope;
mod origin;
pub mod testing;
mod transport;

pub use envelope::Envelope;
pub use origin::{ContextId, Origin};
pub use testing::{MemoryBus, MemoryPort};
pub use transport::{send, Transport, TransportError};

/// Print a debug message.
///
/// Goes to the browser console on `wasm32`; no-op elsewhere.
#[cfg(target_arch = "wasm32")]
pub fn debug(msg: &str) {
    web_sys::console::log_1(&msg.into());
}

/// Print a debug message.
///
/// Goes to the browser console on `wasm32`; no-op elsewhere.
#[cfg(not(target_arch = "wasm32"))]
pub fn debug(_msg: &str) {
    // No-op for non-WASM
}
