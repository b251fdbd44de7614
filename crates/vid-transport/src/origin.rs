//! Origins and browsing-context handles.

use core::fmt;

/// Opaque handle to a browsing context (page, frame, or popup window).
///
/// The browser binding maps these to `Window` objects; the in-memory bus
/// allocates them sequentially.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// A concrete, serialized web origin such as `https://rp.example`.
///
/// Construction goes through [`Origin::parse`], so an `Origin` value is
/// never null, empty, or the `*` wildcard.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Origin(String);

impl Origin {
    /// Parse an origin string as reported by the transport.
    ///
    /// Opaque origins arrive as the literal string `"null"`; those, the
    /// empty string, and `*` yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw {
            "" | "null" | "*" => None,
            _ => Some(Origin(raw.trim_end_matches('/').to_string())),
        }
    }

    /// The serialized origin.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
