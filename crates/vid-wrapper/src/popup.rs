//! Login popup window features.

use core::fmt;

use vid_protocol::Message;

use crate::config::PopupDefaults;

/// Geometry of the login window, rendered as a `window.open` features string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PopupFeatures {
    /// Screen x of the window's left edge, in pixels
    pub left: u32,
    /// Screen y of the window's top edge, in pixels
    pub top: u32,
    /// Window height in pixels
    pub height: u32,
    /// Window width in pixels
    pub width: u32,
}

impl PopupFeatures {
    /// Read geometry from a `popup` request.
    ///
    /// Absent, zero, or otherwise falsy fields fall back to `defaults`.
    pub fn from_message(message: &Message, defaults: &PopupDefaults) -> Self {
        Self {
            left: message.dimension("left").unwrap_or(defaults.left),
            top: message.dimension("top").unwrap_or(defaults.top),
            height: message.dimension("height").unwrap_or(defaults.height),
            width: message.dimension("width").unwrap_or(defaults.width),
        }
    }
}

impl From<PopupDefaults> for PopupFeatures {
    fn from(d: PopupDefaults) -> Self {
        Self {
            left: d.left,
            top: d.top,
            height: d.height,
            width: d.width,
        }
    }
}

impl fmt::Display for PopupFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scrollbars=yes,left={},top={},height={},width={}",
            self.left, self.top, self.height, self.width
        )
    }
}
