//! Hosting page platform trait.
//!
//! The wrapper never touches the DOM directly. Everything it needs from the
//! hosting page goes through [`PageHost`], implemented over `web-sys` in the
//! browser and by [`crate::testing::MockHost`] in native tests.
//!
//! Browsing contexts created through the host (the service frame, the login
//! popup) are identified by the same [`ContextId`] the transport uses.

use vid_transport::ContextId;

use crate::popup::PopupFeatures;

/// Errors reported by a [`PageHost`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// `window.open` returned nothing (blocked or failed)
    #[error("popup window could not be opened")]
    PopupBlocked,
    /// No frame, popup, or listener with this id
    #[error("no such context: {0}")]
    NotFound(ContextId),
    /// Any other DOM failure
    #[error("DOM error: {0}")]
    Dom(String),
}

/// Page operations the wrapper relies on.
pub trait PageHost {
    /// Create a hidden frame loading `src`, append it to the document, and
    /// start listening for its load event and for inbound messages.
    ///
    /// Returns the frame's browsing context.
    fn create_hidden_frame(&self, src: &str) -> Result<ContextId, HostError>;

    /// Open a top-level window.
    ///
    /// Returns [`HostError::PopupBlocked`] if no window was created.
    fn open_popup(
        &self,
        uri: &str,
        target: &str,
        features: &PopupFeatures,
    ) -> Result<ContextId, HostError>;

    /// Close a window returned by [`PageHost::open_popup`].
    fn close_popup(&self, popup: ContextId) -> Result<(), HostError>;

    // === Teardown ===
    // Each removal is independent: a failure in one must not prevent the
    // others from being attempted.

    /// Stop delivering `message` events for the flow around `frame`.
    fn remove_message_listener(&self, frame: ContextId) -> Result<(), HostError>;

    /// Stop delivering `frame`'s load events.
    fn remove_load_listener(&self, frame: ContextId) -> Result<(), HostError>;

    /// Detach `frame` from the document.
    fn remove_frame(&self, frame: ContextId) -> Result<(), HostError>;
}

impl<H: PageHost + ?Sized> PageHost for &H {
    fn create_hidden_frame(&self, src: &str) -> Result<ContextId, HostError> {
        (**self).create_hidden_frame(src)
    }

    fn open_popup(
        &self,
        uri: &str,
        target: &str,
        features: &PopupFeatures,
    ) -> Result<ContextId, HostError> {
        (**self).open_popup(uri, target, features)
    }

    fn close_popup(&self, popup: ContextId) -> Result<(), HostError> {
        (**self).close_popup(popup)
    }

    fn remove_message_listener(&self, frame: ContextId) -> Result<(), HostError> {
        (**self).remove_message_listener(frame)
    }

    fn remove_load_listener(&self, frame: ContextId) -> Result<(), HostError> {
        (**self).remove_load_listener(frame)
    }

    fn remove_frame(&self, frame: ContextId) -> Result<(), HostError> {
        (**self).remove_frame(frame)
    }
}
