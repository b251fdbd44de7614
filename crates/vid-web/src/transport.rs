//! `postMessage` transport.

use vid_transport::{ContextId, Origin, Transport, TransportError};

use crate::registry::WindowRegistry;

/// [`Transport`] over `Window.postMessage`.
#[derive(Clone)]
pub struct WindowTransport {
    registry: WindowRegistry,
}

impl WindowTransport {
    pub fn new(registry: WindowRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }
}

impl Transport for WindowTransport {
    fn post(
        &self,
        dest: ContextId,
        data: &str,
        target_origin: &Origin,
    ) -> Result<(), TransportError> {
        let window = self
            .registry
            .get(dest)
            .ok_or(TransportError::UnknownContext(dest))?;
        window
            .post_message(&data.into(), target_origin.as_str())
            .map_err(|e| TransportError::PostFailed(format!("{:?}", e)))
    }
}
