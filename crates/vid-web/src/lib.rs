//! Browser Bindings for the Verified Email Relay
//!
//! Three entry points, one per browsing context:
//!
//! - `installNavigatorId(config?)` in the hosting page: installs the wrapper
//!   at `navigator.id`
//! - `startIdentityService(config?)` in the hidden service frame
//! - `reportLogin(success, openerOrigin)` in the login popup
//!
//! ## Module Structure
//!
//! - `registry` - `ContextId` ⇄ `Window` table shared by host and transport
//! - `transport` - `Window.postMessage` transport
//! - `xhr` - blocking `XMLHttpRequest` client for the remote identity API
//! - `dom` - `PageHost` over the document (hidden frame, popup, listeners)
//! - `navigator` / `service` / `login` - the exported glue

// =============================================================================
// Module declarations
// =============================================================================

mod dom;
mod login;
mod navigator;
mod registry;
mod service;
mod transport;
mod xhr;

// =============================================================================
// Public re-exports
// =============================================================================

pub use dom::{DomHost, EventSink, PageEvent};
pub use login::report_login;
pub use navigator::install_navigator_id;
pub use registry::WindowRegistry;
pub use service::start_identity_service;
pub use transport::WindowTransport;
pub use xhr::XhrClient;

pub(crate) fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
