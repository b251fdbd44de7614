//! Wrapper Endpoint
//!
//! Runs in the hosting (relying-party) page and installs the `navigator.id`
//! capability. `getVerifiedEmail(callback)`:
//!
//! 1. creates a hidden frame at the identity service's well-known URI
//! 2. on frame load, asks the service for the verified email
//! 3. opens (and later closes) the login popup when the service asks
//! 4. relays the popup's `login` outcome back to the service
//! 5. hands the final result to `callback`, exactly once
//!
//! ```text
//!   page (wrapper)            service frame             popup
//!        │ getVerifiedEmail ───────►│                      │
//!        │◄──────────── popup (m0) ─│                      │
//!        │ open ─────────────────────────────────────────► │
//!        │◄─────────────────────────────────── login ───── │
//!        │ login (m0) ─────────────►│                      │
//!        │◄─────── getVerifiedEmail │                      │
//!        │◄─────────── closePopup ──│                      │
//! ```
//!
//! Only the identity origin is trusted; everything else is dropped. All DOM
//! work goes through the [`PageHost`] trait.
//!
//! Failures never reach the caller as panics: a flow that cannot continue
//! reports `{success:false, operation:"getVerifiedEmail", error}` to the
//! callback, and protocol errors are returned to the event glue to log.

mod capability;
mod config;
mod endpoint;
mod error;
mod host;
mod popup;
pub mod testing;


pub use capability::{Capability, CapabilitySlot, InstallOutcome, Teardown};
pub use config::{PopupDefaults, WrapperConfig, DEFAULT_IDENTITY_ORIGIN, DEFAULT_SERVICE_PATH};
pub use endpoint::{
    Callback, Handled, TeardownStep, UnhookReport, WrapperEndpoint, WrapperPending,
    WRAPPER_TOKEN_PREFIX,
};
pub use error::WrapperError;
pub use host::{HostError, PageHost};
pub use popup::PopupFeatures;
pub use testing::MockHost;
