//! Remote Identity API client
//!
//! Leaf dependency of the identity service frame. Every remote operation is
//! a form-encoded POST to `<base>/<operation>` asking for JSON output:
//!
//! | Operation | Params | Body on success |
//! |-----------|--------|-----------------|
//! | `logged_in` | none | `{success}` |
//! | `get_default_email` | `audience` | `{success, email}` |
//! | `get_emails` | `audience` | `{success, emails}` |
//!
//! Any non-200 status or unparsable body is a failure. Nothing is retried.
//!
//! # Architecture
//!
//! ```text
//! IdentityService
//!        │
//!        │ IdentityApi::get_default_email(audience)
//!        ▼
//! ┌─────────────────┐
//! │   IdentityApi   │  ◄── builds form body, interprets JSON
//! └────────┬────────┘
//!          │ HttpClient::execute (blocking)
//!          ▼
//! ┌─────────────────┐
//! │  XhrClient (web)│  ◄── synchronous XMLHttpRequest
//! │  ScriptedHttp   │  ◄── tests
//! └─────────────────┘
//! ```

mod api;
mod error;
mod http;
pub mod testing;

pub use api::{IdentityApi, OP_GET_DEFAULT_EMAIL, OP_GET_EMAILS, OP_LOGGED_IN};
pub use error::ApiError;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, HttpSuccess, NetworkError};
pub use testing::ScriptedHttp;
