//! Identity API operations.

use serde_json::{Map, Value};
use vid_protocol::{is_truthy, ErrorInfo};
use vid_transport::debug;

use crate::error::ApiError;
use crate::http::{HttpClient, HttpRequest};

/// Remote operation: is there an active session?
pub const OP_LOGGED_IN: &str = "logged_in";
/// Remote operation: the user's default email for an audience.
pub const OP_GET_DEFAULT_EMAIL: &str = "get_default_email";
/// Remote operation: all of the user's emails for an audience.
pub const OP_GET_EMAILS: &str = "get_emails";

/// Client for the remote identity HTTP API.
pub struct IdentityApi<C> {
    base_url: String,
    client: C,
}

impl<C: HttpClient> IdentityApi<C> {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// A trailing `/` is added if missing so operations append cleanly.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { base_url, client }
    }

    /// API root, always ending in `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Underlying HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// POST `operation` with `output=json` plus every non-empty param.
    ///
    /// Succeeds only on status 200 with a JSON object body.
    pub fn request(
        &self,
        operation: &str,
        params: &[(&str, &str)],
    ) -> Result<Map<String, Value>, ApiError> {
        let uri = format!("{}{}", self.base_url, operation);
        debug(&format!("IdentityService: Making request to {}", uri));

        let fields = core::iter::once(("output", "json"))
            .chain(params.iter().copied().filter(|(_, v)| !v.is_empty()));
        let request = HttpRequest::post(uri.as_str()).with_form_body(fields);

        let success = match self.client.execute(&request).result {
            Ok(success) => success,
            Err(e) => {
                debug(&format!(
                    "IdentityService: Got exception {} in request to {}",
                    e.message(),
                    uri
                ));
                return Err(ApiError::Transport(e.message().into()));
            }
        };

        let text = success.text();
        debug(&format!("IdentityService: Response was {}", text));
        if success.status != 200 {
            return Err(ApiError::Status(success.status));
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(body)) => Ok(body),
            Ok(other) => Err(ApiError::MalformedBody(format!(
                "expected JSON object, got {}",
                other
            ))),
            Err(e) => Err(ApiError::MalformedBody(e.to_string())),
        }
    }

    /// Whether the user has an active session.
    pub fn logged_in(&self) -> Result<bool, ApiError> {
        let body = self.request(OP_LOGGED_IN, &[])?;
        Ok(body.get("success").is_some_and(is_truthy))
    }

    /// The user's default email, scoped to `audience`.
    pub fn get_default_email(&self, audience: &str) -> Result<String, ApiError> {
        let body = accepted(self.request(OP_GET_DEFAULT_EMAIL, &[("audience", audience)])?)?;
        match body.get("email") {
            Some(Value::String(email)) if !email.is_empty() => Ok(email.clone()),
            _ => Err(ApiError::MalformedBody("missing email".into())),
        }
    }

    /// All of the user's emails, scoped to `audience`.
    ///
    /// Accepts either a list of addresses or an object keyed by address.
    pub fn get_emails(&self, audience: &str) -> Result<Vec<String>, ApiError> {
        let body = accepted(self.request(OP_GET_EMAILS, &[("audience", audience)])?)?;
        match body.get("emails") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(Into::into)
                        .ok_or_else(|| ApiError::MalformedBody("non-string email".into()))
                })
                .collect(),
            Some(Value::Object(map)) => Ok(map.keys().cloned().collect()),
            _ => Err(ApiError::MalformedBody("missing emails".into())),
        }
    }
}

/// Require the body's own `success` flag.
fn accepted(body: Map<String, Value>) -> Result<Map<String, Value>, ApiError> {
    if body.get("success").is_some_and(is_truthy) {
        return Ok(body);
    }
    let error = match body.get("error") {
        Some(Value::String(reason)) => Some(ErrorInfo::new(reason.clone())),
        Some(value @ Value::Object(_)) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    };
    Err(ApiError::Rejected(error))
}
