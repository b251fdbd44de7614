//! HTTP request/response types and the blocking client trait.

use serde::{Deserialize, Serialize};

// =============================================================================
// HTTP Method
// =============================================================================

/// HTTP request method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    /// HTTP GET
    Get,
    /// HTTP POST
    Post,
}

impl HttpMethod {
    /// Method name as passed to `XMLHttpRequest.open`.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

// =============================================================================
// HTTP Request
// =============================================================================

/// Content type of form-encoded request bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP request issued by the API client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Target URL
    pub url: String,
    /// Request headers as key-value pairs
    pub headers: Vec<(String, String)>,
    /// Request body (optional)
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Create a new POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Set a form-encoded body and its Content-Type header.
    pub fn with_form_body<'a>(mut self, fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut form = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in fields {
            form.append_pair(key, value);
        }
        self.headers
            .push(("Content-Type".into(), FORM_CONTENT_TYPE.into()));
        self.body = Some(form.finish().into_bytes());
        self
    }

    /// Decode a form-encoded body back into key-value pairs.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        self.body
            .as_deref()
            .map(|body| {
                url::form_urlencoded::parse(body)
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Value of a form field, if present.
    pub fn form_field(&self, key: &str) -> Option<String> {
        self.form_fields()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Last path segment of the URL, i.e. the remote operation name.
    pub fn operation(&self) -> &str {
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/').next().unwrap_or_default()
    }
}

// =============================================================================
// HTTP Response
// =============================================================================

/// HTTP response as seen by the API client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// Result of the HTTP request
    pub result: Result<HttpSuccess, NetworkError>,
}

impl HttpResponse {
    /// Create a completed response.
    pub fn ok(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            result: Ok(HttpSuccess {
                status,
                body: body.into(),
            }),
        }
    }

    /// Create a response for a request that never completed.
    pub fn err(error: NetworkError) -> Self {
        Self { result: Err(error) }
    }
}

/// Completed HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSuccess {
    /// HTTP status code (200, 404, etc.)
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

impl HttpSuccess {
    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// =============================================================================
// Network Error
// =============================================================================

/// Errors raised while issuing a request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum NetworkError {
    /// Failed to establish connection
    ConnectionFailed,
    /// Invalid URL format
    InvalidUrl,
    /// The platform raised while sending (message from the exception)
    Other(String),
}

impl NetworkError {
    /// Convert to a user-friendly error message.
    pub fn message(&self) -> &str {
        match self {
            NetworkError::ConnectionFailed => "Connection failed",
            NetworkError::InvalidUrl => "Invalid URL",
            NetworkError::Other(msg) => msg,
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Blocking HTTP client.
///
/// The call does not return until the round-trip completes; in the browser
/// this is a synchronous `XMLHttpRequest` that blocks the service frame's
/// single thread.
pub trait HttpClient {
    /// Execute a request.
    fn execute(&self, request: &HttpRequest) -> HttpResponse;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn execute(&self, request: &HttpRequest) -> HttpResponse {
        (**self).execute(request)
    }
}
