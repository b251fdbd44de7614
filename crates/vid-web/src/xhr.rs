//! Synchronous XHR client for the remote identity API.
//!
//! The service frame blocks on each remote call, same as the API contract
//! expects: one request, one answer, before the handler continues.

use vid_network::{HttpClient, HttpRequest, HttpResponse, NetworkError};
use wasm_bindgen::JsValue;
use web_sys::XmlHttpRequest;

/// [`HttpClient`] over blocking `XMLHttpRequest`.
#[derive(Clone, Copy, Debug, Default)]
pub struct XhrClient;

impl XhrClient {
    pub fn new() -> Self {
        Self
    }

    fn try_execute(&self, request: &HttpRequest) -> Result<HttpResponse, JsValue> {
        let xhr = XmlHttpRequest::new()?;
        xhr.open_with_async(request.method.as_str(), &request.url, false)?;
        for (name, value) in &request.headers {
            xhr.set_request_header(name, value)?;
        }
        match &request.body {
            Some(body) => xhr.send_with_opt_str(Some(&String::from_utf8_lossy(body)))?,
            None => xhr.send()?,
        }

        let status = xhr.status()?;
        // Status 0 means the request never got an HTTP answer.
        if status == 0 {
            return Ok(HttpResponse::err(NetworkError::ConnectionFailed));
        }
        let body = xhr.response_text()?.unwrap_or_default();
        Ok(HttpResponse::ok(status, body))
    }
}

impl HttpClient for XhrClient {
    fn execute(&self, request: &HttpRequest) -> HttpResponse {
        self.try_execute(request).unwrap_or_else(|e| {
            let reason = js_sys::Reflect::get(&e, &"message".into())
                .ok()
                .and_then(|v| v.as_string())
                .unwrap_or_else(|| format!("{:?}", e));
            HttpResponse::err(NetworkError::Other(reason))
        })
    }
}
