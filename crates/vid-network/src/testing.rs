//! Scripted HTTP client for tests.
//!
//! Responses are queued per remote operation (last URL segment). The final
//! queued response for an operation repeats, so a test scripting
//! `logged_in → true` once gets that answer for every call.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use serde_json::Value;

use crate::http::{HttpClient, HttpRequest, HttpResponse, NetworkError};

#[derive(Default)]
struct Script {
    routes: BTreeMap<String, VecDeque<HttpResponse>>,
    requests: Vec<HttpRequest>,
}

/// HTTP client answering from a script and recording every request.
///
/// Cloning yields another handle to the same script.
#[derive(Clone, Default)]
pub struct ScriptedHttp {
    script: Rc<RefCell<Script>>,
}

impl ScriptedHttp {
    /// Create a client with no scripted routes.
    ///
    /// Unscripted operations fail with `NetworkError::ConnectionFailed`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `operation`.
    pub fn respond(&self, operation: &str, response: HttpResponse) {
        self.script
            .borrow_mut()
            .routes
            .entry(operation.to_string())
            .or_default()
            .push_back(response);
    }

    /// Queue a JSON response for `operation`.
    pub fn respond_json(&self, operation: &str, status: u16, body: Value) {
        self.respond(operation, HttpResponse::ok(status, body.to_string()));
    }

    /// Every request executed so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.script.borrow().requests.clone()
    }

    /// Number of requests made for `operation`.
    pub fn request_count(&self, operation: &str) -> usize {
        self.script
            .borrow()
            .requests
            .iter()
            .filter(|r| r.operation() == operation)
            .count()
    }
}

impl HttpClient for ScriptedHttp {
    fn execute(&self, request: &HttpRequest) -> HttpResponse {
        let mut script = self.script.borrow_mut();
        script.requests.push(request.clone());

        let Some(queue) = script.routes.get_mut(request.operation()) else {
            return HttpResponse::err(NetworkError::ConnectionFailed);
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_else(|| HttpResponse::err(NetworkError::ConnectionFailed))
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| HttpResponse::err(NetworkError::ConnectionFailed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_response_repeats() {
        let http = ScriptedHttp::new();
        http.respond_json("logged_in", 200, json!({"success": false}));
        http.respond_json("logged_in", 200, json!({"success": true}));

        let req = HttpRequest::post("http://id.example/1/logged_in");
        let bodies: Vec<String> = (0..3)
            .map(|_| match http.execute(&req).result {
                Ok(s) => s.text(),
                Err(e) => panic!("unexpected error {:?}", e),
            })
            .collect();

        assert_eq!(
            bodies,
            vec![
                r#"{"success":false}"#.to_string(),
                r#"{"success":true}"#.to_string(),
                r#"{"success":true}"#.to_string(),
            ]
        );
        assert_eq!(http.request_count("logged_in"), 3);
    }

    #[test]
    fn test_unscripted_operation_fails() {
        let http = ScriptedHttp::new();
        let resp = http.execute(&HttpRequest::post("http://id.example/1/get_emails"));
        assert_eq!(resp.result, Err(NetworkError::ConnectionFailed));
    }
}
