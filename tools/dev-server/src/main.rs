//! Development Server for the Verified Email Relay
//!
//! Serves the demo pages and the wasm bundle from `WEB_ROOT`, plus a
//! stand-in identity API under `/1/`. Open the relying-party page on
//! `localhost` and point it at `127.0.0.1` as the identity origin: the two
//! hostnames are distinct origins, so the full cross-origin flow runs on
//! one server.

mod api;

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::Response,
    routing::get_service,
    Router,
};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;

use crate::api::ApiState;

/// Email the stand-in API hands out.
const DEMO_EMAIL: &str = "demo@example.com";

fn app(web_root: &str, state: ApiState) -> Router {
    let serve_dir = ServeDir::new(web_root);

    api::routes(state)
        .fallback_service(get_service(serve_dir).handle_error(|_| async {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }))
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(fix_mime_types)))
}

#[tokio::main]
async fn main() {
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let web_root = std::env::var("WEB_ROOT").unwrap_or_else(|_| "web".to_string());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let app = app(&web_root, ApiState::new(DEMO_EMAIL));

    println!("╔═══════════════════════════════════════════════════╗");
    println!("║       Verified Email Relay Development Server     ║");
    println!("╠═══════════════════════════════════════════════════╣");
    println!("║  Page:     http://localhost:{}                  ║", port);
    println!("║  Identity: http://127.0.0.1:{}                  ║", port);
    println!("║  Press Ctrl+C to stop                             ║");
    println!("╚═══════════════════════════════════════════════════╝");
    println!();

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Fix MIME types for module scripts and wasm
async fn fix_mime_types(request: Request<Body>, next: axum::middleware::Next) -> Response<Body> {
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    let content_type = if path.ends_with(".js") || path.ends_with(".mjs") {
        Some("application/javascript; charset=utf-8")
    } else if path.ends_with(".wasm") {
        Some("application/wasm")
    } else if path.ends_with(".html") {
        Some("text/html; charset=utf-8")
    } else {
        None
    };
    if let Some(content_type) = content_type {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(app: &Router, request: Request<Body>) -> Value {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let state = ApiState::new("alice@example.com");
        let app = app("web", state.clone());

        let body = json_body(&app, form_post("/1/logged_in", "output=json")).await;
        assert_eq!(body, json!({"success": false}));

        let body = json_body(
            &app,
            form_post("/1/get_default_email", "output=json&audience=https%3A%2F%2Frp.example"),
        )
        .await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"]["code"], json!(401));

        json_body(&app, form_post("/1/login", "")).await;
        assert!(state.is_logged_in());

        let body = json_body(
            &app,
            form_post("/1/get_default_email", "output=json&audience=https%3A%2F%2Frp.example"),
        )
        .await;
        assert_eq!(body, json!({"success": true, "email": "alice@example.com"}));

        let body = json_body(&app, form_post("/1/get_emails", "output=json")).await;
        assert_eq!(body, json!({"success": true, "emails": ["alice@example.com"]}));

        json_body(&app, form_post("/1/logout", "")).await;
        assert!(!state.is_logged_in());
    }

    #[tokio::test]
    async fn test_login_page_served() {
        let app = app("web", ApiState::new(DEMO_EMAIL));
        let request = Request::builder()
            .uri("/1/login")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("reportLogin"));
    }

    #[tokio::test]
    async fn test_service_frame_stops_holding_messages() {
        let web_root = concat!(env!("CARGO_MANIFEST_DIR"), "/../../web");
        let app = app(web_root, ApiState::new(DEMO_EMAIL));
        let request = Request::builder()
            .uri("/s/html/service_iframe.html")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        // The holding listener goes away once the service is running, before
        // held messages are replayed.
        let started = html.find("startIdentityService(JSON").unwrap();
        let released = html
            .find(r#"removeEventListener("message", window.holdEarlyMessage)"#)
            .unwrap();
        let replayed = html.find("earlyMessages.splice").unwrap();
        assert!(started < released && released < replayed);
    }
}
