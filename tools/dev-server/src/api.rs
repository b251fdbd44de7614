//! Stand-in remote identity API.
//!
//! Answers the same form-encoded POSTs as the real service under `/1/`,
//! backed by a single in-memory session flag. Enough to drive the wrapper,
//! service frame, and login popup locally.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Form, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Shared server state.
#[derive(Clone)]
pub struct ApiState {
    logged_in: Arc<AtomicBool>,
    email: Arc<str>,
}

impl ApiState {
    pub fn new(email: &str) -> Self {
        Self {
            logged_in: Arc::new(AtomicBool::new(false)),
            email: Arc::from(email),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    fn set_logged_in(&self, value: bool) {
        self.logged_in.store(value, Ordering::SeqCst);
    }
}

/// Form fields of interest. `output` is ignored: the answer is always JSON.
#[derive(Debug, Default, Deserialize)]
pub struct ApiParams {
    pub audience: Option<String>,
}

pub fn routes(state: ApiState) -> Router {
    Router::new()
        .route("/1/logged_in", post(logged_in))
        .route("/1/get_default_email", post(get_default_email))
        .route("/1/get_emails", post(get_emails))
        .route("/1/login", get(login_page).post(login))
        .route("/1/logout", post(logout))
        .with_state(state)
}

async fn logged_in(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({"success": state.is_logged_in()}))
}

fn not_logged_in() -> Json<Value> {
    Json(json!({"success": false, "error": {"code": 401, "reason": "not logged in"}}))
}

async fn get_default_email(
    State(state): State<ApiState>,
    Form(params): Form<ApiParams>,
) -> Json<Value> {
    if !state.is_logged_in() {
        return not_logged_in();
    }
    println!(
        "[api] get_default_email for audience {}",
        params.audience.as_deref().unwrap_or("<none>")
    );
    Json(json!({"success": true, "email": &*state.email}))
}

async fn get_emails(State(state): State<ApiState>, Form(params): Form<ApiParams>) -> Json<Value> {
    if !state.is_logged_in() {
        return not_logged_in();
    }
    println!(
        "[api] get_emails for audience {}",
        params.audience.as_deref().unwrap_or("<none>")
    );
    Json(json!({"success": true, "emails": [&*state.email]}))
}

async fn login(State(state): State<ApiState>) -> Json<Value> {
    state.set_logged_in(true);
    Json(json!({"success": true}))
}

async fn logout(State(state): State<ApiState>) -> Json<Value> {
    state.set_logged_in(false);
    Json(json!({"success": true}))
}

async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

const LOGIN_PAGE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Sign in</title></head>
<body>
  <p>Sign in to share your verified email?</p>
  <button id="yes">Sign in</button>
  <button id="no">Cancel</button>
  <script type="module">
    import init, { reportLogin } from "/pkg/vid_web.js";
    await init();
    const opener = document.referrer ? new URL(document.referrer).origin : "";
    document.getElementById("yes").onclick = async () => {
      await fetch("/1/login", { method: "POST" });
      reportLogin(true, opener);
    };
    document.getElementById("no").onclick = () => reportLogin(false, opener);
  </script>
</body>
</html>
"#;
