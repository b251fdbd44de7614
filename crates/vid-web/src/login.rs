//! Login popup side.
//!
//! The login page calls `reportLogin` once authentication finishes. The
//! outcome goes to the page that opened the popup, never to the service
//! frame directly; the wrapper there relays it with the right mailbox.

use vid_protocol::{Message, Operation};
use vid_transport::{debug, send, Origin};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

use crate::registry::WindowRegistry;
use crate::transport::WindowTransport;

/// Post `{operation:"login", success}` to `window.opener` at `opener_origin`.
#[wasm_bindgen(js_name = reportLogin)]
pub fn report_login(success: bool, opener_origin: &str) -> Result<(), JsValue> {
    let opener_origin = Origin::parse(opener_origin)
        .ok_or_else(|| JsValue::from_str("Refusing to send to open origin"))?;
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let opener = window.opener()?;
    if opener.is_null() || opener.is_undefined() {
        return Err(JsValue::from_str("login page has no opener"));
    }

    let registry = WindowRegistry::new();
    let dest = registry.register(opener.unchecked_ref::<Window>());
    let login = Message::new(Operation::Login).with_field("success", success);
    debug(&format!("login: Reporting success={} to {}", success, opener_origin));
    send(&WindowTransport::new(registry), dest, &login, Some(&opener_origin))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
