//! Service frame glue.
//!
//! `startIdentityService` runs once in the hidden frame: it builds the
//! [`IdentityService`] over `postMessage` and blocking XHR and feeds it
//! every `message` event the frame receives.

use std::cell::RefCell;

use vid_service::{IdentityService, ServiceConfig};
use vid_transport::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::MessageEvent;

use crate::registry::WindowRegistry;
use crate::transport::WindowTransport;
use crate::xhr::XhrClient;

type FrameService = IdentityService<WindowTransport, XhrClient>;

thread_local! {
    static SERVICE: RefCell<Option<FrameService>> = const { RefCell::new(None) };
}

/// Start the identity service in this frame.
///
/// `config_json` overrides [`ServiceConfig`] defaults. Calling it again
/// while running is a no-op.
#[wasm_bindgen(js_name = startIdentityService)]
pub fn start_identity_service(config_json: Option<String>) -> Result<(), JsValue> {
    crate::init_panic_hook();

    if SERVICE.with(|s| s.borrow().is_some()) {
        debug("IdentityService: Already running.");
        return Ok(());
    }

    let config = match config_json {
        Some(json) => {
            ServiceConfig::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?
        }
        None => ServiceConfig::default(),
    };
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

    let registry = WindowRegistry::new();
    let service = IdentityService::new(config, WindowTransport::new(registry.clone()), XhrClient::new());
    debug(&format!(
        "IdentityService: Started against {}",
        service.api().base_url()
    ));
    SERVICE.with(|s| *s.borrow_mut() = Some(service));

    let listener: js_sys::Function = Closure::wrap(Box::new(move |event: MessageEvent| {
        let envelope = registry.envelope_from(&event);
        SERVICE.with(|s| {
            let mut service = s.borrow_mut();
            let Some(service) = service.as_mut() else {
                return;
            };
            match service.handle_post_message(&envelope) {
                Ok(handled) => debug(&format!("IdentityService: {:?}", handled)),
                Err(e) => debug(&format!("IdentityService: Send failed: {}", e)),
            }
        });
    }) as Box<dyn FnMut(MessageEvent)>)
    .into_js_value()
    .unchecked_into();

    window.add_event_listener_with_callback_and_bool("message", &listener, true)
}
