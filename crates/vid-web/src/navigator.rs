//! `navigator.id` glue for the hosting page.
//!
//! The wrapper lives in a thread-local [`CapabilitySlot`]; the JS object
//! installed at `navigator.id` only forwards into it. Results for the
//! caller are queued while the slot is borrowed and handed to JS after, so
//! a callback may start a new flow.

use std::cell::RefCell;
use std::rc::Rc;

use vid_protocol::{wire, Message};
use vid_transport::debug;
use vid_wrapper::{CapabilitySlot, InstallOutcome, WrapperConfig, WrapperEndpoint, WrapperError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::dom::{DomHost, PageEvent};
use crate::registry::WindowRegistry;
use crate::transport::WindowTransport;

type PageWrapper = WrapperEndpoint<DomHost, WindowTransport>;

thread_local! {
    static SLOT: RefCell<CapabilitySlot<PageWrapper>> = RefCell::new(CapabilitySlot::new());
    static RESULTS: RefCell<Vec<(js_sys::Function, Message)>> = const { RefCell::new(Vec::new()) };
}

fn navigator() -> Result<web_sys::Navigator, JsValue> {
    web_sys::window()
        .map(|w| w.navigator())
        .ok_or_else(|| JsValue::from_str("no window"))
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Install the wrapper at `navigator.id`.
///
/// `config_json` overrides [`WrapperConfig`] defaults. Returns `false` when
/// an existing capability was left in place.
#[wasm_bindgen(js_name = installNavigatorId)]
pub fn install_navigator_id(config_json: Option<String>) -> Result<bool, JsValue> {
    crate::init_panic_hook();

    let config = match config_json {
        Some(json) => WrapperConfig::from_json(&json).map_err(to_js)?,
        None => WrapperConfig::default(),
    };
    let navigator = navigator()?;
    let existing = js_sys::Reflect::get(&navigator, &"id".into())?;

    let outcome = SLOT.with(|slot| {
        let mut slot = slot.borrow_mut();
        if !existing.is_undefined() && !existing.is_null() && !slot.is_present() {
            adopt_existing(&mut slot, &existing);
        }
        slot.install(|| build_wrapper(config))
    });

    match outcome.map_err(to_js)? {
        InstallOutcome::NotSwizzling => Ok(false),
        InstallOutcome::Installed => {
            js_sys::Reflect::set(&navigator, &"id".into(), &capability_object()?.into())?;
            Ok(true)
        }
        InstallOutcome::Reinstalled(report) => {
            if !report.is_clean() {
                debug(&format!("navigator.id: Unhook incomplete: {:?}", report.failures));
            }
            js_sys::Reflect::set(&navigator, &"id".into(), &capability_object()?.into())?;
            Ok(true)
        }
    }
}

/// A `navigator.id` we did not install this session: unhook it if it is an
/// earlier injection that can be unhooked, otherwise treat it as native.
fn adopt_existing(slot: &mut CapabilitySlot<PageWrapper>, existing: &JsValue) {
    let injected = js_sys::Reflect::get(existing, &"isInjected".into())
        .map(|v| v.is_truthy())
        .unwrap_or(false);
    let unhook = js_sys::Reflect::get(existing, &"unhook".into())
        .ok()
        .and_then(|v| v.dyn_into::<js_sys::Function>().ok());

    match (injected, unhook) {
        (true, Some(unhook)) => {
            debug("navigator.id: Unhooking existing navigator.id.");
            if let Err(e) = unhook.call0(existing) {
                debug(&format!("navigator.id: Previous unhook threw: {:?}", e));
            }
        }
        _ => *slot = CapabilitySlot::with_native(),
    }
}

fn build_wrapper(config: WrapperConfig) -> Result<PageWrapper, WrapperError> {
    let registry = WindowRegistry::new();
    let host = DomHost::new(registry.clone(), Rc::new(on_page_event));
    WrapperEndpoint::new(config, host, WindowTransport::new(registry))
}

/// `{isInjected: true, unhook: null, getVerifiedEmail(callback)}`
fn capability_object() -> Result<js_sys::Object, JsValue> {
    let object = js_sys::Object::new();
    js_sys::Reflect::set(&object, &"isInjected".into(), &JsValue::TRUE)?;
    js_sys::Reflect::set(&object, &"unhook".into(), &JsValue::NULL)?;

    let get_verified_email = Closure::wrap(Box::new(move |callback: js_sys::Function| {
        get_verified_email(callback)
    }) as Box<dyn FnMut(js_sys::Function) -> Result<(), JsValue>>)
    .into_js_value();
    js_sys::Reflect::set(&object, &"getVerifiedEmail".into(), &get_verified_email)?;
    Ok(object)
}

fn get_verified_email(callback: js_sys::Function) -> Result<(), JsValue> {
    let started = SLOT.with(|slot| {
        let mut slot = slot.borrow_mut();
        let wrapper = slot
            .injected_mut()
            .ok_or_else(|| JsValue::from_str("navigator.id is not installed"))?;
        wrapper
            .get_verified_email(move |message| queue_result(callback, message))
            .map_err(to_js)
    });
    flush_results();
    started?;

    // The teardown hook exists from now on.
    let unhook = Closure::wrap(Box::new(unhook) as Box<dyn FnMut()>).into_js_value();
    let current = js_sys::Reflect::get(&navigator()?.into(), &"id".into())?;
    js_sys::Reflect::set(&current, &"unhook".into(), &unhook)?;
    Ok(())
}

fn unhook() {
    let report = SLOT.with(|slot| slot.borrow_mut().unhook());
    match report {
        Some(report) if !report.is_clean() => {
            debug(&format!("navigator.id: Unhook incomplete: {:?}", report.failures))
        }
        Some(_) => {}
        None => return,
    }
    let removed = navigator()
        .and_then(|navigator| js_sys::Reflect::delete_property(&navigator, &"id".into()));
    match removed {
        Ok(true) => {}
        Ok(false) => debug("navigator.id: navigator.id could not be deleted."),
        Err(e) => debug(&format!("navigator.id: Removing navigator.id failed: {:?}", e)),
    }
}

fn on_page_event(event: PageEvent) {
    let outcome = SLOT.with(|slot| {
        let Ok(mut slot) = slot.try_borrow_mut() else {
            debug("navigator.id: Event arrived while busy; dropped.");
            return Ok(());
        };
        let Some(wrapper) = slot.injected_mut() else {
            return Ok(());
        };
        match event {
            PageEvent::FrameLoaded(_) => wrapper.on_frame_load().map(|_| ()),
            PageEvent::Message(envelope) => wrapper.handle_message(&envelope).map(|_| ()),
        }
    });
    if let Err(e) = outcome {
        debug(&format!("navigator.id: {}", e));
    }
    flush_results();
}

fn queue_result(callback: js_sys::Function, message: Message) {
    RESULTS.with(|r| r.borrow_mut().push((callback, message)));
}

/// Hand queued results to their callbacks, outside any slot borrow.
fn flush_results() {
    let ready: Vec<_> = RESULTS.with(|r| r.borrow_mut().drain(..).collect());
    for (callback, message) in ready {
        let value = wire::encode(&message)
            .map_err(to_js)
            .and_then(|json| js_sys::JSON::parse(&json));
        match value {
            Ok(value) => {
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    debug(&format!("navigator.id: Callback threw: {:?}", e));
                }
            }
            Err(e) => debug(&format!("navigator.id: Could not encode result: {:?}", e)),
        }
    }
}
