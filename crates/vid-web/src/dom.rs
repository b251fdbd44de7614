//! DOM-backed page host.
//!
//! Creates the hidden service frame and the login popup through `web-sys`,
//! registers their windows with the shared [`WindowRegistry`], and forwards
//! load and message events to an [`EventSink`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use vid_transport::{ContextId, Envelope};
use vid_wrapper::{HostError, PageHost, PopupFeatures};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlIFrameElement, MessageEvent, Window};

use crate::registry::WindowRegistry;

/// Page events the wrapper reacts to.
#[derive(Debug)]
pub enum PageEvent {
    FrameLoaded(ContextId),
    Message(Envelope),
}

/// Receiver for [`PageEvent`]s.
pub type EventSink = Rc<dyn Fn(PageEvent)>;

struct FrameEntry {
    element: HtmlIFrameElement,
    on_load: Option<js_sys::Function>,
}

/// [`PageHost`] over the real document.
pub struct DomHost {
    registry: WindowRegistry,
    sink: EventSink,
    frames: RefCell<BTreeMap<ContextId, FrameEntry>>,
    on_message: RefCell<Option<js_sys::Function>>,
}

fn dom_err(e: JsValue) -> HostError {
    HostError::Dom(format!("{:?}", e))
}

fn window() -> Result<Window, HostError> {
    web_sys::window().ok_or_else(|| HostError::Dom("no window".into()))
}

impl DomHost {
    pub fn new(registry: WindowRegistry, sink: EventSink) -> Self {
        Self {
            registry,
            sink,
            frames: RefCell::new(BTreeMap::new()),
            on_message: RefCell::new(None),
        }
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    /// Listener functions are handed to JS for good (`into_js_value`), so
    /// removing one from inside its own invocation is safe.
    fn listen_for_messages(&self, window: &Window) -> Result<(), HostError> {
        if self.on_message.borrow().is_some() {
            return Ok(());
        }
        let sink = self.sink.clone();
        let registry = self.registry.clone();
        let listener: js_sys::Function = Closure::wrap(Box::new(move |event: MessageEvent| {
            sink(PageEvent::Message(registry.envelope_from(&event)));
        }) as Box<dyn FnMut(MessageEvent)>)
        .into_js_value()
        .unchecked_into();

        window
            .add_event_listener_with_callback_and_bool("message", &listener, true)
            .map_err(dom_err)?;
        *self.on_message.borrow_mut() = Some(listener);
        Ok(())
    }
}

impl PageHost for DomHost {
    fn create_hidden_frame(&self, src: &str) -> Result<ContextId, HostError> {
        let window = window()?;
        let document = window
            .document()
            .ok_or_else(|| HostError::Dom("no document".into()))?;
        let body = document
            .body()
            .ok_or_else(|| HostError::Dom("no document body".into()))?;

        let iframe: HtmlIFrameElement = document
            .create_element("iframe")
            .map_err(dom_err)?
            .dyn_into()
            .map_err(|_| HostError::Dom("created element is not an iframe".into()))?;
        iframe
            .style()
            .set_property("display", "none")
            .map_err(dom_err)?;
        iframe.set_src(src);
        body.append_child(&iframe).map_err(dom_err)?;

        let content = iframe
            .content_window()
            .ok_or_else(|| HostError::Dom("frame has no content window".into()))?;
        let id = self.registry.register(&content);

        let sink = self.sink.clone();
        let on_load: js_sys::Function = Closure::wrap(Box::new(move || {
            sink(PageEvent::FrameLoaded(id));
        }) as Box<dyn FnMut()>)
        .into_js_value()
        .unchecked_into();
        iframe
            .add_event_listener_with_callback_and_bool("load", &on_load, true)
            .map_err(dom_err)?;
        self.listen_for_messages(&window)?;

        self.frames.borrow_mut().insert(
            id,
            FrameEntry {
                element: iframe,
                on_load: Some(on_load),
            },
        );
        Ok(id)
    }

    fn open_popup(
        &self,
        uri: &str,
        target: &str,
        features: &PopupFeatures,
    ) -> Result<ContextId, HostError> {
        let popup = window()?
            .open_with_url_and_target_and_features(uri, target, &features.to_string())
            .map_err(dom_err)?
            .ok_or(HostError::PopupBlocked)?;
        Ok(self.registry.register(&popup))
    }

    fn close_popup(&self, popup: ContextId) -> Result<(), HostError> {
        let window = self
            .registry
            .remove(popup)
            .ok_or(HostError::NotFound(popup))?;
        window.close().map_err(dom_err)
    }

    fn remove_message_listener(&self, frame: ContextId) -> Result<(), HostError> {
        let listener = self
            .on_message
            .borrow_mut()
            .take()
            .ok_or(HostError::NotFound(frame))?;
        window()?
            .remove_event_listener_with_callback_and_bool("message", &listener, true)
            .map_err(dom_err)
    }

    fn remove_load_listener(&self, frame: ContextId) -> Result<(), HostError> {
        let mut frames = self.frames.borrow_mut();
        let entry = frames.get_mut(&frame).ok_or(HostError::NotFound(frame))?;
        let on_load = entry.on_load.take().ok_or(HostError::NotFound(frame))?;
        entry
            .element
            .remove_event_listener_with_callback_and_bool("load", &on_load, true)
            .map_err(dom_err)
    }

    fn remove_frame(&self, frame: ContextId) -> Result<(), HostError> {
        let entry = self
            .frames
            .borrow_mut()
            .remove(&frame)
            .ok_or(HostError::NotFound(frame))?;
        self.registry.remove(frame);
        entry.element.remove();
        Ok(())
    }
}
