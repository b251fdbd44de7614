//! Browsing-context registry.
//!
//! Endpoints address contexts by [`ContextId`]; this maps those ids to the
//! `Window` proxies the browser hands us (frame content windows, popups,
//! and `MessageEvent.source`).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use vid_transport::{ContextId, Envelope};
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, Window};

#[derive(Default)]
struct Registry {
    next_id: u64,
    windows: BTreeMap<ContextId, Window>,
}

/// Shared `ContextId` ⇄ `Window` table.
///
/// Cloning yields another handle to the same table.
#[derive(Clone, Default)]
pub struct WindowRegistry {
    inner: Rc<RefCell<Registry>>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `window`, allocating one on first sight.
    pub fn register(&self, window: &Window) -> ContextId {
        let mut inner = self.inner.borrow_mut();
        if let Some((id, _)) = inner
            .windows
            .iter()
            .find(|(_, w)| js_sys::Object::is(w.as_ref(), window.as_ref()))
        {
            return *id;
        }
        let id = ContextId(inner.next_id);
        inner.next_id += 1;
        inner.windows.insert(id, window.clone());
        id
    }

    pub fn get(&self, id: ContextId) -> Option<Window> {
        self.inner.borrow().windows.get(&id).cloned()
    }

    pub fn remove(&self, id: ContextId) -> Option<Window> {
        self.inner.borrow_mut().windows.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Turn a `message` event into an [`Envelope`].
    ///
    /// Non-string payloads become an empty string and fail decoding later.
    /// A missing source maps to a context that is never registered.
    pub fn envelope_from(&self, event: &MessageEvent) -> Envelope {
        let source = match event.source() {
            // Cross-origin window proxies fail `instanceof Window`.
            Some(object) => self.register(object.unchecked_ref::<Window>()),
            None => ContextId(u64::MAX),
        };
        let data = event.data().as_string().unwrap_or_default();
        Envelope::new(source, data, event.origin())
    }
}
