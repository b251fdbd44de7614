//! In-memory page host for tests.
//!
//! Frames and popups become contexts on a shared [`MemoryBus`], so a test
//! can run a real identity service behind the frame and post as the popup.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use vid_transport::{ContextId, MemoryBus, MemoryPort};

use crate::endpoint::TeardownStep;
use crate::host::{HostError, PageHost};
use crate::popup::PopupFeatures;

/// A hidden frame created through the mock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockFrame {
    pub id: ContextId,
    pub src: String,
    /// Still in the document
    pub attached: bool,
    pub load_listener: bool,
    pub message_listener: bool,
}

/// A popup window opened through the mock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockPopup {
    pub id: ContextId,
    pub uri: String,
    pub target: String,
    pub features: PopupFeatures,
    pub open: bool,
}

#[derive(Default)]
struct HostState {
    frames: BTreeMap<ContextId, MockFrame>,
    popups: BTreeMap<ContextId, MockPopup>,
    block_popups: bool,
    failing_steps: BTreeSet<TeardownStep>,
}

/// Mock page host for unit testing.
///
/// Cloning yields another handle to the same page.
#[derive(Clone)]
pub struct MockHost {
    bus: MemoryBus,
    state: Rc<RefCell<HostState>>,
}

/// `scheme://host[:port]` part of an absolute URL.
fn origin_of(url: &str) -> String {
    match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            let host_end = rest.find('/').unwrap_or(rest.len());
            url[..scheme_end + 3 + host_end].to_string()
        }
        None => "null".to_string(),
    }
}

impl MockHost {
    /// Create a host whose frames and popups live on `bus`.
    pub fn new(bus: &MemoryBus) -> Self {
        Self {
            bus: bus.clone(),
            state: Rc::new(RefCell::new(HostState::default())),
        }
    }

    /// Make every subsequent `open_popup` fail as if blocked.
    pub fn block_popups(&self, block: bool) {
        self.state.borrow_mut().block_popups = block;
    }

    /// Make a teardown step fail from now on.
    pub fn fail_teardown(&self, step: TeardownStep) {
        self.state.borrow_mut().failing_steps.insert(step);
    }

    /// Every frame created so far.
    pub fn frames(&self) -> Vec<MockFrame> {
        self.state.borrow().frames.values().cloned().collect()
    }

    /// One frame by id.
    pub fn frame(&self, id: ContextId) -> Option<MockFrame> {
        self.state.borrow().frames.get(&id).cloned()
    }

    /// Every popup opened so far.
    pub fn popups(&self) -> Vec<MockPopup> {
        self.state.borrow().popups.values().cloned().collect()
    }

    /// One popup by id.
    pub fn popup(&self, id: ContextId) -> Option<MockPopup> {
        self.state.borrow().popups.get(&id).cloned()
    }

    /// Number of popups still open.
    pub fn open_popup_count(&self) -> usize {
        self.state.borrow().popups.values().filter(|p| p.open).count()
    }

    /// Bus port for a frame or popup, to post or read as that context.
    pub fn port(&self, id: ContextId) -> Option<MemoryPort> {
        self.bus.port(id)
    }

    fn check_step(&self, step: TeardownStep) -> Result<(), HostError> {
        if self.state.borrow().failing_steps.contains(&step) {
            return Err(HostError::Dom(format!("{:?} removal failed", step)));
        }
        Ok(())
    }

    fn with_frame(
        &self,
        frame: ContextId,
        step: TeardownStep,
        f: impl FnOnce(&mut MockFrame),
    ) -> Result<(), HostError> {
        self.check_step(step)?;
        let mut state = self.state.borrow_mut();
        let entry = state
            .frames
            .get_mut(&frame)
            .ok_or(HostError::NotFound(frame))?;
        f(entry);
        Ok(())
    }
}

impl PageHost for MockHost {
    fn create_hidden_frame(&self, src: &str) -> Result<ContextId, HostError> {
        let id = self.bus.open_context(&origin_of(src)).id();
        self.state.borrow_mut().frames.insert(
            id,
            MockFrame {
                id,
                src: src.to_string(),
                attached: true,
                load_listener: true,
                message_listener: true,
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
        if self.state.borrow().block_popups {
            return Err(HostError::PopupBlocked);
        }
        let id = self.bus.open_context(&origin_of(uri)).id();
        self.state.borrow_mut().popups.insert(
            id,
            MockPopup {
                id,
                uri: uri.to_string(),
                target: target.to_string(),
                features: *features,
                open: true,
            },
        );
        Ok(id)
    }

    fn close_popup(&self, popup: ContextId) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        let entry = state
            .popups
            .get_mut(&popup)
            .ok_or(HostError::NotFound(popup))?;
        entry.open = false;
        self.bus.close_context(popup);
        Ok(())
    }

    fn remove_message_listener(&self, frame: ContextId) -> Result<(), HostError> {
        self.with_frame(frame, TeardownStep::MessageListener, |f| {
            f.message_listener = false
        })
    }

    fn remove_load_listener(&self, frame: ContextId) -> Result<(), HostError> {
        self.with_frame(frame, TeardownStep::LoadListener, |f| f.load_listener = false)
    }

    fn remove_frame(&self, frame: ContextId) -> Result<(), HostError> {
        self.with_frame(frame, TeardownStep::Frame, |f| f.attached = false)?;
        self.bus.close_context(frame);
        Ok(())
    }
}
