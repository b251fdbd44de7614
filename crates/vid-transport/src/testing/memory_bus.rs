//! In-memory `postMessage` bus.
//!
//! Simulates a set of browsing contexts, each with an origin and an inbound
//! queue. Posting appends to the destination's queue in call order, so
//! per-sender ordering holds the same way it does in the browser.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use crate::envelope::Envelope;
use crate::origin::{ContextId, Origin};
use crate::transport::{Transport, TransportError};

/// Record of a single post accepted by the bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    /// Posting context
    pub from: ContextId,
    /// Destination context
    pub to: ContextId,
    /// Origin the sender required of the destination
    pub target_origin: String,
    /// Raw payload
    pub data: String,
    /// Whether the destination's origin matched and the message was queued
    pub delivered: bool,
}

/// Simulated context state
struct MockContext {
    origin: String,
    open: bool,
    /// Messages pending delivery to this context
    queue: VecDeque<Envelope>,
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    contexts: BTreeMap<ContextId, MockContext>,
    deliveries: Vec<Delivery>,
}

/// Shared in-memory message bus.
///
/// Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct MemoryBus {
    state: Rc<RefCell<BusState>>,
}

impl MemoryBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new context served from `origin` and return its port.
    pub fn open_context(&self, origin: &str) -> MemoryPort {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = ContextId(state.next_id);
        state.contexts.insert(
            id,
            MockContext {
                origin: origin.to_string(),
                open: true,
                queue: VecDeque::new(),
            },
        );
        MemoryPort {
            bus: self.clone(),
            id,
        }
    }

    /// Get a port for an existing context.
    pub fn port(&self, id: ContextId) -> Option<MemoryPort> {
        self.state
            .borrow()
            .contexts
            .contains_key(&id)
            .then(|| MemoryPort {
                bus: self.clone(),
                id,
            })
    }

    /// Close a context; later posts to it fail with `UnknownContext`.
    pub fn close_context(&self, id: ContextId) {
        if let Some(ctx) = self.state.borrow_mut().contexts.get_mut(&id) {
            ctx.open = false;
            ctx.queue.clear();
        }
    }

    /// Whether a context exists and has not been closed.
    pub fn is_open(&self, id: ContextId) -> bool {
        self.state
            .borrow()
            .contexts
            .get(&id)
            .is_some_and(|ctx| ctx.open)
    }

    /// Queue a raw envelope for `to`, bypassing origin checks.
    ///
    /// Used to simulate hostile or malformed senders.
    pub fn inject(&self, to: ContextId, envelope: Envelope) {
        if let Some(ctx) = self.state.borrow_mut().contexts.get_mut(&to) {
            ctx.queue.push_back(envelope);
        }
    }

    /// Every post accepted so far, in order.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.state.borrow().deliveries.clone()
    }

    /// Posts addressed to `to`, in order.
    pub fn deliveries_to(&self, to: ContextId) -> Vec<Delivery> {
        self.state
            .borrow()
            .deliveries
            .iter()
            .filter(|d| d.to == to)
            .cloned()
            .collect()
    }

    /// Forget the delivery log.
    pub fn clear_deliveries(&self) {
        self.state.borrow_mut().deliveries.clear();
    }

    fn post_from(
        &self,
        from: ContextId,
        to: ContextId,
        data: &str,
        target_origin: &Origin,
    ) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        let sender_origin = match state.contexts.get(&from) {
            Some(ctx) => ctx.origin.clone(),
            None => return Err(TransportError::UnknownContext(from)),
        };
        let delivered = match state.contexts.get_mut(&to) {
            Some(ctx) if ctx.open => {
                let matches = Origin::parse(&ctx.origin).as_ref() == Some(target_origin);
                if matches {
                    ctx.queue
                        .push_back(Envelope::new(from, data, sender_origin));
                }
                matches
            }
            _ => return Err(TransportError::UnknownContext(to)),
        };
        state.deliveries.push(Delivery {
            from,
            to,
            target_origin: target_origin.as_str().to_string(),
            data: data.to_string(),
            delivered,
        });
        Ok(())
    }

    fn pop(&self, id: ContextId) -> Option<Envelope> {
        self.state
            .borrow_mut()
            .contexts
            .get_mut(&id)
            .and_then(|ctx| ctx.queue.pop_front())
    }

    fn queued(&self, id: ContextId) -> usize {
        self.state
            .borrow()
            .contexts
            .get(&id)
            .map_or(0, |ctx| ctx.queue.len())
    }
}

/// One context's view of the bus: posts from it, receives into it.
#[derive(Clone)]
pub struct MemoryPort {
    bus: MemoryBus,
    id: ContextId,
}

impl MemoryPort {
    /// This context's handle.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Inbound message stream.
    ///
    /// Each envelope is yielded once; the iterator ends when the queue is
    /// momentarily empty and picks up new arrivals if polled again.
    pub fn on_message(&self) -> Incoming {
        Incoming {
            bus: self.bus.clone(),
            id: self.id,
        }
    }

    /// Number of envelopes waiting in this context's queue.
    pub fn queued(&self) -> usize {
        self.bus.queued(self.id)
    }
}

impl Transport for MemoryPort {
    fn post(
        &self,
        dest: ContextId,
        data: &str,
        target_origin: &Origin,
    ) -> Result<(), TransportError> {
        self.bus.post_from(self.id, dest, data, target_origin)
    }
}

/// Draining iterator over a context's inbound queue.
pub struct Incoming {
    bus: MemoryBus,
    id: ContextId,
}

impl Iterator for Incoming {
    type Item = Envelope;

    fn next(&mut self) -> Option<Envelope> {
        self.bus.pop(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(s: &str) -> Origin {
        Origin::parse(s).unwrap()
    }

    #[test]
    fn test_post_preserves_order() {
        let bus = MemoryBus::new();
        let a = bus.open_context("https://a.example");
        let b = bus.open_context("https://b.example");

        for i in 0..5 {
            a.post(b.id(), &i.to_string(), &origin("https://b.example"))
                .unwrap();
        }

        let received: Vec<String> = b.on_message().map(|e| e.data).collect();
        assert_eq!(received, vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn test_origin_mismatch_is_dropped_silently() {
        let bus = MemoryBus::new();
        let a = bus.open_context("https://a.example");
        let b = bus.open_context("https://b.example");

        a.post(b.id(), "{}", &origin("https://evil.example")).unwrap();

        assert_eq!(b.queued(), 0);
        let log = bus.deliveries();
        assert_eq!(log.len(), 1);
        assert!(!log[0].delivered);
    }

    #[test]
    fn test_post_to_closed_context_fails() {
        let bus = MemoryBus::new();
        let a = bus.open_context("https://a.example");
        let b = bus.open_context("https://b.example");
        bus.close_context(b.id());

        let result = a.post(b.id(), "{}", &origin("https://b.example"));
        assert_eq!(result, Err(TransportError::UnknownContext(b.id())));
        assert!(!bus.is_open(b.id()));
    }

    #[test]
    fn test_incoming_resumes_after_empty() {
        let bus = MemoryBus::new();
        let a = bus.open_context("https://a.example");
        let b = bus.open_context("https://b.example");
        let mut incoming = b.on_message();

        assert!(incoming.next().is_none());
        a.post(b.id(), "late", &origin("https://b.example")).unwrap();
        assert_eq!(incoming.next().map(|e| e.data), Some("late".to_string()));
        assert!(incoming.next().is_none());
    }

    #[test]
    fn test_inject_bypasses_origin() {
        let bus = MemoryBus::new();
        let b = bus.open_context("https://b.example");

        bus.inject(b.id(), Envelope::new(ContextId(99), "raw", "null"));

        let envelope = b.on_message().next().unwrap();
        assert_eq!(envelope.origin(), None);
        assert!(bus.deliveries().is_empty());
    }
}
