use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// Events emitted by the playback controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The active source played to its natural end without interruption.
    TrackEnded,
}

/// Handle returned by [`EventHub::subscribe`]; pass to `unsubscribe`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerId(u64);

type Handler = Rc<dyn Fn(PlayerEvent)>;

struct Registered {
    id: u64,
    event: PlayerEvent,
    handler: Handler,
}

struct Inner {
    next_id: u64,
    listeners: Vec<Registered>,
}

/// Synchronous fire-and-forget event dispatch with per-listener isolation:
/// a listener that panics is caught and logged, and the remaining listeners
/// still run.
#[derive(Clone)]
pub struct EventHub {
    inner: Rc<RefCell<Inner>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn subscribe(&self, event: PlayerEvent, handler: impl Fn(PlayerEvent) + 'static) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.listeners.push(Registered {
            id,
            event,
            handler: Rc::new(handler),
        });
        ListenerId(id)
    }

    /// Returns false when the id was not (or is no longer) registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|l| l.id != id.0);
        inner.listeners.len() != before
    }

    pub fn emit(&self, event: PlayerEvent) {
        // Snapshot first so handlers may subscribe/unsubscribe during dispatch
        let handlers: Vec<Handler> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.event == event)
            .map(|l| Rc::clone(&l.handler))
            .collect();
        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                log::error!("{:?} listener panicked; continuing with remaining listeners", event);
            }
        }
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().listeners.clear();
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
