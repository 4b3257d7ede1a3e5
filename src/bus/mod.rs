//! Deterministic publish/subscribe dispatcher
//!
//! The live bot's bus schedules each handler as a task on the event loop.
//! Backtesting needs the same subscribe/publish surface with all concurrency
//! collapsed into a single causal thread of control: `publish` invokes every
//! registered handler directly, in registration order, and does not return
//! until they — and anything they transitively publish — have completed.
//! The call stack encodes causal order exactly.

use crate::error::{BacktestError, Result};
use crate::events::{Event, EventKind};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A subscriber on the bus.
///
/// Handlers receive the bus itself so they can publish downstream events
/// (e.g. a strategy emitting an `OrderIntent`) without holding references
/// to other subscribers. A handler must not publish an event kind it is
/// itself subscribed to; that re-entrant self-dispatch panics, which is the
/// intended fail-fast outcome.
pub trait EventHandler {
    fn on_event(&mut self, event: &Event, bus: &EventBus) -> anyhow::Result<()>;
}

pub type SharedHandler = Rc<RefCell<dyn EventHandler>>;

/// Single-threaded synchronous event bus
#[derive(Default)]
pub struct EventBus {
    subscribers: RefCell<HashMap<EventKind, Vec<SharedHandler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind. Handlers fire in registration
    /// order.
    pub fn subscribe(&self, kind: EventKind, handler: SharedHandler) {
        self.subscribers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(handler);
    }

    /// Synchronously dispatch an event to every handler registered for its
    /// kind. A handler error aborts the dispatch and propagates; partial
    /// strategy state is worse than a hard stop.
    pub fn publish(&self, event: &Event) -> Result<()> {
        let kind = event.kind();
        // Snapshot the handler list so a nested publish (or a handler that
        // subscribes mid-run) never observes the registry mid-mutation.
        let handlers: Vec<SharedHandler> = self
            .subscribers
            .borrow()
            .get(&kind)
            .map(|hs| hs.to_vec())
            .unwrap_or_default();

        for handler in handlers {
            handler
                .borrow_mut()
                .on_event(event, self)
                .map_err(|source| BacktestError::Handler { kind, source })?;
        }
        Ok(())
    }

    /// Number of handlers registered for a kind
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers
            .borrow()
            .get(&kind)
            .map(|hs| hs.len())
            .unwrap_or(0)
    }
}
