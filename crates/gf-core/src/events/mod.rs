//! Typed event emitters
//!
//! Each emitter carries one event type and an ordered list of handlers.
//! Handlers fire in subscription order and are removed by the id returned
//! from `subscribe`.

use std::fmt;

use parking_lot::Mutex;
use uuid::Uuid;

/// Handle returned when subscribing to an emitter
pub type SubscriptionId = Uuid;

/// Handler trait for event handlers
pub trait EventHandler<E>: Send {
    fn handle(&mut self, event: &E);
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<E, F> EventHandler<E> for ClosureEventHandler<F>
where
    F: FnMut(&E) + Send,
{
    fn handle(&mut self, event: &E) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<E, F>(f: F) -> Box<dyn EventHandler<E>>
where
    E: 'static,
    F: FnMut(&E) + Send + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}

/// Emitter for a single event type
pub struct Emitter<E> {
    handlers: Mutex<Vec<(SubscriptionId, Box<dyn EventHandler<E>>)>>,
}

impl<E: 'static> Emitter<E> {
    /// Create an emitter with no handlers
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe a boxed handler
    pub fn subscribe(&self, handler: Box<dyn EventHandler<E>>) -> SubscriptionId {
        let id = Uuid::new_v4();
        self.handlers.lock().push((id, handler));
        id
    }

    /// Subscribe a closure
    pub fn subscribe_fn<F>(&self, f: F) -> SubscriptionId
    where
        F: FnMut(&E) + Send + 'static,
    {
        self.subscribe(handler_from_fn(f))
    }

    /// Remove a handler, returns false if the id was not subscribed here
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    /// Deliver an event to every handler.
    ///
    /// Handlers must not subscribe to this emitter while it fires.
    pub fn fire(&self, event: &E) {
        let mut handlers = self.handlers.lock();
        for (_, handler) in handlers.iter_mut() {
            handler.handle(event);
        }
    }

    /// Number of live subscriptions
    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }
}

impl<E: 'static> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("handlers", &self.handlers.lock().len())
            .finish()
    }
}
