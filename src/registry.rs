//! Flat handler registries.
//!
//! A handler sees every normalized event of its class, key-ups and mouse
//! movement included. Handlers run in registration order and the first one
//! returning `true` stops the rest for that event.

use crate::event::{KeyEvent, MouseEvent};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A stateless event callback. Returns `true` to stop propagation.
///
/// Identity for removal is the identity of the `Arc` allocation, so keep a
/// clone of the handler you registered.
pub type Handler<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

pub type KeyHandler = Handler<KeyEvent>;
pub type MouseHandler = Handler<MouseEvent>;

/// Thread-safe, insertion-ordered list of handlers for one event class.
pub struct HandlerRegistry<E> {
    handlers: Mutex<Vec<Handler<E>>>,
}

impl<E> HandlerRegistry<E> {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Handler<E>>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a handler. The same handler may be registered more than once.
    pub fn add(&self, handler: Handler<E>) {
        self.lock().push(handler);
    }

    /// Removes the first registration of `handler`.
    ///
    /// Returns `false` if it was not registered.
    pub fn remove(&self, handler: &Handler<E>) -> bool {
        let mut handlers = self.lock();
        match handlers.iter().position(|h| same_handler(h, handler)) {
            Some(index) => {
                handlers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs the handlers for one event, holding the lock for the whole pass.
    ///
    /// Returns `true` if a handler asked to stop propagation.
    pub fn dispatch(&self, event: &E) -> bool {
        let handlers = self.lock();
        handlers.iter().any(|handler| handler(event))
    }
}

impl<E> Default for HandlerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for HandlerRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.len())
            .finish()
    }
}

// Compare data pointers only; vtable pointers of the same closure may differ
// between codegen units.
fn same_handler<E>(a: &Handler<E>, b: &Handler<E>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
