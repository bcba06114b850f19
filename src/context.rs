//! The public input context.
//!
//! An [`InputContext`] owns the dispatcher (all four registries) and the
//! worker lifecycle for one event source. Registration calls start the
//! worker on demand and report through their boolean result whether the
//! subsystem is ready; the registration itself is kept either way.

use crate::config::InputConfig;
use crate::dispatcher::Dispatcher;
use crate::event::{KeyEvent, MouseEvent};
use crate::lifecycle::{Lifecycle, LifecycleError};
use crate::registry::{KeyHandler, MouseHandler};
use crate::sequence::{KeyRule, MouseRule, SequenceId};
use crate::source::EventSource;
use std::sync::Arc;

/// Result of registering a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// Id to pass to the matching remove call.
    pub id: SequenceId,
    /// Whether the input worker is running.
    pub ready: bool,
}

/// Handler registries and worker lifecycle bound to one event source.
#[derive(Debug)]
pub struct InputContext<S: EventSource> {
    dispatcher: Arc<Dispatcher>,
    lifecycle: Lifecycle<S>,
}

impl<S: EventSource> InputContext<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, InputConfig::default())
    }

    pub fn with_config(source: S, config: InputConfig) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new()),
            lifecycle: Lifecycle::new(Arc::new(source), config.thread_name),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn source(&self) -> &Arc<S> {
        self.lifecycle.source()
    }

    /// Starts the worker if needed and reports readiness.
    pub fn start(&self) -> Result<(), LifecycleError> {
        self.lifecycle.start(&self.dispatcher)
    }

    fn ensure_started(&self) -> bool {
        match self.start() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Input subsystem not ready");
                false
            }
        }
    }

    /// Registers a handler for every key event. Returns subsystem readiness.
    pub fn add_key_handler(&self, handler: KeyHandler) -> bool {
        let ready = self.ensure_started();
        self.dispatcher.key_handlers().add(handler);
        ready
    }

    /// Registers a handler for every mouse event. Returns subsystem readiness.
    pub fn add_mouse_handler(&self, handler: MouseHandler) -> bool {
        let ready = self.ensure_started();
        self.dispatcher.mouse_handlers().add(handler);
        ready
    }

    /// Returns `false` if `handler` was not registered.
    pub fn remove_key_handler(&self, handler: &KeyHandler) -> bool {
        self.dispatcher.key_handlers().remove(handler)
    }

    /// Returns `false` if `handler` was not registered.
    pub fn remove_mouse_handler(&self, handler: &MouseHandler) -> bool {
        self.dispatcher.mouse_handlers().remove(handler)
    }

    /// Registers a key sequence.
    ///
    /// With `strict`, ctrl/shift/alt must match each template exactly;
    /// otherwise only key codes are compared. `on_complete` runs on the
    /// worker each time the full sequence is typed and returns whether to
    /// consume the completing key.
    pub fn on_key_event<I, F>(&self, sequence: I, strict: bool, on_complete: F) -> Registration
    where
        I: IntoIterator<Item = KeyEvent>,
        F: FnMut() -> bool + Send + 'static,
    {
        let ready = self.ensure_started();
        let id = self
            .dispatcher
            .add_key_sequence(sequence, KeyRule { strict }, Box::new(on_complete));
        Registration { id, ready }
    }

    /// Registers a mouse sequence matched within `tolerance` pixels on each
    /// axis. Mouse movement never advances or resets it.
    pub fn on_mouse_event<I, F>(&self, sequence: I, tolerance: u32, on_complete: F) -> Registration
    where
        I: IntoIterator<Item = MouseEvent>,
        F: FnMut() -> bool + Send + 'static,
    {
        let ready = self.ensure_started();
        let id = self
            .dispatcher
            .add_mouse_sequence(sequence, MouseRule { tolerance }, Box::new(on_complete));
        Registration { id, ready }
    }

    pub fn remove_key_event_handler(&self, id: SequenceId) -> bool {
        self.dispatcher.key_sequences().remove(id)
    }

    pub fn remove_mouse_event_handler(&self, id: SequenceId) -> bool {
        self.dispatcher.mouse_sequences().remove(id)
    }

    /// Stops the worker, blocking until its hooks are released.
    ///
    /// Registrations survive; the next registration call restarts the worker.
    pub fn shutdown(&self) {
        self.lifecycle.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    pub fn is_failed(&self) -> bool {
        self.lifecycle.is_failed()
    }
}
