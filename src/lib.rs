//! WinInput - global keyboard and mouse hooks with sequence detection.
//!
//! Input events captured by a global OS hook are normalized and routed to
//! two kinds of consumers:
//! - flat handlers, called for every key or mouse event
//! - sequences, small automata that fire a callback when a chord, typed word
//!   or click pattern is completed
//!
//! Either kind may consume the event, hiding it from other applications.
//!
//! On Windows the free functions in this crate operate on one process-wide
//! [`InputContext`] backed by the low-level keyboard and mouse hooks. Other
//! platforms can drive an [`InputContext`] with their own [`EventSource`].
//!
//! ```ignore
//! use std::sync::Arc;
//! use wininput::{KeyEvent, KeyHandler};
//!
//! let handler: KeyHandler = Arc::new(|event: &KeyEvent| {
//!     println!("key {}", event.code);
//!     false
//! });
//! wininput::add_key_handler(handler);
//!
//! let hello = [0x48, 0x45, 0x4C, 0x4C, 0x4F].map(KeyEvent::down);
//! wininput::on_key_event(hello, false, || {
//!     println!("hello typed");
//!     false
//! });
//!
//! // ...
//! wininput::shutdown();
//! ```

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod event;
pub mod lifecycle;
pub mod normalize;
pub mod registry;
pub mod sequence;
pub mod source;

#[cfg(windows)]
pub mod winapi_utils;

pub use config::{InputConfig, SequenceConfig};
pub use context::{InputContext, Registration};
pub use dispatcher::Dispatcher;
pub use event::{KeyEvent, KeyKind, Modifiers, MouseEvent};
pub use lifecycle::LifecycleError;
pub use registry::{KeyHandler, MouseHandler};
pub use sequence::SequenceId;
pub use source::{EventSource, HookError};

#[cfg(windows)]
pub use global::*;

#[cfg(windows)]
mod global {
    use super::*;
    use crate::winapi_utils::WindowsHookSource;
    use once_cell::sync::Lazy;

    /// Process-wide input context on the Windows low-level hooks.
    pub static INPUT: Lazy<InputContext<WindowsHookSource>> =
        Lazy::new(|| InputContext::new(WindowsHookSource::new()));

    /// Registers a key handler, starting the hook thread if needed.
    ///
    /// Returns `false` if the hook thread is not running.
    pub fn add_key_handler(handler: KeyHandler) -> bool {
        INPUT.add_key_handler(handler)
    }

    /// Registers a mouse handler, starting the hook thread if needed.
    pub fn add_mouse_handler(handler: MouseHandler) -> bool {
        INPUT.add_mouse_handler(handler)
    }

    pub fn remove_key_handler(handler: &KeyHandler) -> bool {
        INPUT.remove_key_handler(handler)
    }

    pub fn remove_mouse_handler(handler: &MouseHandler) -> bool {
        INPUT.remove_mouse_handler(handler)
    }

    /// See [`InputContext::on_key_event`].
    pub fn on_key_event<I, F>(sequence: I, strict: bool, on_complete: F) -> Registration
    where
        I: IntoIterator<Item = KeyEvent>,
        F: FnMut() -> bool + Send + 'static,
    {
        INPUT.on_key_event(sequence, strict, on_complete)
    }

    /// See [`InputContext::on_mouse_event`].
    pub fn on_mouse_event<I, F>(sequence: I, tolerance: u32, on_complete: F) -> Registration
    where
        I: IntoIterator<Item = MouseEvent>,
        F: FnMut() -> bool + Send + 'static,
    {
        INPUT.on_mouse_event(sequence, tolerance, on_complete)
    }

    pub fn remove_key_event_handler(id: SequenceId) -> bool {
        INPUT.remove_key_event_handler(id)
    }

    pub fn remove_mouse_event_handler(id: SequenceId) -> bool {
        INPUT.remove_mouse_event_handler(id)
    }

    /// Stops the hook thread and waits for the hooks to be removed.
    pub fn shutdown() {
        INPUT.shutdown();
    }
}
