//! Windows backend.
//!
//! Safe wrappers around the low-level hook, message loop and key state APIs,
//! and the [`WindowsHookSource`] built on them.

pub mod hooks;
pub mod keyboard;
pub mod message_loop;
pub mod source;

pub use hooks::*;
pub use keyboard::*;
pub use message_loop::*;
pub use source::*;
