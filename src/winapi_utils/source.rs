//! `WH_KEYBOARD_LL` / `WH_MOUSE_LL` event source.
//!
//! The hook callbacks decode the Windows hook structures into raw
//! notifications and hand them to the dispatcher of the subscription active
//! on the worker thread.
//!
//! # Performance Critical
//!
//! The callbacks execute synchronously in the Windows input pipeline. Any
//! delay here causes system-wide input lag, and a callback that exceeds the
//! system timeout gets the hook silently removed.

use super::hooks::{call_next_hook, HookGuard};
use super::keyboard::AsyncModifiers;
use super::message_loop::{
    current_thread_id, ensure_message_queue, post_quit_message, run_message_loop,
};
use crate::dispatcher::Dispatcher;
use crate::normalize::{RawKeyEvent, RawMouseEvent};
use crate::source::{EventSource, HookError};
use std::cell::RefCell;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    HC_ACTION, KBDLLHOOKSTRUCT, LLKHF_INJECTED, LLMHF_INJECTED, MSLLHOOKSTRUCT, WM_KEYDOWN,
    WM_SYSKEYDOWN,
};

thread_local! {
    /// Dispatcher for hooks installed on this thread.
    static ACTIVE: RefCell<Option<Arc<Dispatcher>>> = const { RefCell::new(None) };
}

/// Event source backed by the global low-level keyboard and mouse hooks.
#[derive(Debug, Default)]
pub struct WindowsHookSource {
    /// Id of the thread pumping messages, 0 when none.
    thread_id: AtomicU32,
}

impl WindowsHookSource {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Installed hooks. Dropping it uninstalls both.
pub struct WindowsSubscription {
    _keyboard: HookGuard,
    _mouse: HookGuard,
}

impl EventSource for WindowsHookSource {
    type Subscription = WindowsSubscription;

    fn subscribe(&self, dispatcher: Arc<Dispatcher>) -> Result<WindowsSubscription, HookError> {
        ensure_message_queue();
        ACTIVE.with(|slot| *slot.borrow_mut() = Some(dispatcher));

        let hooks = HookGuard::install_keyboard_hook(Some(keyboard_hook_proc)).and_then(|keyboard| {
            let mouse = HookGuard::install_mouse_hook(Some(mouse_hook_proc))?;
            Ok(WindowsSubscription {
                _keyboard: keyboard,
                _mouse: mouse,
            })
        });

        match hooks {
            Ok(subscription) => {
                self.thread_id.store(current_thread_id(), Ordering::SeqCst);
                Ok(subscription)
            }
            Err(e) => {
                ACTIVE.with(|slot| slot.borrow_mut().take());
                Err(e)
            }
        }
    }

    fn unsubscribe(&self, subscription: WindowsSubscription) {
        drop(subscription);
        ACTIVE.with(|slot| slot.borrow_mut().take());
        self.thread_id.store(0, Ordering::SeqCst);
    }

    fn pump_until_stopped(&self) {
        run_message_loop();
    }

    fn request_stop(&self) {
        match self.thread_id.load(Ordering::SeqCst) {
            0 => tracing::warn!("No input worker thread, cannot post quit message"),
            thread_id => post_quit_message(thread_id),
        }
    }
}

fn with_dispatcher(f: impl FnOnce(&Dispatcher) -> bool) -> bool {
    ACTIVE.with(|slot| slot.borrow().as_deref().is_some_and(f))
}

/// Low-level keyboard hook callback.
///
/// Returns 1 to swallow the event when the dispatcher consumes it.
///
/// # Safety
/// Called by Windows on the worker thread with a valid `KBDLLHOOKSTRUCT`
/// pointer in `lparam` whenever `code` is `HC_ACTION`.
unsafe extern "system" fn keyboard_hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32 {
        let info = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
        let message = wparam.0 as u32;
        let raw = RawKeyEvent {
            vk_code: info.vkCode,
            pressed: message == WM_KEYDOWN || message == WM_SYSKEYDOWN,
            injected: info.flags.0 & LLKHF_INJECTED.0 != 0,
        };

        if with_dispatcher(|dispatcher| dispatcher.on_raw_key(&raw, &AsyncModifiers)) {
            return LRESULT(1);
        }
    }

    call_next_hook(code, wparam, lparam)
}

/// Low-level mouse hook callback.
///
/// # Safety
/// Called by Windows on the worker thread with a valid `MSLLHOOKSTRUCT`
/// pointer in `lparam` whenever `code` is `HC_ACTION`.
unsafe extern "system" fn mouse_hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32 {
        let info = &*(lparam.0 as *const MSLLHOOKSTRUCT);
        let raw = RawMouseEvent {
            message: wparam.0 as u32,
            x: info.pt.x,
            y: info.pt.y,
            mouse_data: info.mouseData,
            injected: info.flags & LLMHF_INJECTED != 0,
        };

        if with_dispatcher(|dispatcher| dispatcher.on_raw_mouse(&raw)) {
            return LRESULT(1);
        }
    }

    call_next_hook(code, wparam, lparam)
}
