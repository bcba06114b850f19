//! Windows hook installation and management.
//!
//! Provides RAII wrappers for Windows low-level hooks to ensure
//! proper cleanup when hooks go out of scope.

use crate::source::HookError;
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, SetWindowsHookExW, UnhookWindowsHookEx, HHOOK, HOOKPROC, WH_KEYBOARD_LL,
    WH_MOUSE_LL, WINDOWS_HOOK_ID,
};

/// RAII guard for a Windows hook.
///
/// Automatically calls `UnhookWindowsHookEx` when dropped to prevent
/// hook leaks and ensure proper cleanup.
pub struct HookGuard {
    handle: HHOOK,
    hook_type: &'static str,
}

impl HookGuard {
    /// Installs a low-level keyboard hook.
    ///
    /// # Important
    /// - The callback must be extremely fast (< 1ms)
    /// - The installing thread must run a message pump
    pub fn install_keyboard_hook(callback: HOOKPROC) -> Result<Self, HookError> {
        Self::install(WH_KEYBOARD_LL, callback, "keyboard_ll")
    }

    /// Installs a low-level mouse hook. Same constraints as the keyboard hook.
    pub fn install_mouse_hook(callback: HOOKPROC) -> Result<Self, HookError> {
        Self::install(WH_MOUSE_LL, callback, "mouse_ll")
    }

    fn install(
        hook_id: WINDOWS_HOOK_ID,
        callback: HOOKPROC,
        hook_type: &'static str,
    ) -> Result<Self, HookError> {
        let handle = unsafe { SetWindowsHookExW(hook_id, callback, None, 0) }
            .map_err(|e| HookError::Install {
                hook_type,
                message: e.to_string(),
            })?;
        tracing::info!(hook_type, "Hook installed successfully");
        Ok(Self { handle, hook_type })
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        let result = unsafe { UnhookWindowsHookEx(self.handle) };
        match result {
            Ok(_) => tracing::info!(hook_type = self.hook_type, "Hook uninstalled successfully"),
            Err(e) => tracing::error!(
                hook_type = self.hook_type,
                error = ?e,
                "Failed to unhook"
            ),
        }
    }
}

/// Passes the event on to the next hook in the chain.
///
/// Every hook callback that does not consume its event must end with this.
#[inline(always)]
pub fn call_next_hook(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe { CallNextHookEx(None, code, wparam, lparam) }
}
