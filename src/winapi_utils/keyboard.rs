//! Live modifier key state.

use crate::event::Modifiers;
use crate::normalize::ModifierQuery;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, VIRTUAL_KEY, VK_CONTROL, VK_MENU, VK_SHIFT,
};

/// Reads ctrl/shift/alt from the asynchronous key state at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsyncModifiers;

impl ModifierQuery for AsyncModifiers {
    fn modifiers(&self) -> Modifiers {
        Modifiers::new(is_down(VK_CONTROL), is_down(VK_SHIFT), is_down(VK_MENU))
    }
}

// High bit set means the key is currently down.
fn is_down(key: VIRTUAL_KEY) -> bool {
    unsafe { GetAsyncKeyState(i32::from(key.0)) < 0 }
}
