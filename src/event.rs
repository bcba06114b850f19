//! Canonical input event values.
//!
//! Everything downstream of the normalizer works on these structures; the
//! OS wire-level representation never leaks past `normalize`.

use serde::{Deserialize, Serialize};

/// Code that terminates a sequence template list.
pub const SENTINEL_CODE: u32 = 0;

// Mouse event codes (the low-level hook message identifiers).
pub const MOUSE_MOVE: u32 = 0x0200;
pub const MOUSE_LEFT_DOWN: u32 = 0x0201;
pub const MOUSE_LEFT_UP: u32 = 0x0202;
pub const MOUSE_RIGHT_DOWN: u32 = 0x0204;
pub const MOUSE_RIGHT_UP: u32 = 0x0205;
pub const MOUSE_MIDDLE_DOWN: u32 = 0x0207;
pub const MOUSE_MIDDLE_UP: u32 = 0x0208;
pub const MOUSE_WHEEL: u32 = 0x020A;
pub const MOUSE_X_DOWN: u32 = 0x020B;
pub const MOUSE_X_UP: u32 = 0x020C;
pub const MOUSE_HWHEEL: u32 = 0x020E;

/// Whether a key went down or came back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    #[default]
    Down,
    Up,
}

/// Modifier key state sampled when the event was normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self::new(false, false, false);

    pub const fn new(ctrl: bool, shift: bool, alt: bool) -> Self {
        Self { ctrl, shift, alt }
    }
}

/// A keyboard event.
///
/// Also used as a sequence template, where `kind` is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Virtual key code.
    pub code: u32,

    #[serde(default)]
    pub modifiers: Modifiers,

    #[serde(default)]
    pub kind: KeyKind,
}

impl KeyEvent {
    /// Template entry that terminates a key sequence.
    pub const SENTINEL: Self = Self::down(SENTINEL_CODE);

    /// A key-down with no modifiers held.
    pub const fn down(code: u32) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyKind::Down,
        }
    }

    /// A key-up with no modifiers held.
    pub const fn up(code: u32) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyKind::Up,
        }
    }

    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub const fn ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    pub const fn shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }

    pub const fn alt(mut self) -> Self {
        self.modifiers.alt = true;
        self
    }

    pub fn is_key_down(&self) -> bool {
        self.kind == KeyKind::Down
    }
}

/// A mouse event: button, wheel or movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseEvent {
    /// Event code, one of the `MOUSE_*` constants.
    pub code: u32,

    /// Screen coordinates.
    pub x: i32,
    pub y: i32,

    /// Auxiliary data (wheel delta, X button index). Never compared by sequences.
    #[serde(default)]
    pub data: u32,
}

impl MouseEvent {
    /// Template entry that terminates a mouse sequence.
    pub const SENTINEL: Self = Self::new(SENTINEL_CODE, 0, 0);

    pub const fn new(code: u32, x: i32, y: i32) -> Self {
        Self { code, x, y, data: 0 }
    }

    pub const fn with_data(mut self, data: u32) -> Self {
        self.data = data;
        self
    }

    pub fn is_move(&self) -> bool {
        self.code == MOUSE_MOVE
    }
}
