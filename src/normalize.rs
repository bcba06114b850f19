//! Event normalizer.
//!
//! Turns the raw notification an [`EventSource`](crate::source::EventSource)
//! receives into a canonical [`KeyEvent`] or [`MouseEvent`]. Synthetically
//! injected events are dropped here and never reach the dispatcher.

use crate::event::{KeyEvent, KeyKind, Modifiers, MouseEvent};

/// Keyboard notification as delivered by the OS hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub vk_code: u32,
    /// True for key-down and system key-down messages.
    pub pressed: bool,
    pub injected: bool,
}

/// Mouse notification as delivered by the OS hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMouseEvent {
    pub message: u32,
    pub x: i32,
    pub y: i32,
    pub mouse_data: u32,
    pub injected: bool,
}

/// Live modifier key state, read at the moment of normalization.
pub trait ModifierQuery {
    fn modifiers(&self) -> Modifiers;
}

impl ModifierQuery for Modifiers {
    fn modifiers(&self) -> Modifiers {
        *self
    }
}

/// Normalizes a keyboard notification.
///
/// Returns `None` for injected events. The modifier state is only queried
/// for events that are kept.
pub fn normalize_key(raw: &RawKeyEvent, query: &dyn ModifierQuery) -> Option<KeyEvent> {
    if raw.injected {
        return None;
    }

    let kind = if raw.pressed {
        KeyKind::Down
    } else {
        KeyKind::Up
    };

    Some(KeyEvent {
        code: raw.vk_code,
        modifiers: query.modifiers(),
        kind,
    })
}

/// Normalizes a mouse notification. Returns `None` for injected events.
pub fn normalize_mouse(raw: &RawMouseEvent) -> Option<MouseEvent> {
    if raw.injected {
        return None;
    }

    Some(MouseEvent {
        code: raw.message,
        x: raw.x,
        y: raw.y,
        data: raw.mouse_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MOUSE_WHEEL;
    use std::cell::Cell;

    struct CountingQuery {
        calls: Cell<u32>,
    }

    impl ModifierQuery for CountingQuery {
        fn modifiers(&self) -> Modifiers {
            self.calls.set(self.calls.get() + 1);
            Modifiers::new(true, false, true)
        }
    }

    #[test]
    fn test_key_down_carries_live_modifiers() {
        let query = CountingQuery {
            calls: Cell::new(0),
        };
        let raw = RawKeyEvent {
            vk_code: 0x41,
            pressed: true,
            injected: false,
        };

        let event = normalize_key(&raw, &query).unwrap();
        assert_eq!(event.code, 0x41);
        assert_eq!(event.kind, KeyKind::Down);
        assert_eq!(event.modifiers, Modifiers::new(true, false, true));
        assert_eq!(query.calls.get(), 1);
    }

    #[test]
    fn test_key_release_is_key_up() {
        let raw = RawKeyEvent {
            vk_code: 0x41,
            pressed: false,
            injected: false,
        };
        let event = normalize_key(&raw, &Modifiers::NONE).unwrap();
        assert_eq!(event.kind, KeyKind::Up);
    }

    #[test]
    fn test_injected_key_is_ignored_without_query() {
        let query = CountingQuery {
            calls: Cell::new(0),
        };
        let raw = RawKeyEvent {
            vk_code: 0x41,
            pressed: true,
            injected: true,
        };

        assert!(normalize_key(&raw, &query).is_none());
        assert_eq!(query.calls.get(), 0);
    }

    #[test]
    fn test_mouse_fields_are_copied() {
        let raw = RawMouseEvent {
            message: MOUSE_WHEEL,
            x: -5,
            y: 300,
            mouse_data: 120 << 16,
            injected: false,
        };

        let event = normalize_mouse(&raw).unwrap();
        assert_eq!(event, MouseEvent::new(MOUSE_WHEEL, -5, 300).with_data(120 << 16));
    }

    #[test]
    fn test_injected_mouse_is_ignored() {
        let raw = RawMouseEvent {
            message: MOUSE_WHEEL,
            x: 0,
            y: 0,
            mouse_data: 0,
            injected: true,
        };
        assert!(normalize_mouse(&raw).is_none());
    }
}
