//! Per-event dispatch.
//!
//! The dispatcher owns the four registries and decides, for every normalized
//! event, whether it is consumed. Action events (key-downs, non-move mouse
//! events) go to the sequence engine first; if a completed sequence asks to
//! stop, flat handlers are skipped. Otherwise the flat handlers decide.
//!
//! # Performance Critical
//!
//! Dispatch runs synchronously inside the OS hook callback. Callbacks
//! registered here must not block, and must not register or remove entries
//! in the registry they are being called from.

use crate::event::{KeyEvent, MouseEvent};
use crate::normalize::{normalize_key, normalize_mouse, ModifierQuery, RawKeyEvent, RawMouseEvent};
use crate::registry::HandlerRegistry;
use crate::sequence::{
    CompletionFn, KeyRule, MouseRule, SequenceId, SequenceIds, SequenceRegistry,
};

/// Registries plus the sequence id counter for one input context.
#[derive(Debug, Default)]
pub struct Dispatcher {
    key_handlers: HandlerRegistry<KeyEvent>,
    mouse_handlers: HandlerRegistry<MouseEvent>,
    key_sequences: SequenceRegistry<KeyEvent>,
    mouse_sequences: SequenceRegistry<MouseEvent>,
    ids: SequenceIds,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_handlers(&self) -> &HandlerRegistry<KeyEvent> {
        &self.key_handlers
    }

    pub fn mouse_handlers(&self) -> &HandlerRegistry<MouseEvent> {
        &self.mouse_handlers
    }

    pub fn key_sequences(&self) -> &SequenceRegistry<KeyEvent> {
        &self.key_sequences
    }

    pub fn mouse_sequences(&self) -> &SequenceRegistry<MouseEvent> {
        &self.mouse_sequences
    }

    /// Registers a key sequence under a fresh id. Key and mouse sequences
    /// draw from the same id counter.
    pub fn add_key_sequence(
        &self,
        templates: impl IntoIterator<Item = KeyEvent>,
        rule: KeyRule,
        on_complete: CompletionFn,
    ) -> SequenceId {
        let id = self.ids.next_id();
        self.key_sequences.add(id, templates, rule, on_complete);
        id
    }

    /// Registers a mouse sequence under a fresh id.
    pub fn add_mouse_sequence(
        &self,
        templates: impl IntoIterator<Item = MouseEvent>,
        rule: MouseRule,
        on_complete: CompletionFn,
    ) -> SequenceId {
        let id = self.ids.next_id();
        self.mouse_sequences.add(id, templates, rule, on_complete);
        id
    }

    /// Dispatches a key event. Returns `true` if it was consumed.
    pub fn dispatch_key(&self, event: &KeyEvent) -> bool {
        // Key-ups never advance or reset a key sequence.
        if event.is_key_down() && self.key_sequences.feed(event) {
            return true;
        }
        self.key_handlers.dispatch(event)
    }

    /// Dispatches a mouse event. Returns `true` if it was consumed.
    pub fn dispatch_mouse(&self, event: &MouseEvent) -> bool {
        // Movement is never compared against mouse sequences.
        if !event.is_move() && self.mouse_sequences.feed(event) {
            return true;
        }
        self.mouse_handlers.dispatch(event)
    }

    /// Normalizes and dispatches a raw keyboard notification.
    ///
    /// Injected events are passed through untouched.
    pub fn on_raw_key(&self, raw: &RawKeyEvent, modifiers: &dyn ModifierQuery) -> bool {
        match normalize_key(raw, modifiers) {
            Some(event) => self.dispatch_key(&event),
            None => false,
        }
    }

    /// Normalizes and dispatches a raw mouse notification.
    pub fn on_raw_mouse(&self, raw: &RawMouseEvent) -> bool {
        match normalize_mouse(raw) {
            Some(event) => self.dispatch_mouse(&event),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Modifiers, MOUSE_LEFT_DOWN, MOUSE_MOVE};
    use crate::registry::{KeyHandler, MouseHandler};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_key_handler(stop: bool) -> (Arc<AtomicUsize>, KeyHandler) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let handler: KeyHandler = Arc::new(move |_: &KeyEvent| {
            inner.fetch_add(1, Ordering::SeqCst);
            stop
        });
        (count, handler)
    }

    fn counting_mouse_handler() -> (Arc<AtomicUsize>, MouseHandler) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let handler: MouseHandler = Arc::new(move |_: &MouseEvent| {
            inner.fetch_add(1, Ordering::SeqCst);
            false
        });
        (count, handler)
    }

    fn add_key_sequence(dispatcher: &Dispatcher, codes: &[u32], stop: bool) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        dispatcher.add_key_sequence(
            codes.iter().map(|&c| KeyEvent::down(c)),
            KeyRule::default(),
            Box::new(move || {
                inner.fetch_add(1, Ordering::SeqCst);
                stop
            }),
        );
        count
    }

    #[test]
    fn test_stopping_sequence_takes_precedence_over_handlers() {
        let dispatcher = Dispatcher::new();
        let completions = add_key_sequence(&dispatcher, &[0x41], true);
        let (handled, handler) = counting_key_handler(true);
        dispatcher.key_handlers().add(handler);

        assert!(dispatcher.dispatch_key(&KeyEvent::down(0x41)));
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(handled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_non_stopping_completion_still_runs_handlers() {
        let dispatcher = Dispatcher::new();
        let completions = add_key_sequence(&dispatcher, &[0x41], false);
        let (handled, handler) = counting_key_handler(false);
        dispatcher.key_handlers().add(handler);

        assert!(!dispatcher.dispatch_key(&KeyEvent::down(0x41)));
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_decides_when_no_sequence_stops() {
        let dispatcher = Dispatcher::new();
        let (_, handler) = counting_key_handler(true);
        dispatcher.key_handlers().add(handler);

        assert!(dispatcher.dispatch_key(&KeyEvent::down(0x41)));
        assert!(dispatcher.dispatch_key(&KeyEvent::up(0x41)));
    }

    #[test]
    fn test_key_up_bypasses_sequences() {
        let dispatcher = Dispatcher::new();
        let completions = add_key_sequence(&dispatcher, &[0x41, 0x42], true);
        let (handled, handler) = counting_key_handler(false);
        dispatcher.key_handlers().add(handler);

        dispatcher.dispatch_key(&KeyEvent::down(0x41));
        // Would reset the sequence if it were offered.
        dispatcher.dispatch_key(&KeyEvent::up(0x41));
        assert!(dispatcher.dispatch_key(&KeyEvent::down(0x42)));

        assert_eq!(completions.load(Ordering::SeqCst), 1);
        // Down A and up A reach the handler; down B was consumed.
        assert_eq!(handled.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_mouse_move_bypasses_sequences_but_reaches_handlers() {
        let dispatcher = Dispatcher::new();
        let completions = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&completions);
        dispatcher.add_mouse_sequence(
            vec![
                MouseEvent::new(MOUSE_LEFT_DOWN, 0, 0),
                MouseEvent::new(MOUSE_LEFT_DOWN, 0, 0),
            ],
            MouseRule { tolerance: 0 },
            Box::new(move || {
                inner.fetch_add(1, Ordering::SeqCst);
                false
            }),
        );
        let (moves, handler) = counting_mouse_handler();
        dispatcher.mouse_handlers().add(handler);

        dispatcher.dispatch_mouse(&MouseEvent::new(MOUSE_LEFT_DOWN, 0, 0));
        dispatcher.dispatch_mouse(&MouseEvent::new(MOUSE_MOVE, 300, 300));
        dispatcher.dispatch_mouse(&MouseEvent::new(MOUSE_LEFT_DOWN, 0, 0));

        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(moves.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_key_and_mouse_sequences_share_id_counter() {
        let dispatcher = Dispatcher::new();
        let key = dispatcher.add_key_sequence(
            vec![KeyEvent::down(0x41)],
            KeyRule::default(),
            Box::new(|| false),
        );
        let mouse = dispatcher.add_mouse_sequence(
            vec![MouseEvent::new(MOUSE_LEFT_DOWN, 0, 0)],
            MouseRule::default(),
            Box::new(|| false),
        );
        let next_key = dispatcher.add_key_sequence(
            vec![KeyEvent::down(0x42)],
            KeyRule::default(),
            Box::new(|| false),
        );

        assert_eq!(key.get() + 1, mouse.get());
        assert_eq!(mouse.get() + 1, next_key.get());

        // Each id only removes from its own registry.
        assert!(!dispatcher.mouse_sequences().remove(key));
        assert!(!dispatcher.key_sequences().remove(mouse));
        assert!(dispatcher.mouse_sequences().remove(mouse));
        assert!(dispatcher.key_sequences().remove(key));
        assert_eq!(dispatcher.key_sequences().len(), 1);
    }

    #[test]
    fn test_raw_injected_events_pass_through() {
        let dispatcher = Dispatcher::new();
        let (handled, handler) = counting_key_handler(true);
        dispatcher.key_handlers().add(handler);

        let operator = RawKeyEvent {
            vk_code: 0x41,
            pressed: true,
            injected: false,
        };
        assert!(dispatcher.on_raw_key(&operator, &Modifiers::NONE));

        let injected = RawKeyEvent {
            injected: true,
            ..operator
        };
        assert!(!dispatcher.on_raw_key(&injected, &Modifiers::NONE));
        assert_eq!(handled.load(Ordering::SeqCst), 1);

        let mouse = RawMouseEvent {
            message: MOUSE_LEFT_DOWN,
            x: 0,
            y: 0,
            mouse_data: 0,
            injected: true,
        };
        assert!(!dispatcher.on_raw_mouse(&mouse));
    }
}
