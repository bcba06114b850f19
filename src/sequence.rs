//! Sequence matcher engine.
//!
//! Every registered sequence is an independent linear scanner over its own
//! template list. An incoming action event is offered to each sequence of the
//! matching class in registration order:
//!
//! - a match advances the sequence by one step; reaching the sentinel fires the
//!   completion callback and rewinds the sequence to the start
//! - a mismatch rewinds the sequence to the start
//!
//! A mismatching event is *not* re-tried against the first step. Feeding
//! `A A B` to the sequence `A B` does not complete it: the second `A` resets
//! the scanner and `B` then fails against step 0. Overlapping prefixes are
//! therefore lost; this is the long-standing behavior and callers rely on it.

use crate::event::{KeyEvent, Modifiers, MouseEvent, SENTINEL_CODE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Completion callback of a sequence. Returns `true` to consume the event
/// that completed it.
pub type CompletionFn = Box<dyn FnMut() -> bool + Send>;

/// Process-unique identifier of a registered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceId(u32);

impl SequenceId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id source shared by key and mouse sequences. Ids start at 1 and
/// are never reused.
#[derive(Debug)]
pub(crate) struct SequenceIds {
    next: AtomicU32,
}

impl SequenceIds {
    pub(crate) fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    pub(crate) fn next_id(&self) -> SequenceId {
        SequenceId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SequenceIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Key sequence matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyRule {
    /// When set, ctrl/shift/alt must equal the template's at every step.
    /// Otherwise modifiers are ignored entirely.
    pub strict: bool,
}

/// Mouse sequence matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MouseRule {
    /// Allowed deviation in pixels on each axis, inclusive.
    pub tolerance: u32,
}

/// An event type that can serve as a sequence template.
pub trait SequenceStep: Copy + fmt::Debug + Send + 'static {
    type Rule: Copy + fmt::Debug + Send + 'static;

    /// The terminating template entry.
    const SENTINEL: Self;

    fn is_sentinel(&self) -> bool;

    /// Whether `event` satisfies this template under `rule`.
    fn accepts(&self, event: &Self, rule: Self::Rule) -> bool;
}

impl SequenceStep for KeyEvent {
    type Rule = KeyRule;

    const SENTINEL: Self = KeyEvent::SENTINEL;

    fn is_sentinel(&self) -> bool {
        self.code == SENTINEL_CODE
    }

    fn accepts(&self, event: &Self, rule: KeyRule) -> bool {
        self.code == event.code && (!rule.strict || same_modifiers(self.modifiers, event.modifiers))
    }
}

fn same_modifiers(a: Modifiers, b: Modifiers) -> bool {
    a.ctrl == b.ctrl && a.shift == b.shift && a.alt == b.alt
}

impl SequenceStep for MouseEvent {
    type Rule = MouseRule;

    const SENTINEL: Self = MouseEvent::SENTINEL;

    fn is_sentinel(&self) -> bool {
        self.code == SENTINEL_CODE
    }

    fn accepts(&self, event: &Self, rule: MouseRule) -> bool {
        self.code == event.code
            && within(self.x, event.x, rule.tolerance)
            && within(self.y, event.y, rule.tolerance)
    }
}

fn within(expected: i32, actual: i32, tolerance: u32) -> bool {
    (i64::from(actual) - i64::from(expected)).abs() <= i64::from(tolerance)
}

/// One registered sequence and its match progress.
struct Sequence<T: SequenceStep> {
    id: SequenceId,
    /// Templates, always terminated by exactly one sentinel.
    steps: Vec<T>,
    rule: T::Rule,
    on_complete: CompletionFn,
    /// Index of the next expected step. Always points at a non-sentinel
    /// entry, or at the sentinel of an empty sequence.
    position: usize,
}

impl<T: SequenceStep> Sequence<T> {
    fn new(
        id: SequenceId,
        templates: impl IntoIterator<Item = T>,
        rule: T::Rule,
        on_complete: CompletionFn,
    ) -> Self {
        let mut steps: Vec<T> = templates
            .into_iter()
            .take_while(|step| !step.is_sentinel())
            .collect();
        steps.push(T::SENTINEL);

        Self {
            id,
            steps,
            rule,
            on_complete,
            position: 0,
        }
    }

    /// Offers one event. Returns the completion callback's stop signal if
    /// this event completed the sequence.
    fn advance(&mut self, event: &T) -> Option<bool> {
        let expected = &self.steps[self.position];
        if expected.is_sentinel() || !expected.accepts(event, self.rule) {
            self.position = 0;
            return None;
        }

        self.position += 1;
        if !self.steps[self.position].is_sentinel() {
            tracing::trace!(id = %self.id, step = self.position, "Sequence step matched");
            return None;
        }

        self.position = 0;
        tracing::debug!(id = %self.id, "Sequence completed");
        Some((self.on_complete)())
    }
}

/// Thread-safe, insertion-ordered collection of sequences of one event class.
pub struct SequenceRegistry<T: SequenceStep> {
    sequences: Mutex<Vec<Sequence<T>>>,
}

impl<T: SequenceStep> SequenceRegistry<T> {
    pub fn new() -> Self {
        Self {
            sequences: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Sequence<T>>> {
        self.sequences.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a sequence under `id`, which must come from the owning
    /// dispatcher's [`SequenceIds`].
    ///
    /// Templates after the first sentinel are ignored; the sentinel is added
    /// if missing.
    pub(crate) fn add(
        &self,
        id: SequenceId,
        templates: impl IntoIterator<Item = T>,
        rule: T::Rule,
        on_complete: CompletionFn,
    ) {
        let sequence = Sequence::new(id, templates, rule, on_complete);
        tracing::debug!(
            %id,
            steps = sequence.steps.len() - 1,
            rule = ?rule,
            "Sequence registered"
        );
        self.lock().push(sequence);
    }

    /// Removes the sequence with `id`, discarding its progress.
    pub fn remove(&self, id: SequenceId) -> bool {
        let mut sequences = self.lock();
        match sequences.iter().position(|s| s.id == id) {
            Some(index) => {
                sequences.remove(index);
                tracing::debug!(%id, "Sequence removed");
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

    /// Offers an action event to every sequence, in registration order,
    /// holding the lock for the whole pass.
    ///
    /// Stops at the first completed sequence whose callback returns `true`
    /// and reports `true`; later sequences are left untouched.
    pub fn feed(&self, event: &T) -> bool {
        let mut sequences = self.lock();
        for sequence in sequences.iter_mut() {
            if sequence.advance(event) == Some(true) {
                return true;
            }
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn progress(&self, id: SequenceId) -> Option<usize> {
        self.lock().iter().find(|s| s.id == id).map(|s| s.position)
    }
}

impl<T: SequenceStep> Default for SequenceRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SequenceStep> fmt::Debug for SequenceRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceRegistry")
            .field("sequences", &self.len())
            .finish()
    }
}
