//! Cancellable delayed actions for a single game session.
//!
//! The session runs on one cooperative timeline: nothing fires on its own,
//! the owner calls [`TimerSet::pop_due`] with the current clock and handles
//! whatever comes out. Every timer is tagged with the round it was scheduled
//! for so a controller can assert that nothing from an abandoned round is
//! still pending.

use std::collections::BTreeMap;

/// Identifier handed out by [`TimerSet::schedule`]. Ids increase monotonically
/// for the lifetime of the set and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Entry<A> {
    due_ms: u64,
    round: usize,
    action: A,
}

/// A timer handed back by [`TimerSet::pop_due`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<A> {
    pub due_ms: u64,
    pub round: usize,
    pub action: A,
}

#[derive(Debug, Clone)]
pub struct TimerSet<A> {
    next_id: u64,
    // Keyed by (due time, id) so equal deadlines fire in scheduling order.
    entries: BTreeMap<(u64, TimerId), Entry<A>>,
}

impl<A> Default for TimerSet<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> TimerSet<A> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: BTreeMap::new(),
        }
    }

    /// Schedule `action` to become due at `due_ms` on the session clock.
    pub fn schedule(&mut self, due_ms: u64, round: usize, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            (due_ms, id),
            Entry {
                due_ms,
                round,
                action,
            },
        );
        id
    }

    /// Drop every pending timer and return how many were removed.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    /// Remove and return the earliest timer due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Fired<A>> {
        let key = *self.entries.keys().next()?;
        if key.0 > now_ms {
            return None;
        }
        self.entries.remove(&key).map(|e| Fired {
            due_ms: e.due_ms,
            round: e.round,
            action: e.action,
        })
    }

    pub fn next_due(&self) -> Option<u64> {
        self.entries.values().next().map(|e| e.due_ms)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Round tags of every pending timer, in firing order.
    pub fn rounds(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.values().map(|e| e.round)
    }
}
