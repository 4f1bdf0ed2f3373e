// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback timers keyed to note boundaries.
//!
//! Playback does not stream note on/off messages. It schedules one timer per
//! boundary instant (a time at which some note starts or ends) and, when a
//! timer fires, recomputes which notes are sounding at that instant.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::Duration;

use crate::recording::NoteEvent;

/// Every distinct start and end time, in first-seen order
pub fn boundary_instants(events: &[NoteEvent]) -> Vec<f64> {
    let mut seen = HashSet::new();
    let mut instants = Vec::with_capacity(events.len() * 2);

    for event in events {
        for t in [event.time, event.end_time()] {
            // +0.0 folds -0.0 into 0.0 so they dedupe together
            if seen.insert((t + 0.0).to_bits()) {
                instants.push(t);
            }
        }
    }

    instants
}

/// Time at which the last note ends (0 for an empty recording)
pub fn recording_end_time(events: &[NoteEvent]) -> f64 {
    events
        .iter()
        .map(NoteEvent::end_time)
        .fold(None, |max: Option<f64>, end| Some(max.map_or(end, |m| m.max(end))))
        .unwrap_or(0.0)
}

/// Events sounding at `t`
pub fn active_at(events: &[NoteEvent], t: f64) -> Vec<NoteEvent> {
    events.iter().filter(|e| e.is_active_at(t)).copied().collect()
}

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerAction {
    /// Recompute the sounding notes at this boundary instant (seconds)
    Boundary(f64),
    /// Playback reached the end of the recording
    Finish,
}

/// Handle for a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// A pending timer
#[derive(Debug, Clone)]
pub struct Timer {
    /// Handle returned by `schedule`
    pub id: TimerId,
    /// Clock time at which the timer fires
    pub due: Duration,
    /// What happens on firing
    pub action: TimerAction,
    /// Queue generation the timer was scheduled in
    generation: u64,
}

// For BinaryHeap - we want earliest due first, ties in scheduling order
impl Eq for Timer {}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.id == other.id
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.id.0.cmp(&self.id.0))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cancellable queue of deferred callbacks
///
/// Cancelling bumps a generation counter. A timer that was already handed out
/// by [`TimerQueue::poll`] but belongs to an older generation is rejected by
/// [`TimerQueue::is_current`], so nothing scheduled before a cancel can act
/// after it, even within the same poll batch.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Timer>,
    next_id: u64,
    generation: u64,
}

impl TimerQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a timer at an absolute clock time
    pub fn schedule(&mut self, due: Duration, action: TimerAction) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Timer {
            id,
            due,
            action,
            generation: self.generation,
        });
        id
    }

    /// Drop every pending timer
    pub fn cancel_all(&mut self) {
        self.heap.clear();
        self.generation += 1;
    }

    /// Pop all timers due at or before `now`, earliest first
    pub fn poll(&mut self, now: Duration) -> Vec<Timer> {
        let mut due = Vec::new();
        while let Some(timer) = self.heap.peek() {
            if timer.due > now {
                break;
            }
            if let Some(timer) = self.heap.pop() {
                due.push(timer);
            }
        }
        due
    }

    /// Whether a polled timer survived every cancel since it was scheduled
    pub fn is_current(&self, timer: &Timer) -> bool {
        timer.generation == self.generation
    }

    /// Delay until the next timer fires
    pub fn time_to_next(&self, now: Duration) -> Option<Duration> {
        self.heap
            .peek()
            .map(|timer| timer.due.saturating_sub(now))
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// No pending timers
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
