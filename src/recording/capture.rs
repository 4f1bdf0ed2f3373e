// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Key input capture.
//!
//! Pairs note-on and note-off input into [`NoteEvent`]s. Times are measured
//! in seconds from the recording origin, which is the first key pressed after
//! a reset.

use std::collections::HashMap;

use super::NoteEvent;
use crate::music::MidiNote;

/// Turns key presses and releases into timed note events
#[derive(Debug, Default)]
pub struct KeyCapture {
    /// Clock time (seconds) that maps to recording time zero
    origin: Option<f64>,
    /// Held keys: pitch -> press time (seconds since origin)
    held: HashMap<MidiNote, f64>,
}

impl KeyCapture {
    /// Create a capture with no origin yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Recording origin, once the first key has been pressed
    pub fn origin(&self) -> Option<f64> {
        self.origin
    }

    /// Keys currently held down
    pub fn held(&self) -> impl Iterator<Item = MidiNote> + '_ {
        self.held.keys().copied()
    }

    /// Whether a key is held
    pub fn is_held(&self, pitch: MidiNote) -> bool {
        self.held.contains_key(&pitch)
    }

    /// Record a key press at clock time `now` (seconds)
    ///
    /// Returns false if the key was already held.
    pub fn note_on(&mut self, pitch: MidiNote, now: f64) -> bool {
        let origin = *self.origin.get_or_insert(now);
        if self.held.contains_key(&pitch) {
            return false;
        }
        self.held.insert(pitch, (now - origin).max(0.0));
        true
    }

    /// Record a key release, completing the note
    ///
    /// Zero-length notes and releases without a matching press yield nothing.
    pub fn note_off(&mut self, pitch: MidiNote, now: f64) -> Option<NoteEvent> {
        let start = self.held.remove(&pitch)?;
        let origin = self.origin?;
        let duration = (now - origin) - start;
        if duration > 0.0 {
            Some(NoteEvent::new(pitch, start, duration))
        } else {
            None
        }
    }

    /// Release every held key, in pitch order
    pub fn release_all(&mut self, now: f64) -> Vec<NoteEvent> {
        let mut pitches: Vec<MidiNote> = self.held.keys().copied().collect();
        pitches.sort_unstable();
        pitches
            .into_iter()
            .filter_map(|pitch| self.note_off(pitch, now))
            .collect()
    }

    /// Forget held keys and the origin
    pub fn reset(&mut self) {
        self.held.clear();
        self.origin = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_press_sets_origin() {
        let mut capture = KeyCapture::new();
        assert_eq!(capture.origin(), None);

        capture.note_on(60, 10.0);
        assert_eq!(capture.origin(), Some(10.0));

        let event = capture.note_off(60, 11.0).unwrap();
        assert_eq!(event, NoteEvent::new(60, 0.0, 1.0));
    }

    #[test]
    fn test_overlapping_notes() {
        let mut capture = KeyCapture::new();
        capture.note_on(60, 2.0);
        capture.note_on(64, 2.5);

        let c = capture.note_off(60, 3.0).unwrap();
        let e = capture.note_off(64, 3.5).unwrap();

        assert_eq!(c, NoteEvent::new(60, 0.0, 1.0));
        assert_eq!(e, NoteEvent::new(64, 0.5, 1.0));
    }

    #[test]
    fn test_repeat_press_ignored() {
        let mut capture = KeyCapture::new();
        assert!(capture.note_on(60, 0.0));
        assert!(!capture.note_on(60, 0.5));

        let event = capture.note_off(60, 1.0).unwrap();
        assert_eq!(event.time, 0.0);
    }

    #[test]
    fn test_zero_length_dropped() {
        let mut capture = KeyCapture::new();
        capture.note_on(60, 1.0);
        assert!(capture.note_off(60, 1.0).is_none());
        assert!(!capture.is_held(60));
    }

    #[test]
    fn test_release_without_press() {
        let mut capture = KeyCapture::new();
        assert!(capture.note_off(60, 1.0).is_none());
    }

    #[test]
    fn test_release_all() {
        let mut capture = KeyCapture::new();
        capture.note_on(67, 0.0);
        capture.note_on(60, 0.0);

        let events = capture.release_all(0.5);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].pitch, 60);
        assert_eq!(events[1].pitch, 67);
        assert_eq!(capture.held().count(), 0);
    }

    #[test]
    fn test_reset_clears_origin() {
        let mut capture = KeyCapture::new();
        capture.note_on(60, 5.0);
        capture.reset();
        assert_eq!(capture.origin(), None);
        assert!(!capture.is_held(60));

        capture.note_on(62, 8.0);
        assert_eq!(capture.note_off(62, 8.25).unwrap().time, 0.0);
    }
}
