// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recorded note events.

use serde::{Deserialize, Serialize};

use crate::music::MidiNote;

/// One played note: when it started, how long it sounded, and which key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI note number
    #[serde(rename = "midiNumber")]
    pub pitch: MidiNote,
    /// Seconds from recording start
    pub time: f64,
    /// Seconds the note was held
    pub duration: f64,
}

impl NoteEvent {
    /// Create a new note event
    pub fn new(pitch: MidiNote, time: f64, duration: f64) -> Self {
        Self {
            pitch,
            time,
            duration,
        }
    }

    /// End time in seconds
    pub fn end_time(&self) -> f64 {
        self.time + self.duration
    }

    /// Whether the note sounds at `t` (start inclusive, end exclusive)
    pub fn is_active_at(&self, t: f64) -> bool {
        self.time <= t && self.end_time() > t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_time() {
        let event = NoteEvent::new(60, 0.5, 1.0);
        assert_eq!(event.end_time(), 1.5);
    }

    #[test]
    fn test_active_interval_is_half_open() {
        let event = NoteEvent::new(60, 0.5, 1.0);
        assert!(!event.is_active_at(0.49));
        assert!(event.is_active_at(0.5));
        assert!(event.is_active_at(1.49));
        assert!(!event.is_active_at(1.5));
    }

    #[test]
    fn test_json_field_names() {
        let event = NoteEvent::new(64, 0.5, 1.0);
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"midiNumber":64,"time":0.5,"duration":1.0}"#);

        let parsed: NoteEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
