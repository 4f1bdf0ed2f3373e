// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note names, MIDI numbers and playable key ranges.
//!
//! Names follow the convention where middle C (MIDI 60) is `C4`, so `c3`
//! is 48 and `f4` is 65.

use std::fmt;

use serde::{Deserialize, Serialize};

/// MIDI note number type (0-127)
pub type MidiNote = u8;

/// Note names (pitch classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Note {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

impl Note {
    /// All notes in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::Cs,
        Note::D,
        Note::Ds,
        Note::E,
        Note::F,
        Note::Fs,
        Note::G,
        Note::Gs,
        Note::A,
        Note::As,
        Note::B,
    ];

    /// Get the pitch class (0-11) for this note
    pub fn pitch_class(self) -> u8 {
        self as u8
    }

    /// Get note from pitch class
    pub fn from_pitch_class(pc: u8) -> Self {
        Note::ALL[(pc % 12) as usize]
    }

    /// Get the pitch class of a MIDI note
    pub fn of(midi_note: MidiNote) -> Self {
        Note::from_pitch_class(midi_note % 12)
    }

    /// Parse a pitch class name (e.g., "C", "c#", "Db")
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "C" | "B#" => Some(Note::C),
            "C#" | "DB" => Some(Note::Cs),
            "D" => Some(Note::D),
            "D#" | "EB" => Some(Note::Ds),
            "E" | "FB" => Some(Note::E),
            "F" | "E#" => Some(Note::F),
            "F#" | "GB" => Some(Note::Fs),
            "G" => Some(Note::G),
            "G#" | "AB" => Some(Note::Gs),
            "A" => Some(Note::A),
            "A#" | "BB" => Some(Note::As),
            "B" | "CB" => Some(Note::B),
            _ => None,
        }
    }

    /// Black key on a piano
    pub fn is_accidental(self) -> bool {
        matches!(self, Note::Cs | Note::Ds | Note::Fs | Note::Gs | Note::As)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
        f.write_str(NAMES[self.pitch_class() as usize])
    }
}

/// Convert MIDI note number to name
pub fn note_name(note: MidiNote) -> String {
    let octave = (note / 12) as i8 - 1;
    format!("{}{}", Note::of(note), octave)
}

/// Parse a note name with octave (e.g., "c3", "F#4", "Bb-1") into a MIDI number
pub fn parse_note_name(name: &str) -> Option<MidiNote> {
    let name = name.trim();
    let split = name.find(|c: char| c.is_ascii_digit() || c == '-')?;
    let (class, octave) = name.split_at(split);
    let note = Note::parse(class)?;
    let octave: i16 = octave.parse().ok()?;

    // B# and Cb cross the octave boundary
    let class_upper = class.to_uppercase();
    let octave = match class_upper.as_str() {
        "B#" => octave + 1,
        "CB" => octave - 1,
        _ => octave,
    };

    let midi = (octave + 1) * 12 + note.pitch_class() as i16;
    if (0..=127).contains(&midi) {
        Some(midi as MidiNote)
    } else {
        None
    }
}

/// Is this MIDI note a black key
pub fn is_accidental(note: MidiNote) -> bool {
    Note::of(note).is_accidental()
}

/// Inclusive range of playable MIDI notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRange {
    /// Lowest key
    pub first: MidiNote,
    /// Highest key
    pub last: MidiNote,
}

impl NoteRange {
    /// Create a range, swapping the bounds if given backwards
    pub fn new(first: MidiNote, last: MidiNote) -> Self {
        Self {
            first: first.min(last),
            last: last.max(first),
        }
    }

    /// Parse both bounds from note names
    pub fn from_names(first: &str, last: &str) -> Option<Self> {
        Some(Self::new(parse_note_name(first)?, parse_note_name(last)?))
    }

    /// Check if a note falls inside the range
    pub fn contains(&self, note: MidiNote) -> bool {
        note >= self.first && note <= self.last
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        (self.last - self.first) as usize + 1
    }

    /// A range always holds at least one key
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over every key in the range
    pub fn notes(&self) -> impl Iterator<Item = MidiNote> {
        self.first..=self.last
    }
}

impl Default for NoteRange {
    fn default() -> Self {
        // c3 to f4
        Self::new(48, 65)
    }
}
