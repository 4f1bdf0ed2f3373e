// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note naming and key ranges.

pub mod note;

pub use note::{is_accidental, note_name, parse_note_name, MidiNote, Note, NoteRange};
