// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note output.
//!
//! The recorder never synthesizes sound itself. It drives a [`NoteOutput`]
//! that is built once at startup and handed to the session:
//! - a MIDI output port (a hardware or software synth)
//! - a silent output when no port is configured

pub mod output;

pub use output::{list_ports, MidiPortOutput};

use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::music::MidiNote;

/// Anything that can sound notes
pub trait NoteOutput: Send {
    /// Start sounding a note
    fn note_on(&mut self, note: MidiNote, velocity: u8) -> Result<()>;

    /// Stop sounding a note
    fn note_off(&mut self, note: MidiNote) -> Result<()>;

    /// Silence everything
    fn all_notes_off(&mut self) -> Result<()>;

    /// Short description for the status line
    fn name(&self) -> &str;
}

/// Output that discards every note
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl NoteOutput for NullOutput {
    fn note_on(&mut self, _note: MidiNote, _velocity: u8) -> Result<()> {
        Ok(())
    }

    fn note_off(&mut self, _note: MidiNote) -> Result<()> {
        Ok(())
    }

    fn all_notes_off(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "silent"
    }
}

/// What a [`MemoryOutput`] was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCall {
    NoteOn(MidiNote, u8),
    NoteOff(MidiNote),
    AllNotesOff,
}

/// Output that remembers every call
///
/// Clones share the same log, so one clone can be handed to a session while
/// another is inspected.
#[derive(Debug, Default, Clone)]
pub struct MemoryOutput {
    calls: Arc<Mutex<Vec<OutputCall>>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls so far, oldest first
    pub fn calls(&self) -> Vec<OutputCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Forget recorded calls
    pub fn reset(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn push(&self, call: OutputCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl NoteOutput for MemoryOutput {
    fn note_on(&mut self, note: MidiNote, velocity: u8) -> Result<()> {
        self.push(OutputCall::NoteOn(note, velocity));
        Ok(())
    }

    fn note_off(&mut self, note: MidiNote) -> Result<()> {
        self.push(OutputCall::NoteOff(note));
        Ok(())
    }

    fn all_notes_off(&mut self) -> Result<()> {
        self.push(OutputCall::AllNotesOff);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_output() {
        let mut output = NullOutput;
        assert!(output.note_on(60, 100).is_ok());
        assert!(output.note_off(60).is_ok());
        assert!(output.all_notes_off().is_ok());
        assert_eq!(output.name(), "silent");
    }

    #[test]
    fn test_memory_output_shares_log() {
        let probe = MemoryOutput::new();
        let mut output: Box<dyn NoteOutput> = Box::new(probe.clone());

        output.note_on(60, 90).unwrap();
        output.note_off(60).unwrap();
        output.all_notes_off().unwrap();

        assert_eq!(
            probe.calls(),
            vec![
                OutputCall::NoteOn(60, 90),
                OutputCall::NoteOff(60),
                OutputCall::AllNotesOff,
            ]
        );

        probe.reset();
        assert!(probe.calls().is_empty());
    }
}
