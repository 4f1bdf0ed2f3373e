// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note output through a midir MIDI port.

use anyhow::{anyhow, Context, Result};
use midir::{MidiOutput, MidiOutputConnection};
use tracing::{debug, info};

use super::NoteOutput;
use crate::midi::messages;
use crate::music::MidiNote;

/// Client name shown to other MIDI software
const CLIENT_NAME: &str = "pianorec";

/// Sends notes to a MIDI output port
pub struct MidiPortOutput {
    connection: MidiOutputConnection,
    port_name: String,
    channel: u8,
    /// Notes we have turned on and not yet off
    sounding: [bool; 128],
}

impl MidiPortOutput {
    /// Connect to the first port whose name contains `name` (case-insensitive)
    pub fn connect(name: &str, channel: u8) -> Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME)
            .map_err(|e| anyhow!("Failed to create MIDI output: {}", e))?;

        let wanted = name.to_lowercase();
        let (port, port_name) = midi_out
            .ports()
            .into_iter()
            .find_map(|port| {
                let port_name = midi_out.port_name(&port).ok()?;
                port_name
                    .to_lowercase()
                    .contains(&wanted)
                    .then_some((port, port_name))
            })
            .with_context(|| format!("MIDI output '{}' not found", name))?;

        let connection = midi_out
            .connect(&port, "pianorec-out")
            .map_err(|e| anyhow!("Failed to connect to '{}': {}", port_name, e))?;

        info!(port = %port_name, channel, "MIDI output connected");

        Ok(Self {
            connection,
            port_name,
            channel: channel & 0x0F,
            sounding: [false; 128],
        })
    }

    fn send(&mut self, message: &[u8]) -> Result<()> {
        self.connection
            .send(message)
            .map_err(|e| anyhow!("Failed to send to '{}': {}", self.port_name, e))
    }
}

impl NoteOutput for MidiPortOutput {
    fn note_on(&mut self, note: MidiNote, velocity: u8) -> Result<()> {
        let note = note & 0x7F;
        self.send(&[messages::NOTE_ON | self.channel, note, velocity.clamp(1, 127)])?;
        self.sounding[note as usize] = true;
        Ok(())
    }

    fn note_off(&mut self, note: MidiNote) -> Result<()> {
        let note = note & 0x7F;
        self.send(&[messages::NOTE_OFF | self.channel, note, 0])?;
        self.sounding[note as usize] = false;
        Ok(())
    }

    fn all_notes_off(&mut self) -> Result<()> {
        // Explicit note-offs first, then the channel-wide controller
        for note in 0..128u8 {
            if self.sounding[note as usize] {
                self.note_off(note)?;
            }
        }
        self.send(&[messages::CONTROL_CHANGE | self.channel, messages::ALL_NOTES_OFF, 0])?;
        debug!(port = %self.port_name, "all notes off");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}

impl Drop for MidiPortOutput {
    fn drop(&mut self) {
        let _ = self.all_notes_off();
    }
}

/// Names of the available MIDI output ports
pub fn list_ports() -> Vec<String> {
    match MidiOutput::new(CLIENT_NAME) {
        Ok(midi_out) => midi_out
            .ports()
            .iter()
            .filter_map(|port| midi_out.port_name(port).ok())
            .collect(),
        Err(_) => Vec::new(),
    }
}
