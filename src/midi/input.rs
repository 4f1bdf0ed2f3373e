// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI input from a hardware keyboard.

use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::{anyhow, Context, Result};
use midir::{Ignore, MidiInputConnection};
use tracing::{info, trace};

use super::messages;
use crate::music::MidiNote;

/// Client name shown to other MIDI software
const CLIENT_NAME: &str = "pianorec";

/// Parsed MIDI message types
#[derive(Debug, Clone, PartialEq)]
pub enum MidiMessage {
    /// Note On: channel (0-15), note (0-127), velocity (1-127)
    NoteOn { channel: u8, note: MidiNote, velocity: u8 },
    /// Note Off: channel (0-15), note (0-127)
    NoteOff { channel: u8, note: MidiNote },
    /// Anything else (controllers, clock, sysex), kept raw
    Other(Vec<u8>),
}

impl MidiMessage {
    /// Parse raw MIDI bytes into a MidiMessage
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&status, rest) = data.split_first()?;
        if status < 0x80 {
            // Running status is not used by the backends midir wraps
            return None;
        }

        let msg_type = status & 0xF0;
        let channel = status & 0x0F;

        match (msg_type, rest) {
            (messages::NOTE_OFF, [note, _, ..]) => Some(MidiMessage::NoteOff {
                channel,
                note: note & 0x7F,
            }),
            (messages::NOTE_ON, [note, velocity, ..]) => {
                let velocity = velocity & 0x7F;
                // Note On with velocity 0 is equivalent to Note Off
                if velocity == 0 {
                    Some(MidiMessage::NoteOff {
                        channel,
                        note: note & 0x7F,
                    })
                } else {
                    Some(MidiMessage::NoteOn {
                        channel,
                        note: note & 0x7F,
                        velocity,
                    })
                }
            }
            _ => Some(MidiMessage::Other(data.to_vec())),
        }
    }

    /// Check if this is a note message
    pub fn is_note(&self) -> bool {
        matches!(self, MidiMessage::NoteOn { .. } | MidiMessage::NoteOff { .. })
    }
}

/// Open connection to a MIDI input port
pub struct MidiInput {
    _connection: MidiInputConnection<()>,
    port_name: String,
    receiver: Receiver<MidiMessage>,
}

impl MidiInput {
    /// Connect to the first port whose name contains `name` (case-insensitive)
    pub fn connect(name: &str) -> Result<Self> {
        let mut midi_in = midir::MidiInput::new(CLIENT_NAME)
            .map_err(|e| anyhow!("Failed to create MIDI input: {}", e))?;
        midi_in.ignore(Ignore::All);

        let wanted = name.to_lowercase();
        let (port, port_name) = midi_in
            .ports()
            .into_iter()
            .find_map(|port| {
                let port_name = midi_in.port_name(&port).ok()?;
                port_name
                    .to_lowercase()
                    .contains(&wanted)
                    .then_some((port, port_name))
            })
            .with_context(|| format!("MIDI input '{}' not found", name))?;

        let (tx, rx): (Sender<MidiMessage>, Receiver<MidiMessage>) = mpsc::channel();

        let connection = midi_in
            .connect(
                &port,
                "pianorec-in",
                move |_stamp, data, _| {
                    if let Some(msg) = MidiMessage::parse(data) {
                        if msg.is_note() {
                            trace!(?msg, "midi in");
                            let _ = tx.send(msg);
                        }
                    }
                },
                (),
            )
            .map_err(|e| anyhow!("Failed to connect to '{}': {}", port_name, e))?;

        info!(port = %port_name, "MIDI input connected");

        Ok(Self {
            _connection: connection,
            port_name,
            receiver: rx,
        })
    }

    /// Connected port name
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Try to receive the next MIDI message (non-blocking)
    pub fn try_recv(&self) -> Option<MidiMessage> {
        self.receiver.try_recv().ok()
    }

    /// Receive all pending MIDI messages
    pub fn recv_all(&self) -> Vec<MidiMessage> {
        self.receiver.try_iter().collect()
    }
}

/// List all available MIDI input ports
pub fn list_sources() -> Vec<(usize, String)> {
    match midir::MidiInput::new(CLIENT_NAME) {
        Ok(midi_in) => midi_in
            .ports()
            .iter()
            .enumerate()
            .map(|(i, port)| {
                let name = midi_in
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown {}", i));
                (i, name)
            })
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Print MIDI inputs and outputs to stdout
pub fn print_ports() {
    let sources = list_sources();
    if sources.is_empty() {
        println!("No MIDI inputs found.");
    } else {
        println!("Available MIDI inputs:");
        for (i, name) in sources {
            println!("  {}: {}", i, name);
        }
    }

    let outputs = crate::audio::list_ports();
    if outputs.is_empty() {
        println!("No MIDI outputs found.");
    } else {
        println!("Available MIDI outputs:");
        for (i, name) in outputs.iter().enumerate() {
            println!("  {}: {}", i, name);
        }
    }
}
