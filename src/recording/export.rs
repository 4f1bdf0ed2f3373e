// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file export.
//!
//! Recorded events map one-to-one onto MIDI notes (pitch, start, duration)
//! and are written as a Type 0 file. The UI shows the result as a
//! `data:audio/midi;base64,...` string.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as base64, Engine};
use tracing::debug;

use super::NoteEvent;
use crate::error::EncodingError;
use crate::midi::messages;
use crate::music::MidiNote;

/// Prefix of an exported data URI
pub const DATA_URI_PREFIX: &str = "data:audio/midi;base64,";

/// Largest tick a variable-length delta can carry
pub const MAX_TICK: u64 = 0x0FFF_FFFF;

/// A note for export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportNote {
    /// Start tick
    pub tick: u64,
    /// Note number (0-127)
    pub pitch: MidiNote,
    /// Duration in ticks
    pub duration: u64,
}

impl ExportNote {
    /// Create a new export note
    pub fn new(tick: u64, pitch: MidiNote, duration: u64) -> Self {
        Self {
            tick,
            pitch,
            duration,
        }
    }

    /// End tick, or `None` if it does not fit in a u64
    pub fn end_tick(&self) -> Option<u64> {
        self.tick.checked_add(self.duration)
    }
}

/// Turns notes and an instrument selection into MIDI file bytes
pub trait MidiEncoder: Send + Sync {
    /// Encode `notes` played on General MIDI `program`
    fn encode(&self, notes: &[ExportNote], program: u8) -> Result<Vec<u8>, EncodingError>;

    /// Ticks per quarter note the encoder expects
    fn ppqn(&self) -> u16;

    /// Tempo the encoder writes, in BPM
    fn tempo(&self) -> f64;
}

/// MIDI event for export
#[derive(Debug, Clone)]
struct MidiExportEvent {
    /// Absolute tick
    tick: u64,
    /// Note-offs sort ahead of everything else on the same tick
    order: u8,
    /// Event data
    data: Vec<u8>,
}

impl MidiExportEvent {
    fn note_on(tick: u64, channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            tick,
            order: 2,
            data: vec![messages::NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
        }
    }

    fn note_off(tick: u64, channel: u8, note: u8) -> Self {
        Self {
            tick,
            order: 0,
            data: vec![messages::NOTE_OFF | (channel & 0x0F), note & 0x7F, 0],
        }
    }

    fn program_change(tick: u64, channel: u8, program: u8) -> Self {
        Self {
            tick,
            order: 1,
            data: vec![messages::PROGRAM_CHANGE | (channel & 0x0F), program & 0x7F],
        }
    }

    fn tempo(tick: u64, bpm: f64) -> Self {
        let microseconds = (60_000_000.0 / bpm) as u32;
        Self {
            tick,
            order: 1,
            data: vec![
                0xFF, 0x51, 0x03,
                ((microseconds >> 16) & 0xFF) as u8,
                ((microseconds >> 8) & 0xFF) as u8,
                (microseconds & 0xFF) as u8,
            ],
        }
    }

    fn end_of_track() -> Self {
        Self {
            tick: 0, // Written with delta 0 after the last event
            order: 0,
            data: vec![0xFF, 0x2F, 0x00],
        }
    }
}

/// Type 0 Standard MIDI File writer
#[derive(Debug, Clone)]
pub struct SmfEncoder {
    /// PPQN (ticks per quarter note)
    ppqn: u16,
    /// Tempo in BPM
    tempo: f64,
    /// MIDI channel (0-15)
    channel: u8,
    /// Note-on velocity
    velocity: u8,
}

impl SmfEncoder {
    /// Create an encoder with 128 PPQN at 120 BPM, channel 0, velocity 50
    pub fn new() -> Self {
        Self {
            ppqn: 128,
            tempo: 120.0,
            channel: 0,
            velocity: 50,
        }
    }

    /// Set PPQN
    pub fn with_ppqn(mut self, ppqn: u16) -> Self {
        self.ppqn = ppqn.max(1);
        self
    }

    /// Set tempo
    pub fn with_tempo(mut self, bpm: f64) -> Self {
        self.tempo = bpm.clamp(20.0, 300.0);
        self
    }

    /// Set channel
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel & 0x0F;
        self
    }

    /// Set velocity
    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity.clamp(1, 127);
        self
    }

    /// Write MIDI data to writer
    pub fn write<W: Write>(&self, writer: &mut W, notes: &[ExportNote], program: u8) -> io::Result<()> {
        let mut events = Vec::with_capacity(notes.len() * 2 + 2);

        events.push(MidiExportEvent::tempo(0, self.tempo));
        events.push(MidiExportEvent::program_change(0, self.channel, program));

        for note in notes {
            events.push(MidiExportEvent::note_on(
                note.tick,
                self.channel,
                note.pitch,
                self.velocity,
            ));
            let end = note
                .end_tick()
                .filter(|end| *end <= MAX_TICK)
                .ok_or_else(|| out_of_range(note.tick))?;
            events.push(MidiExportEvent::note_off(end, self.channel, note.pitch));
        }

        // Stable sort keeps insertion order for identical keys
        events.sort_by_key(|e| (e.tick, e.order));

        self.write_header(writer)?;
        self.write_track(writer, &events)
    }

    /// Write MIDI file header chunk
    fn write_header<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b"MThd")?;
        // Chunk length (always 6)
        writer.write_all(&[0, 0, 0, 6])?;
        // Format 0, one track
        writer.write_all(&0u16.to_be_bytes())?;
        writer.write_all(&1u16.to_be_bytes())?;
        writer.write_all(&self.ppqn.to_be_bytes())?;
        Ok(())
    }

    /// Write a track chunk
    fn write_track<W: Write>(&self, writer: &mut W, events: &[MidiExportEvent]) -> io::Result<()> {
        let mut track_data = Vec::new();
        let mut last_tick = 0u64;

        for event in events {
            let delta = event.tick.saturating_sub(last_tick);
            let delta = u32::try_from(delta)
                .ok()
                .filter(|d| *d as u64 <= MAX_TICK)
                .ok_or_else(|| out_of_range(event.tick))?;
            write_variable_length(&mut track_data, delta)?;
            track_data.extend_from_slice(&event.data);
            last_tick = event.tick;
        }

        let end_event = MidiExportEvent::end_of_track();
        write_variable_length(&mut track_data, 0)?;
        track_data.extend_from_slice(&end_event.data);

        writer.write_all(b"MTrk")?;
        let length = track_data.len() as u32;
        writer.write_all(&length.to_be_bytes())?;
        writer.write_all(&track_data)?;

        Ok(())
    }
}

impl Default for SmfEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiEncoder for SmfEncoder {
    fn encode(&self, notes: &[ExportNote], program: u8) -> Result<Vec<u8>, EncodingError> {
        let mut buffer = Vec::new();
        self.write(&mut buffer, notes, program)?;
        Ok(buffer)
    }

    fn ppqn(&self) -> u16 {
        self.ppqn
    }

    fn tempo(&self) -> f64 {
        self.tempo
    }
}

fn out_of_range(tick: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("tick {} is past the end of a MIDI track", tick),
    )
}

/// Write variable-length quantity
fn write_variable_length<W: Write>(writer: &mut W, mut value: u32) -> io::Result<()> {
    let mut bytes = Vec::with_capacity(4);

    bytes.push((value & 0x7F) as u8);
    value >>= 7;

    while value > 0 {
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }

    bytes.reverse();
    writer.write_all(&bytes)
}

/// Maps recorded events onto an encoder
pub struct Exporter {
    encoder: Box<dyn MidiEncoder>,
    /// General MIDI program selected at the start of the track
    program: u8,
}

impl Exporter {
    /// Create an exporter around an encoder
    pub fn new(encoder: Box<dyn MidiEncoder>, program: u8) -> Self {
        Self {
            encoder,
            program: program & 0x7F,
        }
    }

    /// Instrument program
    pub fn program(&self) -> u8 {
        self.program
    }

    /// Convert seconds to ticks at the encoder's tempo and PPQN
    pub fn seconds_to_ticks(&self, seconds: f64) -> u64 {
        let ticks_per_second = self.encoder.tempo() / 60.0 * self.encoder.ppqn() as f64;
        (seconds * ticks_per_second).round() as u64
    }

    /// Validate events and map them to export notes, one per event
    pub fn to_notes(&self, events: &[NoteEvent]) -> Result<Vec<ExportNote>, EncodingError> {
        events
            .iter()
            .enumerate()
            .map(|(index, event)| {
                if !event.time.is_finite() || event.time < 0.0 {
                    return Err(EncodingError::InvalidTime {
                        index,
                        time: event.time,
                    });
                }
                if !event.duration.is_finite() || event.duration <= 0.0 {
                    return Err(EncodingError::InvalidDuration {
                        index,
                        duration: event.duration,
                    });
                }
                if event.pitch > 127 {
                    return Err(EncodingError::InvalidPitch {
                        index,
                        pitch: event.pitch,
                    });
                }

                let tick = self.seconds_to_ticks(event.time);
                let duration = self.seconds_to_ticks(event.duration).max(1);
                let note = ExportNote::new(tick, event.pitch, duration);
                match note.end_tick() {
                    Some(end) if end <= MAX_TICK => Ok(note),
                    _ => Err(EncodingError::OutOfRange {
                        index,
                        end: event.end_time(),
                    }),
                }
            })
            .collect()
    }

    /// Encode events to MIDI file bytes
    pub fn export_to_bytes(&self, events: &[NoteEvent]) -> Result<Vec<u8>, EncodingError> {
        let notes = self.to_notes(events)?;
        let bytes = self.encoder.encode(&notes, self.program)?;
        debug!(notes = notes.len(), bytes = bytes.len(), "encoded MIDI");
        Ok(bytes)
    }

    /// Encode events as a downloadable data URI
    pub fn data_uri(&self, events: &[NoteEvent]) -> Result<String, EncodingError> {
        let bytes = self.export_to_bytes(events)?;
        Ok(format!("{}{}", DATA_URI_PREFIX, base64.encode(bytes)))
    }

    /// Export to a .mid file
    pub fn write_file<P: AsRef<Path>>(&self, events: &[NoteEvent], path: P) -> Result<(), EncodingError> {
        let bytes = self.export_to_bytes(events)?;
        fs::write(path, bytes)?;
        Ok(())
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(Box::new(SmfEncoder::new()), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Decode the single track of a Type 0 file into (absolute tick, bytes)
    fn track_events(bytes: &[u8]) -> Vec<(u64, Vec<u8>)> {
        let length = u32::from_be_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]) as usize;
        let data = &bytes[22..22 + length];

        let mut events = Vec::new();
        let mut pos = 0;
        let mut tick = 0u64;
        while pos < data.len() {
            let mut delta = 0u64;
            loop {
                let b = data[pos];
                pos += 1;
                delta = (delta << 7) | (b & 0x7F) as u64;
                if b & 0x80 == 0 {
                    break;
                }
            }
            tick += delta;

            let len = match data[pos] {
                0xFF => 3 + data[pos + 2] as usize,
                s if s & 0xF0 == 0xC0 => 2,
                _ => 3,
            };
            events.push((tick, data[pos..pos + len].to_vec()));
            pos += len;
        }
        events
    }

    #[test]
    fn test_export_note() {
        let note = ExportNote::new(0, 60, 128);
        assert_eq!(note.end_tick(), Some(128));
        assert_eq!(ExportNote::new(u64::MAX, 60, 256).end_tick(), None);
    }

    #[test]
    fn test_huge_times_are_rejected() {
        let exporter = Exporter::default();
        let result = exporter.data_uri(&[
            NoteEvent::new(60, 0.0, 1.0),
            NoteEvent::new(60, 1e30, 1.0),
        ]);
        assert!(matches!(result, Err(EncodingError::OutOfRange { index: 1, .. })));

        // 2^24 seconds is 2^32 ticks, which no delta can hold
        let result = exporter.export_to_bytes(&[NoteEvent::new(62, 16_777_216.0, 1.0)]);
        assert!(matches!(result, Err(EncodingError::OutOfRange { index: 0, .. })));
    }

    #[test]
    fn test_encoder_rejects_unencodable_ticks() {
        let encoder = SmfEncoder::new();
        let result = encoder.encode(&[ExportNote::new(MAX_TICK, 60, 1)], 1);
        assert!(matches!(result, Err(EncodingError::Io(_))));

        let result = encoder.encode(&[ExportNote::new(u64::MAX, 60, 256)], 1);
        assert!(result.is_err());

        assert!(encoder.encode(&[ExportNote::new(MAX_TICK - 1, 60, 1)], 1).is_ok());
    }

    #[test]
    fn test_header() {
        let encoder = SmfEncoder::new().with_ppqn(24);
        let bytes = encoder.encode(&[ExportNote::new(0, 60, 24)], 1).unwrap();

        assert_eq!(&bytes[0..4], b"MThd");
        assert_eq!(bytes[9], 0); // Format 0
        assert_eq!(&bytes[10..12], &1u16.to_be_bytes()); // One track
        assert_eq!(&bytes[12..14], &24u16.to_be_bytes()); // PPQN
        assert_eq!(&bytes[14..18], b"MTrk");
    }

    #[test]
    fn test_track_contents() {
        let encoder = SmfEncoder::new().with_velocity(100);
        let notes = [ExportNote::new(0, 60, 128), ExportNote::new(64, 64, 128)];
        let events = track_events(&encoder.encode(&notes, 1).unwrap());

        assert_eq!(events[0], (0, vec![0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]));
        assert_eq!(events[1], (0, vec![0xC0, 1]));
        assert_eq!(events[2], (0, vec![0x90, 60, 100]));
        assert_eq!(events[3], (64, vec![0x90, 64, 100]));
        assert_eq!(events[4], (128, vec![0x80, 60, 0]));
        assert_eq!(events[5], (192, vec![0x80, 64, 0]));
        assert_eq!(events[6], (192, vec![0xFF, 0x2F, 0x00]));
    }

    #[test]
    fn test_note_off_before_note_on_same_tick() {
        let encoder = SmfEncoder::new();
        let notes = [ExportNote::new(0, 60, 128), ExportNote::new(128, 60, 128)];
        let events = track_events(&encoder.encode(&notes, 1).unwrap());

        assert_eq!(events[3], (128, vec![0x80, 60, 0]));
        assert_eq!(events[4], (128, vec![0x90, 60, 50]));
    }

    #[test]
    fn test_variable_length() {
        let mut buffer = Vec::new();

        write_variable_length(&mut buffer, 0).unwrap();
        assert_eq!(buffer, vec![0x00]);

        buffer.clear();
        write_variable_length(&mut buffer, 127).unwrap();
        assert_eq!(buffer, vec![0x7F]);

        buffer.clear();
        write_variable_length(&mut buffer, 128).unwrap();
        assert_eq!(buffer, vec![0x81, 0x00]);

        buffer.clear();
        write_variable_length(&mut buffer, 16383).unwrap();
        assert_eq!(buffer, vec![0xFF, 0x7F]);
    }

    #[test]
    fn test_seconds_to_ticks() {
        // 120 BPM, 128 PPQN: 256 ticks per second
        let exporter = Exporter::default();
        assert_eq!(exporter.seconds_to_ticks(0.0), 0);
        assert_eq!(exporter.seconds_to_ticks(0.5), 128);
        assert_eq!(exporter.seconds_to_ticks(1.0), 256);
    }

    #[test]
    fn test_one_note_per_event() {
        let exporter = Exporter::default();
        let events = vec![
            NoteEvent::new(60, 0.0, 1.0),
            NoteEvent::new(64, 0.5, 1.0),
            NoteEvent::new(67, 0.5, 0.001),
        ];
        let notes = exporter.to_notes(&events).unwrap();

        assert_eq!(
            notes,
            vec![
                ExportNote::new(0, 60, 256),
                ExportNote::new(128, 64, 256),
                ExportNote::new(128, 67, 1), // Never shorter than a tick
            ]
        );
    }

    #[test]
    fn test_invalid_events() {
        let exporter = Exporter::default();

        let err = exporter.to_notes(&[NoteEvent::new(60, -1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidTime { index: 0, .. }));

        let err = exporter
            .to_notes(&[NoteEvent::new(60, 0.0, 1.0), NoteEvent::new(60, 1.0, 0.0)])
            .unwrap_err();
        assert!(matches!(err, EncodingError::InvalidDuration { index: 1, .. }));

        let err = exporter.to_notes(&[NoteEvent::new(60, f64::NAN, 1.0)]).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidTime { .. }));

        let err = exporter.to_notes(&[NoteEvent::new(128, 0.0, 1.0)]).unwrap_err();
        assert!(matches!(err, EncodingError::InvalidPitch { pitch: 128, .. }));
    }

    #[test]
    fn test_data_uri_deterministic() {
        let exporter = Exporter::default();
        let events = vec![NoteEvent::new(60, 0.0, 1.0)];

        let first = exporter.data_uri(&events).unwrap();
        let second = exporter.data_uri(&events).unwrap();

        assert!(first.starts_with(DATA_URI_PREFIX));
        assert!(first.len() > DATA_URI_PREFIX.len());
        assert_eq!(first, second);

        let decoded = base64.decode(&first[DATA_URI_PREFIX.len()..]).unwrap();
        assert_eq!(&decoded[0..4], b"MThd");
    }

    #[test]
    fn test_empty_recording_still_exports() {
        let exporter = Exporter::default();
        let bytes = exporter.export_to_bytes(&[]).unwrap();
        let events = track_events(&bytes);
        assert_eq!(events.len(), 3); // Tempo, program change, end of track
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.mid");

        let exporter = Exporter::default();
        exporter.write_file(&[NoteEvent::new(60, 0.0, 1.0)], &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], b"MThd");
    }
}
