// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recording and export system.
//!
//! This module provides:
//! - Note events captured from key input
//! - The recording/playback state and its transitions
//! - Standard MIDI file export

pub mod capture;
pub mod event;
pub mod export;
pub mod state;

pub use capture::KeyCapture;
pub use event::NoteEvent;
pub use export::{Exporter, ExportNote, MidiEncoder, SmfEncoder, DATA_URI_PREFIX};
pub use state::{Effect, Mode, RecordingState, Transition};
