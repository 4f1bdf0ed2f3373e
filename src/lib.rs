// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Terminal piano recorder.
//!
//! Record notes from the computer keyboard or a MIDI keyboard, replay them
//! on a timer scheduler, export a Standard MIDI File as a data URI and post
//! the recorded events to a remote endpoint.

pub mod audio;
pub mod config;
pub mod control;
pub mod error;
pub mod midi;
pub mod music;
pub mod net;
pub mod playback;
pub mod recording;
pub mod session;
pub mod timing;
pub mod ui;

pub use error::{EncodingError, NetworkError, PianoError};
pub use recording::{Mode, NoteEvent, RecordingState};
pub use session::Session;
