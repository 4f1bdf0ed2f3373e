// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for export and send failures.
//!
//! Both are recoverable: the UI turns them into status messages.

use std::io;

use thiserror::Error;

/// Malformed event data handed to the MIDI encoder
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("event {index}: start time {time} is not a finite, non-negative number of seconds")]
    InvalidTime { index: usize, time: f64 },

    #[error("event {index}: duration {duration} is not a finite, positive number of seconds")]
    InvalidDuration { index: usize, duration: f64 },

    #[error("event {index}: ends at {end} seconds, past the longest MIDI track")]
    OutOfRange { index: usize, end: f64 },

    #[error("event {index}: pitch {pitch} is outside the MIDI range 0-127")]
    InvalidPitch { index: usize, pitch: u8 },

    #[error("failed to write MIDI data: {0}")]
    Io(#[from] io::Error),
}

/// Endpoint unreachable or rejected the request
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to serialize events: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("{endpoint} answered HTTP {status}")]
    Status { endpoint: String, status: u16 },
}

/// Top-level error for operations the user triggers from the controls
#[derive(Debug, Error)]
pub enum PianoError {
    #[error("encoding failure: {0}")]
    Encoding(#[from] EncodingError),

    #[error("network failure: {0}")]
    Network(#[from] NetworkError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PianoError {
    /// Short label for the status line
    pub fn kind(&self) -> &'static str {
        match self {
            PianoError::Encoding(_) => "Save failed",
            PianoError::Network(_) => "Send failed",
            PianoError::Config(_) => "Config error",
        }
    }
}
