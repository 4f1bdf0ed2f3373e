// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recording/playback state and its transitions.
//!
//! Every control is a pure function from the current state to a
//! [`Transition`]: the next state plus the side effects the caller must carry
//! out (schedule timers, cancel them, toggle the playing indicator, submit a
//! payload). Nothing here touches a clock, a timer or a device.

use serde::Serialize;

use super::export::Exporter;
use super::NoteEvent;
use crate::error::EncodingError;
use crate::net::Payload;
use crate::playback::{active_at, boundary_instants, recording_end_time, TimerAction};

/// Whether key input is being recorded or the recording is being replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Accepting key input (initial)
    #[default]
    Recording,
    /// Replaying recorded events
    Playing,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Turn the "playing" indicator on or off
    ShowPlaying(bool),
    /// Fire `action` this many seconds after the transition
    Schedule { at: f64, action: TimerAction },
    /// Cancel every pending timer
    CancelTimers,
    /// Post the payload to the remote endpoint
    Submit(Payload),
}

/// Next state plus the effects needed to get there
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: RecordingState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn new(state: RecordingState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }
}

/// Everything the recorder knows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordingState {
    /// Current mode
    pub mode: Mode,
    /// Recorded events in insertion order
    pub events: Vec<NoteEvent>,
    /// Recording cursor: end of the latest recorded note (seconds)
    pub current_time: f64,
    /// Notes sounding at the last fired playback boundary
    pub current_events: Vec<NoteEvent>,
    /// Exported MIDI data URI (empty until saved)
    pub download: String,
}

impl RecordingState {
    /// Fresh state: recording, nothing captured
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if playing
    pub fn is_playing(&self) -> bool {
        self.mode == Mode::Playing
    }

    /// Time at which playback of the current events ends
    pub fn end_time(&self) -> f64 {
        recording_end_time(&self.events)
    }

    /// Append a note played while recording
    pub fn record(&self, event: NoteEvent) -> Transition {
        let mut next = self.clone();
        if next.mode == Mode::Recording {
            next.current_time = next.current_time.max(event.end_time());
            next.events.push(event);
        }
        Transition::new(next, Vec::new())
    }

    /// Start playback: one timer per boundary instant, then one to finish
    pub fn play(&self) -> Transition {
        if self.mode == Mode::Playing {
            return Transition::new(self.clone(), Vec::new());
        }

        let mut next = self.clone();
        next.mode = Mode::Playing;

        let mut effects = vec![Effect::ShowPlaying(true)];
        effects.extend(boundary_instants(&self.events).into_iter().map(|at| Effect::Schedule {
            at,
            action: TimerAction::Boundary(at),
        }));
        effects.push(Effect::Schedule {
            at: self.end_time(),
            action: TimerAction::Finish,
        });

        Transition::new(next, effects)
    }

    /// Stop playback and cancel every pending timer
    pub fn stop(&self) -> Transition {
        let mut next = self.clone();
        next.mode = Mode::Recording;
        next.current_events.clear();
        Transition::new(next, vec![Effect::CancelTimers, Effect::ShowPlaying(false)])
    }

    /// Stop, then forget everything recorded and exported
    pub fn clear(&self) -> Transition {
        let Transition { mut state, effects } = self.stop();
        state.events.clear();
        state.current_events.clear();
        state.current_time = 0.0;
        state.download.clear();
        Transition::new(state, effects)
    }

    /// Export the events as a MIDI data URI
    pub fn save(&self, exporter: &Exporter) -> Result<Transition, EncodingError> {
        let download = exporter.data_uri(&self.events)?;
        let mut next = self.clone();
        next.download = download;
        Ok(Transition::new(next, Vec::new()))
    }

    /// Hand the events to the network sender
    pub fn send(&self) -> Transition {
        let payload = Payload::new(self.events.clone());
        Transition::new(self.clone(), vec![Effect::Submit(payload)])
    }

    /// A playback timer fired
    pub fn fire(&self, action: TimerAction) -> Transition {
        match action {
            TimerAction::Boundary(t) => {
                let mut next = self.clone();
                if next.mode == Mode::Playing {
                    next.current_events = active_at(&next.events, t);
                }
                Transition::new(next, Vec::new())
            }
            TimerAction::Finish => self.stop(),
        }
    }
}
