// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recorder session.
//!
//! Owns the recording state together with everything its transitions need
//! to run: the timer queue, the clock, the note output, key capture and the
//! exporter. Each control applies a pure transition and then carries out the
//! effects it asked for.

use std::mem;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::audio::NoteOutput;
use crate::error::EncodingError;
use crate::music::MidiNote;
use crate::net::Payload;
use crate::playback::TimerQueue;
use crate::recording::{Effect, Exporter, KeyCapture, NoteEvent, RecordingState, Transition};
use crate::timing::Clock;

/// Default velocity for live and replayed notes
pub const DEFAULT_VELOCITY: u8 = 100;

/// Recording state plus the machinery that drives it
pub struct Session<C: Clock> {
    state: RecordingState,
    timers: TimerQueue,
    clock: C,
    output: Box<dyn NoteOutput>,
    capture: KeyCapture,
    exporter: Exporter,
    /// Velocity for live and replayed notes
    velocity: u8,
    /// Clock time Play was pressed
    play_started: Duration,
    /// "Playing" indicator
    indicator: bool,
    /// Payloads waiting to be handed to the sender
    outbox: Vec<Payload>,
}

impl<C: Clock> Session<C> {
    /// Create a session with an empty recording
    pub fn new(clock: C, output: Box<dyn NoteOutput>, exporter: Exporter) -> Self {
        Self {
            state: RecordingState::new(),
            timers: TimerQueue::new(),
            clock,
            output,
            capture: KeyCapture::new(),
            exporter,
            velocity: DEFAULT_VELOCITY,
            play_started: Duration::ZERO,
            indicator: false,
            outbox: Vec::new(),
        }
    }

    /// Set the velocity for live and replayed notes
    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity.clamp(1, 127);
        self
    }

    /// Current recording state
    pub fn state(&self) -> &RecordingState {
        &self.state
    }

    /// Whether the "playing" indicator is on
    pub fn is_playing(&self) -> bool {
        self.indicator
    }

    /// Time source for recording and playback
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Name of the note output
    pub fn output_name(&self) -> &str {
        self.output.name()
    }

    /// Seconds since Play was pressed, while playing
    pub fn playback_position(&self) -> Option<f64> {
        if self.state.is_playing() {
            Some(self.clock.now().saturating_sub(self.play_started).as_secs_f64())
        } else {
            None
        }
    }

    /// Notes held on the keyboard right now
    pub fn held_notes(&self) -> Vec<MidiNote> {
        let mut held: Vec<MidiNote> = self.capture.held().collect();
        held.sort_unstable();
        held
    }

    /// Pending playback timers
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Start playback
    ///
    /// Keys still held are released and recorded first. Timers that are
    /// already due (the boundary at 0, and the end of an empty recording)
    /// fire before this returns.
    pub fn play(&mut self) {
        if self.state.is_playing() {
            return;
        }
        self.commit_held();
        self.play_started = self.clock.now();
        let transition = self.state.play();
        info!(
            events = self.state.events.len(),
            end = self.state.end_time(),
            "play"
        );
        self.apply(transition);
        self.tick();
    }

    /// Stop playback
    pub fn stop(&mut self) {
        let transition = self.state.stop();
        debug!("stop");
        self.apply(transition);
    }

    /// Stop and discard the recording and any export
    pub fn clear(&mut self) {
        let transition = self.state.clear();
        self.capture.reset();
        if let Err(e) = self.output.all_notes_off() {
            warn!("all notes off failed: {}", e);
        }
        info!("cleared");
        self.apply(transition);
    }

    /// Export the recording as a MIDI data URI
    ///
    /// On failure the state is left untouched.
    pub fn save(&mut self) -> Result<&str, EncodingError> {
        match self.state.save(&self.exporter) {
            Ok(transition) => {
                self.apply(transition);
                info!(
                    events = self.state.events.len(),
                    bytes = self.state.download.len(),
                    "saved"
                );
                Ok(&self.state.download)
            }
            Err(e) => {
                warn!("save failed: {}", e);
                Err(e)
            }
        }
    }

    /// Write the recording to a Standard MIDI File
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EncodingError> {
        self.exporter.write_file(&self.state.events, path.as_ref())?;
        info!(
            events = self.state.events.len(),
            path = ?path.as_ref(),
            "wrote MIDI file"
        );
        Ok(())
    }

    /// Queue the recording for submission
    pub fn send(&mut self) {
        let transition = self.state.send();
        info!(events = self.state.events.len(), "send queued");
        self.apply(transition);
    }

    /// Payloads queued by Send since the last call
    pub fn take_outbox(&mut self) -> Vec<Payload> {
        mem::take(&mut self.outbox)
    }

    /// Piano key pressed
    ///
    /// The note always sounds. It is only captured while recording.
    pub fn note_on(&mut self, pitch: MidiNote) {
        if !self.state.is_playing() {
            let now = self.clock.now_secs();
            if !self.capture.note_on(pitch, now) {
                return;
            }
        }
        if let Err(e) = self.output.note_on(pitch, self.velocity) {
            warn!(pitch, "note on failed: {}", e);
        }
    }

    /// Piano key released
    ///
    /// Returns the event that was recorded, if any.
    pub fn note_off(&mut self, pitch: MidiNote) -> Option<NoteEvent> {
        let replaying = self.state.current_events.iter().any(|e| e.pitch == pitch);
        // Playback keeps sounding a pitch it owns
        if !(replaying && !self.capture.is_held(pitch)) {
            if let Err(e) = self.output.note_off(pitch) {
                warn!(pitch, "note off failed: {}", e);
            }
        }

        let event = self.capture.note_off(pitch, self.clock.now_secs())?;
        if self.state.is_playing() {
            debug!(pitch, "released during playback, not recorded");
            return None;
        }
        let transition = self.state.record(event);
        self.apply(transition);
        debug!(?event, "recorded");
        Some(event)
    }

    /// Fire every playback timer that is due
    pub fn tick(&mut self) {
        let now = self.clock.now();
        for timer in self.timers.poll(now) {
            // A timer from this batch may belong to a generation a previous
            // timer in the same batch just cancelled
            if !self.timers.is_current(&timer) {
                continue;
            }
            let transition = self.state.fire(timer.action);
            self.apply(transition);
        }
    }

    /// How long until the next timer is due
    pub fn time_to_next_timer(&self) -> Option<Duration> {
        self.timers.time_to_next(self.clock.now())
    }

    /// Record every key still held, as if released now
    fn commit_held(&mut self) {
        let now = self.clock.now_secs();
        for event in self.capture.release_all(now) {
            if let Err(e) = self.output.note_off(event.pitch) {
                warn!(pitch = event.pitch, "note off failed: {}", e);
            }
            let transition = self.state.record(event);
            self.apply(transition);
            debug!(?event, "recorded held key");
        }
    }

    /// Adopt the transition's state and carry out its effects
    fn apply(&mut self, transition: Transition) {
        let Transition { state, effects } = transition;
        let previous = mem::replace(&mut self.state, state);
        self.sync_playback_notes(&previous.current_events);

        for effect in effects {
            match effect {
                Effect::ShowPlaying(on) => self.indicator = on,
                Effect::Schedule { at, action } => {
                    let due = self.play_started + Duration::from_secs_f64(at.max(0.0));
                    self.timers.schedule(due, action);
                }
                Effect::CancelTimers => self.timers.cancel_all(),
                Effect::Submit(payload) => self.outbox.push(payload),
            }
        }
    }

    /// Sound the change between the old and new sounding sets
    fn sync_playback_notes(&mut self, previous: &[NoteEvent]) {
        let before: Vec<MidiNote> = previous.iter().map(|e| e.pitch).collect();
        let after: Vec<MidiNote> = self.state.current_events.iter().map(|e| e.pitch).collect();

        for pitch in before.iter().filter(|p| !after.contains(p)) {
            if let Err(e) = self.output.note_off(*pitch) {
                warn!(pitch, "note off failed: {}", e);
            }
        }
        for pitch in after.iter().filter(|p| !before.contains(p)) {
            if let Err(e) = self.output.note_on(*pitch, self.velocity) {
                warn!(pitch, "note on failed: {}", e);
            }
        }
    }
}
