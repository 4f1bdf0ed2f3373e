// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Control system for computer keyboard input.
//!
//! This module provides:
//! - Shortcut bindings for the recorder controls
//! - Piano key layouts mapping letter keys to notes

pub mod keyboard;

pub use keyboard::{format_shortcut, KeyBinding, KeyboardController, KeyboardLayout, Shortcut};

use crossterm::event::{KeyEvent, KeyEventKind};

use crate::music::MidiNote;

/// Action that can be triggered by controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    // Transport
    /// Replay the recording
    Play,
    /// Stop playback
    Stop,
    /// Stop and discard the recording
    Clear,

    // Export
    /// Encode the recording as a MIDI data URI
    Save,
    /// Post the recording to the remote endpoint
    Send,
    /// Write the recording to a .mid file
    WriteFile,

    // Piano
    /// Piano key pressed
    NoteOn(MidiNote),
    /// Piano key released
    NoteOff(MidiNote),

    // UI
    /// Toggle help display
    ToggleHelp,
    /// Quit application
    Quit,
}

impl ControlAction {
    /// Check if this is a piano key action
    pub fn is_note(&self) -> bool {
        matches!(self, ControlAction::NoteOn(_) | ControlAction::NoteOff(_))
    }
}

/// Shortcut bindings plus the piano layout
pub struct Controls {
    keyboard: KeyboardController,
    layout: KeyboardLayout,
}

impl Controls {
    pub fn new(keyboard: KeyboardController, layout: KeyboardLayout) -> Self {
        Self { keyboard, layout }
    }

    /// Piano key layout
    pub fn layout(&self) -> &KeyboardLayout {
        &self.layout
    }

    /// Shortcut bindings
    pub fn keyboard(&self) -> &KeyboardController {
        &self.keyboard
    }

    /// Translate a terminal key event
    ///
    /// Control shortcuts fire on press only. Piano keys produce `NoteOn` on
    /// press and `NoteOff` on release; auto-repeat is ignored.
    pub fn handle_key(&self, key: KeyEvent) -> Option<ControlAction> {
        if key.kind == KeyEventKind::Press {
            if let Some(action) = self.keyboard.get_action(key.code, key.modifiers) {
                return Some(*action);
            }
        }

        let note = self.layout.note_for_key(key.code, key.modifiers)?;
        match key.kind {
            KeyEventKind::Press => Some(ControlAction::NoteOn(note)),
            KeyEventKind::Release => Some(ControlAction::NoteOff(note)),
            KeyEventKind::Repeat => None,
        }
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::new(KeyboardController::with_defaults(), KeyboardLayout::default())
    }
}
