// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Terminal UI for pianorec.
//!
//! Provides a ratatui-based terminal interface with the piano, transport,
//! export panel, recorded-notes dump and a status line. The [`App`] owns the
//! terminal and runs the main loop: every key, MIDI message, timer and
//! network result is handled on this one thread.

mod panels;
mod piano;
mod transport;

pub use panels::{events_json, DownloadWidget, EventsWidget};
pub use piano::PianoWidget;
pub use transport::{playing_color, TransportWidget};

use std::collections::HashMap;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{
        self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tracing::{debug, info, trace, warn};

use crate::control::{format_shortcut, ControlAction, Controls};
use crate::error::PianoError;
use crate::midi::{MidiInput, MidiMessage};
use crate::music::MidiNote;
use crate::net::Dispatcher;
use crate::recording::RecordingState;
use crate::session::Session;
use crate::timing::Clock;

/// How long a status message stays up
const STATUS_TIMEOUT: Duration = Duration::from_secs(4);

/// UI-only state
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Help text visible
    pub show_help: bool,
    /// Status message
    pub status_message: Option<String>,
    /// Whether the status message reports a failure
    pub status_is_error: bool,
    /// Status message timestamp
    pub status_time: Option<Instant>,
}

impl UiState {
    /// Set a status message that will be displayed temporarily
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_is_error = false;
        self.status_time = Some(Instant::now());
    }

    /// Report a failure on the status line
    pub fn set_error(&mut self, error: &PianoError) {
        let detail = match error {
            PianoError::Encoding(e) => e.to_string(),
            PianoError::Network(e) => e.to_string(),
            PianoError::Config(msg) => msg.clone(),
        };
        self.status_message = Some(format!("{}: {}", error.kind(), detail));
        self.status_is_error = true;
        self.status_time = Some(Instant::now());
    }

    /// Clear expired status message
    pub fn clear_expired_status(&mut self) {
        if let Some(time) = self.status_time {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_is_error = false;
                self.status_time = None;
            }
        }
    }
}

/// Everything one frame shows
pub struct Screen<'a> {
    pub state: &'a RecordingState,
    /// "Playing" indicator
    pub playing: bool,
    /// Seconds into playback
    pub position: Option<f64>,
    /// Keys held by the player
    pub held: &'a [MidiNote],
    pub controls: &'a Controls,
    pub ui: &'a UiState,
    /// Where notes are heard
    pub output: &'a str,
    /// Animation frame counter
    pub frame: u64,
}

/// Draw one frame
pub fn render(frame: &mut Frame, screen: &Screen) {
    let area = frame.area();
    let download_height = DownloadWidget::height_for(&screen.state.download, area.width)
        .min(area.height / 3);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),               // Transport
            Constraint::Length(6),               // Piano
            Constraint::Length(3),               // Controls
            Constraint::Length(download_height), // Download string
            Constraint::Min(3),                  // Recorded notes
            Constraint::Length(1),               // Status bar
        ])
        .split(area);

    let state = screen.state;
    frame.render_widget(
        TransportWidget::new(state.mode, screen.playing)
            .position(screen.position)
            .times(state.current_time, state.end_time())
            .events(state.events.len())
            .frame(screen.frame),
        chunks[0],
    );

    let sounding: Vec<MidiNote> = state.current_events.iter().map(|e| e.pitch).collect();
    frame.render_widget(
        PianoWidget::new(screen.controls.layout())
            .held(screen.held)
            .sounding(&sounding)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Piano ({}) ", screen.output)),
            ),
        chunks[1],
    );

    render_controls(frame, chunks[2]);

    if download_height > 0 {
        frame.render_widget(DownloadWidget::new(&state.download), chunks[3]);
    }

    frame.render_widget(EventsWidget::new(&state.events), chunks[4]);

    render_status_bar(frame, chunks[5], screen.ui);

    if screen.ui.show_help {
        render_help_overlay(frame, area, screen.controls);
    }
}

/// Render the control buttons
fn render_controls(frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Controls ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let buttons = [
        ("Play", "Space"),
        ("Stop", "Esc"),
        ("Clear", "Bksp"),
        ("Save", "^S"),
        ("Send", "^E"),
        ("Write", "^W"),
    ];
    let mut spans = Vec::new();
    for (label, key) in buttons {
        spans.push(Span::styled(
            format!("[ {} ]", label),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {}   ", key),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

/// Render status bar
fn render_status_bar(frame: &mut Frame, area: Rect, state: &UiState) {
    let text = match state.status_message {
        Some(ref msg) if state.status_is_error => {
            Span::styled(msg, Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        }
        Some(ref msg) => Span::styled(msg, Style::default().fg(Color::Yellow)),
        None => Span::styled(
            " Keys: play notes | Space: Play | Esc: Stop | Bksp: Clear | ^S: Save | ^E: Send | ^W: Write | F1: Help | ^Q: Quit",
            Style::default().fg(Color::DarkGray),
        ),
    };

    frame.render_widget(Paragraph::new(text), area);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, area: Rect, controls: &Controls) {
    let mut help_text = Vec::new();
    for (category, bindings) in controls.keyboard().bindings_by_category() {
        help_text.push(Line::from(Span::styled(
            category,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for binding in bindings {
            help_text.push(Line::from(format!(
                "  {:<12}{}",
                format_shortcut(&binding.shortcut),
                binding.description
            )));
        }
        help_text.push(Line::from(""));
    }
    help_text.push(Line::from(Span::styled(
        "Piano",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    help_text.push(Line::from(format!("  {}", controls.layout().describe())));

    // Calculate centered area
    let width = 60.min(area.width.saturating_sub(4));
    let height = (help_text.len() as u16 + 4).min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let help_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, help_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    frame.render_widget(
        Paragraph::new(help_text)
            .wrap(ratatui::widgets::Wrap { trim: false })
            .block(block),
        help_area,
    );
}

/// Terminal UI application
pub struct App {
    /// UI-only state
    state: UiState,
    /// Terminal handle
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Target frame rate
    frame_rate: u32,
    /// Frames drawn so far
    frame: u64,
    /// Whether to continue running
    running: bool,
    /// Whether the terminal reports key releases
    key_release_events: bool,
    /// Without release events, when each held key lets go
    auto_release: HashMap<MidiNote, Instant>,
    /// How long a key sounds without release events
    key_hold: Duration,
    /// Where WriteFile puts the .mid file
    export_path: PathBuf,
}

impl App {
    /// Take over the terminal
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;

        // Check terminal support BEFORE entering alternate screen
        let supports_enhancement = matches!(supports_keyboard_enhancement(), Ok(true));

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let key_release_events = supports_enhancement
            && execute!(
                stdout,
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                )
            )
            .is_ok();
        info!(key_release_events, "terminal ready");

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            state: UiState::default(),
            terminal,
            frame_rate: 30,
            frame: 0,
            running: true,
            key_release_events,
            auto_release: HashMap::new(),
            key_hold: Duration::from_millis(300),
            export_path: PathBuf::from("pianorec.mid"),
        })
    }

    /// Set frame rate
    pub fn set_frame_rate(&mut self, fps: u32) {
        self.frame_rate = fps.clamp(1, 120);
    }

    /// Set how long keys sound when the terminal cannot report releases
    pub fn set_key_hold(&mut self, hold: Duration) {
        self.key_hold = hold;
    }

    /// Set where WriteFile puts the .mid file
    pub fn set_export_path(&mut self, path: impl Into<PathBuf>) {
        self.export_path = path.into();
    }

    /// Shared UI state
    pub fn state_mut(&mut self) -> &mut UiState {
        &mut self.state
    }

    /// Stop the app
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Run until the user quits
    pub fn run<C: Clock>(
        &mut self,
        session: &mut Session<C>,
        controls: &Controls,
        dispatcher: &mut Dispatcher,
        midi_input: Option<&MidiInput>,
    ) -> Result<()> {
        let frame_interval = Duration::from_millis(1000 / self.frame_rate as u64);

        while self.running {
            for result in dispatcher.poll_results() {
                match result {
                    Ok(report) => self.state.set_status(format!(
                        "Sent {} notes to {} (HTTP {})",
                        report.events, report.endpoint, report.status
                    )),
                    Err(e) => self.state.set_error(&PianoError::from(e)),
                }
            }

            if let Some(input) = midi_input {
                for message in input.recv_all() {
                    match message {
                        MidiMessage::NoteOn { note, .. } => session.note_on(note),
                        MidiMessage::NoteOff { note, .. } => {
                            session.note_off(note);
                        }
                        _ => {}
                    }
                }
            }

            self.release_expired(session);
            session.tick();
            self.state.clear_expired_status();
            self.draw(session, controls)?;

            let timeout = session
                .time_to_next_timer()
                .map_or(frame_interval, |t| t.min(frame_interval));
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if let Some(action) = controls.handle_key(key) {
                        self.perform(action, session, dispatcher);
                    }
                }
            }
            self.frame = self.frame.wrapping_add(1);
        }

        Ok(())
    }

    /// Carry out one control action
    pub fn perform<C: Clock>(
        &mut self,
        action: ControlAction,
        session: &mut Session<C>,
        dispatcher: &mut Dispatcher,
    ) {
        if action.is_note() {
            trace!(?action, "key");
        } else {
            debug!(?action, "control");
        }
        match action {
            ControlAction::Play => {
                session.play();
                if session.state().events.is_empty() {
                    self.state.set_status("Nothing recorded yet");
                }
            }
            ControlAction::Stop => session.stop(),
            ControlAction::Clear => {
                self.auto_release.clear();
                session.clear();
                self.state.set_status("Cleared");
            }
            ControlAction::Save => match session.save() {
                Ok(uri) => {
                    let bytes = uri.len();
                    self.state.set_status(format!("Saved MIDI ({} chars)", bytes));
                }
                Err(e) => self.state.set_error(&PianoError::from(e)),
            },
            ControlAction::WriteFile => match session.write_file(&self.export_path) {
                Ok(()) => self
                    .state
                    .set_status(format!("Wrote {}", self.export_path.display())),
                Err(e) => self.state.set_error(&PianoError::from(e)),
            },
            ControlAction::Send => {
                session.send();
                for payload in session.take_outbox() {
                    let count = payload.midi_events.len();
                    dispatcher.dispatch(payload);
                    self.state.set_status(format!("Sending {} notes...", count));
                }
            }
            ControlAction::NoteOn(note) => {
                if !self.key_release_events {
                    let deadline = Instant::now() + self.key_hold;
                    // Auto-repeat extends the note instead of restarting it
                    if self.auto_release.insert(note, deadline).is_some() {
                        return;
                    }
                }
                session.note_on(note);
            }
            ControlAction::NoteOff(note) => {
                self.auto_release.remove(&note);
                session.note_off(note);
            }
            ControlAction::ToggleHelp => self.state.show_help = !self.state.show_help,
            ControlAction::Quit => self.quit(),
        }
    }

    /// Release keys whose hold time ran out
    fn release_expired<C: Clock>(&mut self, session: &mut Session<C>) {
        let now = Instant::now();
        let expired: Vec<MidiNote> = self
            .auto_release
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(note, _)| *note)
            .collect();
        for note in expired {
            self.auto_release.remove(&note);
            session.note_off(note);
        }
    }

    /// Draw the UI
    pub fn draw<C: Clock>(&mut self, session: &Session<C>, controls: &Controls) -> io::Result<()> {
        let held = session.held_notes();
        let screen = Screen {
            state: session.state(),
            playing: session.is_playing(),
            position: session.playback_position(),
            held: &held,
            controls,
            ui: &self.state,
            output: session.output_name(),
            frame: self.frame,
        };

        self.terminal.draw(|frame| render(frame, &screen))?;
        Ok(())
    }

    /// Restore the terminal
    fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release_events {
            if let Err(e) = execute!(io::stdout(), PopKeyboardEnhancementFlags) {
                warn!("failed to pop keyboard flags: {}", e);
            }
        }
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
