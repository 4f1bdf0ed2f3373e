// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Transport display widget.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::recording::Mode;

/// Border colors cycled while playing
const PLAYING_PALETTE: [Color; 6] = [
    Color::Magenta,
    Color::LightMagenta,
    Color::LightBlue,
    Color::Cyan,
    Color::LightCyan,
    Color::Blue,
];

/// Frames each palette color is held for
const FRAMES_PER_COLOR: u64 = 4;

/// Border color for a frame while playing
pub fn playing_color(frame: u64) -> Color {
    let index = (frame / FRAMES_PER_COLOR) as usize % PLAYING_PALETTE.len();
    PLAYING_PALETTE[index]
}

/// Transport widget for displaying recorder state
pub struct TransportWidget {
    mode: Mode,
    /// "Playing" indicator; animates the border
    playing: bool,
    /// Seconds into playback
    position: Option<f64>,
    /// Recording cursor
    current_time: f64,
    /// Recording length
    end_time: f64,
    events: usize,
    frame: u64,
}

impl TransportWidget {
    /// Create a new transport widget
    pub fn new(mode: Mode, playing: bool) -> Self {
        Self {
            mode,
            playing,
            position: None,
            current_time: 0.0,
            end_time: 0.0,
            events: 0,
            frame: 0,
        }
    }

    /// Playback position in seconds
    pub fn position(mut self, position: Option<f64>) -> Self {
        self.position = position;
        self
    }

    /// Recording cursor and length in seconds
    pub fn times(mut self, current_time: f64, end_time: f64) -> Self {
        self.current_time = current_time;
        self.end_time = end_time;
        self
    }

    /// Number of recorded events
    pub fn events(mut self, events: usize) -> Self {
        self.events = events;
        self
    }

    /// Animation frame
    pub fn frame(mut self, frame: u64) -> Self {
        self.frame = frame;
        self
    }

    fn border_style(&self) -> Style {
        if self.playing {
            Style::default()
                .fg(playing_color(self.frame))
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    }
}

impl Widget for TransportWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.border_style())
            .title(" Transport ");
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(12), // Mode indicator
                Constraint::Length(2),  // Spacer
                Constraint::Length(18), // Position
                Constraint::Length(2),  // Spacer
                Constraint::Length(12), // Event count
                Constraint::Min(0),     // Remaining
            ])
            .split(inner);

        let (indicator, style) = match self.mode {
            Mode::Playing => (
                "▶ PLAYING",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Mode::Recording => (
                "● RECORDING",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
        };
        Paragraph::new(indicator).style(style).render(chunks[0], buf);

        let position = match self.position {
            Some(t) => format!("{:6.2}s / {:.2}s", t.min(self.end_time), self.end_time),
            None => format!("{:6.2}s", self.current_time),
        };
        Paragraph::new(position)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .render(chunks[2], buf);

        let noun = if self.events == 1 { "note" } else { "notes" };
        Paragraph::new(format!("{} {}", self.events, noun))
            .style(Style::default().fg(Color::Magenta))
            .render(chunks[4], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &Buffer, y: u16) -> String {
        let width = buf.area.width as usize;
        let start = y as usize * width;
        buf.content[start..start + width]
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_playing_palette_cycles() {
        assert_eq!(playing_color(0), Color::Magenta);
        assert_eq!(playing_color(FRAMES_PER_COLOR - 1), Color::Magenta);
        assert_eq!(playing_color(FRAMES_PER_COLOR), Color::LightMagenta);
        assert_eq!(
            playing_color(FRAMES_PER_COLOR * PLAYING_PALETTE.len() as u64),
            Color::Magenta
        );
    }

    #[test]
    fn test_render_recording() {
        let area = Rect::new(0, 0, 60, 3);
        let mut buf = Buffer::empty(area);
        TransportWidget::new(Mode::Recording, false)
            .times(1.5, 1.5)
            .events(2)
            .render(area, &mut buf);

        let line = row(&buf, 1);
        assert!(line.contains("RECORDING"));
        assert!(line.contains("1.50s"));
        assert!(line.contains("2 notes"));
        assert_eq!(buf.content[0].fg, Color::Reset);
    }

    #[test]
    fn test_render_playing_border() {
        let area = Rect::new(0, 0, 60, 3);
        let mut buf = Buffer::empty(area);
        TransportWidget::new(Mode::Playing, true)
            .position(Some(0.5))
            .times(1.5, 1.5)
            .events(1)
            .frame(FRAMES_PER_COLOR)
            .render(area, &mut buf);

        let line = row(&buf, 1);
        assert!(line.contains("PLAYING"));
        assert!(line.contains("0.50s / 1.50s"));
        assert!(line.contains("1 note"));
        assert_eq!(buf.content[0].fg, Color::LightMagenta);
    }
}
