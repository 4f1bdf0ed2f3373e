// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Export and recorded-notes panels.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::recording::NoteEvent;

/// Recorded events as the JSON array Send would post
pub fn events_json(events: &[NoteEvent]) -> String {
    serde_json::to_string(events).unwrap_or_else(|_| "[]".to_string())
}

/// The saved MIDI data URI
pub struct DownloadWidget<'a> {
    download: &'a str,
}

impl<'a> DownloadWidget<'a> {
    pub fn new(download: &'a str) -> Self {
        Self { download }
    }

    /// Rows needed to show the whole string at `width` columns
    pub fn height_for(download: &str, width: u16) -> u16 {
        if download.is_empty() {
            return 0;
        }
        let inner = width.saturating_sub(2).max(1) as usize;
        let rows = download.chars().count().div_ceil(inner);
        rows as u16 + 2
    }
}

impl Widget for DownloadWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.download.is_empty() {
            return;
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                " Download String ",
                Style::default().add_modifier(Modifier::BOLD),
            ));
        Paragraph::new(self.download)
            .style(Style::default().fg(Color::Cyan))
            .wrap(Wrap { trim: false })
            .block(block)
            .render(area, buf);
    }
}

/// The recorded notes, dumped as JSON
pub struct EventsWidget<'a> {
    events: &'a [NoteEvent],
}

impl<'a> EventsWidget<'a> {
    pub fn new(events: &'a [NoteEvent]) -> Self {
        Self { events }
    }
}

impl Widget for EventsWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Recorded notes ");

        let text = if self.events.is_empty() {
            Line::from(Span::styled(
                "Play some keys to record",
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::from(events_json(self.events))
        };

        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(block)
            .render(area, buf);
    }
}
