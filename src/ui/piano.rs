// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! On-screen piano.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Widget},
};

use crate::control::KeyboardLayout;
use crate::music::{is_accidental, note_name, MidiNote};

/// Widest a single key is drawn
const MAX_KEY_WIDTH: u16 = 5;

/// Piano keys across the playable range, with their shortcut letters
pub struct PianoWidget<'a> {
    layout: &'a KeyboardLayout,
    /// Keys held by the player
    held: &'a [MidiNote],
    /// Keys sounding from playback
    sounding: &'a [MidiNote],
    block: Option<Block<'a>>,
}

impl<'a> PianoWidget<'a> {
    pub fn new(layout: &'a KeyboardLayout) -> Self {
        Self {
            layout,
            held: &[],
            sounding: &[],
            block: None,
        }
    }

    pub fn held(mut self, held: &'a [MidiNote]) -> Self {
        self.held = held;
        self
    }

    pub fn sounding(mut self, sounding: &'a [MidiNote]) -> Self {
        self.sounding = sounding;
        self
    }

    /// Set the block wrapper
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn key_style(&self, note: MidiNote) -> Style {
        if self.held.contains(&note) {
            Style::default()
                .bg(Color::Yellow)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        } else if self.sounding.contains(&note) {
            Style::default()
                .bg(Color::Green)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        } else if is_accidental(note) {
            Style::default().bg(Color::DarkGray).fg(Color::White)
        } else {
            Style::default().bg(Color::White).fg(Color::Black)
        }
    }
}

impl Widget for PianoWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = if let Some(block) = self.block.clone() {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        let range = self.layout.range();
        let count = range.len() as u16;
        if area.width < count || area.height == 0 {
            return;
        }
        let key_width = (area.width / count).min(MAX_KEY_WIDTH);
        // Leave a gap between keys when there is room for one
        let face = if key_width >= 3 { key_width - 1 } else { key_width };

        for (i, note) in range.notes().enumerate() {
            let x = area.x + i as u16 * key_width;
            let style = self.key_style(note);
            buf.set_style(Rect::new(x, area.y, face, area.height), style);

            if area.height >= 2 {
                buf.set_stringn(x, area.y, note_name(note), face as usize, style);
            }
            if let Some(key) = self.layout.key_for(note) {
                let label = key.to_ascii_uppercase().to_string();
                let y = area.y + area.height - 1;
                buf.set_stringn(x, y, label, face as usize, style);
            }
        }
    }
}
