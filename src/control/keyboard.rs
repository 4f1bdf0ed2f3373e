// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Keyboard shortcut handling.
//!
//! Two kinds of bindings live here: control shortcuts (Space plays, Esc
//! stops, ...) and the piano layout, which turns a row of letter keys into a
//! run of notes starting at the first note of the playable range.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyModifiers};

use super::ControlAction;
use crate::music::{is_accidental, note_name, MidiNote, NoteRange};

/// A keyboard shortcut definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    /// Key code
    pub code: KeyCode,
    /// Required modifiers
    pub modifiers: KeyModifiers,
}

impl Shortcut {
    /// Create a new shortcut
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Create a shortcut with no modifiers
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// Create a shortcut with Ctrl modifier
    pub fn ctrl(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::CONTROL)
    }

    /// Check if this shortcut matches a key event
    pub fn matches(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        self.code == code && self.modifiers == modifiers
    }
}

/// A keyboard binding (shortcut to action)
#[derive(Debug, Clone)]
pub struct KeyBinding {
    /// The shortcut
    pub shortcut: Shortcut,
    /// The action to perform
    pub action: ControlAction,
    /// Description for help display
    pub description: String,
    /// Category for grouping in help
    pub category: String,
}

impl KeyBinding {
    /// Create a new key binding
    pub fn new(
        shortcut: Shortcut,
        action: ControlAction,
        description: impl Into<String>,
    ) -> Self {
        Self {
            shortcut,
            action,
            description: description.into(),
            category: "General".to_string(),
        }
    }

    /// Set the category
    pub fn category(mut self, cat: impl Into<String>) -> Self {
        self.category = cat.into();
        self
    }
}

/// Control shortcuts
pub struct KeyboardController {
    bindings: HashMap<Shortcut, KeyBinding>,
}

impl KeyboardController {
    /// Create an empty keyboard controller
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Create a keyboard controller with default bindings
    pub fn with_defaults() -> Self {
        let mut controller = Self::new();
        controller.add_default_bindings();
        controller
    }

    /// Add default keyboard bindings
    fn add_default_bindings(&mut self) {
        // Transport
        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Char(' ')),
            ControlAction::Play,
            "Play",
        ).category("Transport"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Esc),
            ControlAction::Stop,
            "Stop",
        ).category("Transport"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Backspace),
            ControlAction::Clear,
            "Clear",
        ).category("Transport"));

        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::Delete),
            ControlAction::Clear,
            "Clear",
        ).category("Transport"));

        // Export
        self.add(KeyBinding::new(
            Shortcut::ctrl(KeyCode::Char('s')),
            ControlAction::Save,
            "Save as MIDI",
        ).category("Export"));

        self.add(KeyBinding::new(
            Shortcut::ctrl(KeyCode::Char('e')),
            ControlAction::Send,
            "Send to server",
        ).category("Export"));

        self.add(KeyBinding::new(
            Shortcut::ctrl(KeyCode::Char('w')),
            ControlAction::WriteFile,
            "Write .mid file",
        ).category("Export"));

        // UI
        self.add(KeyBinding::new(
            Shortcut::key(KeyCode::F(1)),
            ControlAction::ToggleHelp,
            "Toggle Help",
        ).category("UI"));

        self.add(KeyBinding::new(
            Shortcut::ctrl(KeyCode::Char('q')),
            ControlAction::Quit,
            "Quit",
        ).category("UI"));

        self.add(KeyBinding::new(
            Shortcut::ctrl(KeyCode::Char('c')),
            ControlAction::Quit,
            "Quit",
        ).category("UI"));
    }

    /// Add a key binding
    pub fn add(&mut self, binding: KeyBinding) {
        self.bindings.insert(binding.shortcut.clone(), binding);
    }

    /// Remove a key binding
    pub fn remove(&mut self, shortcut: &Shortcut) -> Option<KeyBinding> {
        self.bindings.remove(shortcut)
    }

    /// Get action for a key event
    pub fn get_action(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<&ControlAction> {
        let shortcut = Shortcut::new(code, modifiers);
        self.bindings.get(&shortcut).map(|b| &b.action)
    }

    /// Get all bindings for help display
    pub fn bindings(&self) -> impl Iterator<Item = &KeyBinding> {
        self.bindings.values()
    }

    /// Get bindings grouped by category, each group sorted by description
    pub fn bindings_by_category(&self) -> Vec<(String, Vec<&KeyBinding>)> {
        let mut grouped: HashMap<String, Vec<&KeyBinding>> = HashMap::new();

        for binding in self.bindings.values() {
            grouped
                .entry(binding.category.clone())
                .or_default()
                .push(binding);
        }

        let mut grouped: Vec<_> = grouped.into_iter().collect();
        for (_, bindings) in grouped.iter_mut() {
            bindings.sort_by(|a, b| {
                a.description
                    .cmp(&b.description)
                    .then_with(|| format_shortcut(&a.shortcut).cmp(&format_shortcut(&b.shortcut)))
            });
        }
        grouped.sort_by(|a, b| a.0.cmp(&b.0));
        grouped
    }
}

impl Default for KeyboardController {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Format a shortcut for display
pub fn format_shortcut(shortcut: &Shortcut) -> String {
    let mut parts = Vec::new();

    if shortcut.modifiers.contains(KeyModifiers::CONTROL) {
        parts.push("Ctrl");
    }
    if shortcut.modifiers.contains(KeyModifiers::ALT) {
        parts.push("Alt");
    }
    if shortcut.modifiers.contains(KeyModifiers::SHIFT) {
        parts.push("Shift");
    }

    let key = match shortcut.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_uppercase().to_string(),
        KeyCode::F(n) => format!("F{}", n),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        _ => "?".to_string(),
    };

    parts.push(&key);
    parts.join("+")
}

/// One column of a keyboard row: the natural key and the keys either side
/// of it used for the black notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyColumn {
    pub natural: char,
    pub flat: char,
    pub sharp: char,
}

const fn col(natural: char, flat: char, sharp: char) -> KeyColumn {
    KeyColumn {
        natural,
        flat,
        sharp,
    }
}

/// White notes on the home row, black notes on the row above
pub const HOME_ROW: [KeyColumn; 11] = [
    col('a', 'q', 'w'),
    col('s', 'w', 'e'),
    col('d', 'e', 'r'),
    col('f', 'r', 't'),
    col('g', 't', 'y'),
    col('h', 'y', 'u'),
    col('j', 'u', 'i'),
    col('k', 'i', 'o'),
    col('l', 'o', 'p'),
    col(';', 'p', '['),
    col('\'', '[', ']'),
];

/// White notes on the bottom row, black notes on the home row
pub const BOTTOM_ROW: [KeyColumn; 10] = [
    col('z', 'a', 's'),
    col('x', 's', 'd'),
    col('c', 'd', 'f'),
    col('v', 'f', 'g'),
    col('b', 'g', 'h'),
    col('n', 'h', 'j'),
    col('m', 'j', 'k'),
    col(',', 'k', 'l'),
    col('.', 'l', ';'),
    col('/', ';', '\''),
];

/// Letter keys mapped to piano notes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardLayout {
    name: String,
    range: NoteRange,
    /// (key, note) in ascending note order
    shortcuts: Vec<(char, MidiNote)>,
}

impl KeyboardLayout {
    /// Walk `columns` upward from the first note of `range`.
    ///
    /// Each white note takes the next column's natural key; a black note
    /// takes the flat key of the column about to be used. Stops at the end
    /// of the range or when the columns run out.
    pub fn from_columns(name: impl Into<String>, columns: &[KeyColumn], range: NoteRange) -> Self {
        let mut shortcuts = Vec::new();
        let mut column = 0;
        let mut note = range.first;

        while column < columns.len() && note <= range.last {
            if is_accidental(note) {
                shortcuts.push((columns[column].flat, note));
            } else {
                shortcuts.push((columns[column].natural, note));
                column += 1;
            }
            if note == 127 {
                break;
            }
            note += 1;
        }

        Self {
            name: name.into(),
            range,
            shortcuts,
        }
    }

    /// Home row layout
    pub fn home_row(range: NoteRange) -> Self {
        Self::from_columns("home_row", &HOME_ROW, range)
    }

    /// Bottom row layout
    pub fn bottom_row(range: NoteRange) -> Self {
        Self::from_columns("bottom_row", &BOTTOM_ROW, range)
    }

    /// Layout by config name
    pub fn named(name: &str, range: NoteRange) -> Option<Self> {
        match name {
            "home_row" => Some(Self::home_row(range)),
            "bottom_row" => Some(Self::bottom_row(range)),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Playable range shown on screen
    pub fn range(&self) -> NoteRange {
        self.range
    }

    /// Note played by a character key
    pub fn note_for(&self, key: char) -> Option<MidiNote> {
        let key = key.to_ascii_lowercase();
        self.shortcuts
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, note)| *note)
    }

    /// Note played by a key event; Ctrl and Alt chords never play notes
    pub fn note_for_key(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<MidiNote> {
        if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return None;
        }
        match code {
            KeyCode::Char(c) => self.note_for(c),
            _ => None,
        }
    }

    /// Key that plays a note
    pub fn key_for(&self, note: MidiNote) -> Option<char> {
        self.shortcuts
            .iter()
            .find(|(_, n)| *n == note)
            .map(|(k, _)| *k)
    }

    /// All (key, note) pairs in note order
    pub fn shortcuts(&self) -> &[(char, MidiNote)] {
        &self.shortcuts
    }

    /// One-line summary for the help screen
    pub fn describe(&self) -> String {
        self.shortcuts
            .iter()
            .map(|(k, n)| format!("{}={}", k, note_name(*n)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for KeyboardLayout {
    fn default() -> Self {
        Self::home_row(NoteRange::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_shortcut_needs_ctrl() {
        let send = Shortcut::ctrl(KeyCode::Char('e'));
        assert_eq!(send.modifiers, KeyModifiers::CONTROL);
        assert!(send.matches(KeyCode::Char('e'), KeyModifiers::CONTROL));
        // Plain 'e' is a piano key
        assert!(!send.matches(KeyCode::Char('e'), KeyModifiers::NONE));
        assert!(!send.matches(KeyCode::Char('s'), KeyModifiers::CONTROL));
    }

    #[test]
    fn test_keyboard_controller_defaults() {
        let controller = KeyboardController::with_defaults();

        let action = controller.get_action(KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(action, Some(&ControlAction::Play));

        let action = controller.get_action(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(action, Some(&ControlAction::Stop));

        let action = controller.get_action(KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(action, Some(&ControlAction::Clear));

        let action = controller.get_action(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(action, Some(&ControlAction::Save));

        let action = controller.get_action(KeyCode::Char('e'), KeyModifiers::CONTROL);
        assert_eq!(action, Some(&ControlAction::Send));

        let action = controller.get_action(KeyCode::Char('w'), KeyModifiers::CONTROL);
        assert_eq!(action, Some(&ControlAction::WriteFile));

        let action = controller.get_action(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert_eq!(action, Some(&ControlAction::Quit));
    }

    #[test]
    fn test_rebind_play() {
        let mut controller = KeyboardController::with_defaults();
        controller.remove(&Shortcut::key(KeyCode::Char(' ')));
        assert_eq!(controller.get_action(KeyCode::Char(' '), KeyModifiers::NONE), None);

        controller.add(
            KeyBinding::new(Shortcut::key(KeyCode::Enter), ControlAction::Play, "Play")
                .category("Transport"),
        );
        assert_eq!(
            controller.get_action(KeyCode::Enter, KeyModifiers::NONE),
            Some(&ControlAction::Play)
        );
    }

    #[test]
    fn test_bindings_by_category_sorted() {
        let controller = KeyboardController::with_defaults();
        let grouped = controller.bindings_by_category();
        let names: Vec<&str> = grouped.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, vec!["Export", "Transport", "UI"]);
    }

    #[test]
    fn test_format_shortcut() {
        assert_eq!(format_shortcut(&Shortcut::key(KeyCode::Char(' '))), "Space");
        assert_eq!(format_shortcut(&Shortcut::ctrl(KeyCode::Char('s'))), "Ctrl+S");
        assert_eq!(format_shortcut(&Shortcut::key(KeyCode::F(1))), "F1");
    }

    #[test]
    fn test_home_row_from_c3() {
        let layout = KeyboardLayout::home_row(NoteRange::new(48, 65));

        let expected = [
            ('a', 48), ('w', 49), ('s', 50), ('e', 51), ('d', 52), ('f', 53),
            ('t', 54), ('g', 55), ('y', 56), ('h', 57), ('u', 58), ('j', 59),
            ('k', 60), ('o', 61), ('l', 62), ('p', 63), (';', 64), ('\'', 65),
        ];
        assert_eq!(layout.shortcuts(), &expected[..]);
        assert_eq!(layout.note_for('a'), Some(48));
        assert_eq!(layout.note_for('\''), Some(65));
        assert_eq!(layout.key_for(60), Some('k'));
    }

    #[test]
    fn test_bottom_row_from_c3() {
        let layout = KeyboardLayout::bottom_row(NoteRange::new(48, 65));
        assert_eq!(layout.note_for('z'), Some(48));
        assert_eq!(layout.note_for('s'), Some(49));
        assert_eq!(layout.note_for('x'), Some(50));
        assert_eq!(layout.note_for('/'), Some(64));
        // Columns run out before F4
        assert_eq!(layout.key_for(65), None);
    }

    #[test]
    fn test_layout_starting_on_black_key() {
        let layout = KeyboardLayout::home_row(NoteRange::new(49, 52));
        assert_eq!(layout.shortcuts(), &[('q', 49), ('a', 50), ('w', 51), ('s', 52)][..]);
    }

    #[test]
    fn test_layout_stops_at_range_end() {
        let layout = KeyboardLayout::home_row(NoteRange::new(60, 62));
        assert_eq!(layout.shortcuts().len(), 3);
        assert_eq!(layout.note_for('d'), None);
    }

    #[test]
    fn test_note_for_key_modifiers() {
        let layout = KeyboardLayout::default();
        assert_eq!(layout.note_for_key(KeyCode::Char('A'), KeyModifiers::SHIFT), Some(48));
        assert_eq!(layout.note_for_key(KeyCode::Char('a'), KeyModifiers::CONTROL), None);
        assert_eq!(layout.note_for_key(KeyCode::Enter, KeyModifiers::NONE), None);
    }

    #[test]
    fn test_named_layouts() {
        let range = NoteRange::default();
        assert_eq!(KeyboardLayout::named("home_row", range).unwrap().name(), "home_row");
        assert_eq!(KeyboardLayout::named("bottom_row", range).unwrap().name(), "bottom_row");
        assert!(KeyboardLayout::named("dvorak", range).is_none());
    }

    #[test]
    fn test_describe() {
        let layout = KeyboardLayout::home_row(NoteRange::new(60, 61));
        assert_eq!(layout.describe(), "a=C4 q=C#4");
    }
}
