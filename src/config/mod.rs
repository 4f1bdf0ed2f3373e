// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for pianorec.
//!
//! Everything is read from a single YAML file. Every field has a default, so
//! an empty file (or no file at all) gives a working setup.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::control::KeyboardLayout;
use crate::error::PianoError;
use crate::music::{parse_note_name, NoteRange};
use crate::net::DEFAULT_ENDPOINT;
use crate::recording::{Exporter, SmfEncoder};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "pianorec.yaml";

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// URL that Send posts to
    pub endpoint: String,
    /// On-screen piano and computer keyboard mapping
    pub keyboard: KeyboardConfig,
    /// MIDI file export
    pub export: ExportConfig,
    /// MIDI devices
    pub midi: MidiConfig,
    /// Terminal UI
    pub ui: UiConfig,
    /// Log output
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            keyboard: KeyboardConfig::default(),
            export: ExportConfig::default(),
            midi: MidiConfig::default(),
            ui: UiConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load a configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Load a file if it exists, otherwise use defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            info!(path = ?path.as_ref(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse and validate a configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml rejects an empty document for a struct
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")?
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Check values serde cannot
    pub fn validate(&self) -> Result<(), PianoError> {
        if self.endpoint.trim().is_empty() {
            return Err(PianoError::Config("endpoint must not be empty".to_string()));
        }
        self.keyboard.range()?;
        self.keyboard.layout()?;
        if !(20.0..=300.0).contains(&self.export.tempo) {
            return Err(PianoError::Config(format!(
                "export.tempo {} outside 20-300 BPM",
                self.export.tempo
            )));
        }
        if self.export.ppqn == 0 {
            return Err(PianoError::Config("export.ppqn must be positive".to_string()));
        }
        if self.export.program > 127 {
            return Err(PianoError::Config(format!(
                "export.program {} outside 0-127",
                self.export.program
            )));
        }
        if !(1..=127).contains(&self.export.velocity) || !(1..=127).contains(&self.midi.velocity) {
            return Err(PianoError::Config("velocity must be 1-127".to_string()));
        }
        if self.export.channel > 15 || self.midi.channel > 15 {
            return Err(PianoError::Config("channel must be 0-15".to_string()));
        }
        if self.export.file.trim().is_empty() {
            return Err(PianoError::Config("export.file must not be empty".to_string()));
        }
        if self.ui.frame_rate == 0 {
            return Err(PianoError::Config("ui.frame_rate must be positive".to_string()));
        }
        Ok(())
    }
}

/// Keyboard configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeyboardConfig {
    /// `home_row` or `bottom_row`
    pub layout: String,
    /// Lowest key, as a note name
    pub first_note: String,
    /// Highest key, as a note name
    pub last_note: String,
    /// How long a key sounds when the terminal cannot report releases
    pub key_hold_ms: u64,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            layout: "home_row".to_string(),
            first_note: "c3".to_string(),
            last_note: "f4".to_string(),
            key_hold_ms: 300,
        }
    }
}

impl KeyboardConfig {
    /// Playable range
    pub fn range(&self) -> Result<NoteRange, PianoError> {
        let first = parse_note_name(&self.first_note).ok_or_else(|| {
            PianoError::Config(format!("invalid keyboard.first_note '{}'", self.first_note))
        })?;
        let last = parse_note_name(&self.last_note).ok_or_else(|| {
            PianoError::Config(format!("invalid keyboard.last_note '{}'", self.last_note))
        })?;
        if first > last {
            return Err(PianoError::Config(format!(
                "keyboard.first_note {} is above last_note {}",
                self.first_note, self.last_note
            )));
        }
        Ok(NoteRange::new(first, last))
    }

    /// Key layout over the range
    pub fn layout(&self) -> Result<KeyboardLayout, PianoError> {
        let range = self.range()?;
        KeyboardLayout::named(&self.layout, range).ok_or_else(|| {
            PianoError::Config(format!(
                "unknown keyboard.layout '{}' (expected home_row or bottom_row)",
                self.layout
            ))
        })
    }
}

/// MIDI file export settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Tempo written to the file, in BPM
    pub tempo: f64,
    /// Ticks per quarter note
    pub ppqn: u16,
    /// General MIDI program (instrument)
    pub program: u8,
    /// Note-on velocity
    pub velocity: u8,
    /// MIDI channel (0-15)
    pub channel: u8,
    /// Where Ctrl+W writes the .mid file
    pub file: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            tempo: 120.0,
            ppqn: 128,
            program: 1,
            velocity: 50,
            channel: 0,
            file: "pianorec.mid".to_string(),
        }
    }
}

impl ExportConfig {
    /// Build the exporter these settings describe
    pub fn exporter(&self) -> Exporter {
        let encoder = SmfEncoder::new()
            .with_tempo(self.tempo)
            .with_ppqn(self.ppqn)
            .with_velocity(self.velocity)
            .with_channel(self.channel);
        Exporter::new(Box::new(encoder), self.program)
    }
}

/// MIDI device configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MidiConfig {
    /// Input port name (substring match); none means computer keyboard only
    pub input: Option<String>,
    /// Output port name (substring match); none means silent
    pub output: Option<String>,
    /// Output channel (0-15)
    pub channel: u8,
    /// Velocity for notes played from the computer keyboard and on playback
    pub velocity: u8,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            channel: 0,
            velocity: 100,
        }
    }
}

/// Terminal UI settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Redraws per second
    pub frame_rate: u32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { frame_rate: 30 }
    }
}

/// Log output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// File the log is appended to
    pub file: String,
    /// tracing filter level (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: "pianorec.log".to_string(),
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
endpoint: "http://localhost:8080/addTrack"

keyboard:
  layout: bottom_row
  first_note: c4
  last_note: e5
  key_hold_ms: 250

export:
  tempo: 90
  ppqn: 480
  program: 0
  velocity: 80
  channel: 2

midi:
  input: "Keystation"
  output: "FluidSynth"
  velocity: 90

ui:
  frame_rate: 60

log:
  file: "/tmp/pianorec.log"
  level: debug
"#;

        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.endpoint, "http://localhost:8080/addTrack");
        assert_eq!(config.keyboard.layout, "bottom_row");
        assert_eq!(config.keyboard.range().unwrap(), NoteRange::new(60, 76));
        assert_eq!(config.keyboard.key_hold_ms, 250);
        assert_eq!(config.export.tempo, 90.0);
        assert_eq!(config.export.ppqn, 480);
        assert_eq!(config.export.program, 0);
        assert_eq!(config.midi.input, Some("Keystation".to_string()));
        assert_eq!(config.midi.output, Some("FluidSynth".to_string()));
        assert_eq!(config.midi.velocity, 90);
        assert_eq!(config.ui.frame_rate, 60);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_default_values() {
        let yaml = r#"
keyboard:
  layout: home_row
"#;

        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.keyboard.first_note, "c3");
        assert_eq!(config.keyboard.last_note, "f4");
        assert_eq!(config.keyboard.key_hold_ms, 300);
        assert_eq!(config.export, ExportConfig::default());
        assert_eq!(config.export.ppqn, 128);
        assert_eq!(config.export.velocity, 50);
        assert_eq!(config.export.file, "pianorec.mid");
        assert_eq!(config.midi.input, None);
        assert_eq!(config.ui.frame_rate, 30);
        assert_eq!(config.log.file, "pianorec.log");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(AppConfig::from_yaml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_round_trip() {
        let mut original = AppConfig::default();
        original.endpoint = "http://example.test/tracks".to_string();
        original.export.tempo = 140.0;
        original.midi.output = Some("IAC".to_string());

        let yaml = original.to_yaml().unwrap();
        let parsed = AppConfig::from_yaml(&yaml).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_invalid_values() {
        let bad_note = "keyboard:\n  first_note: h9\n";
        assert!(AppConfig::from_yaml(bad_note).is_err());

        let backwards = "keyboard:\n  first_note: c5\n  last_note: c4\n";
        assert!(AppConfig::from_yaml(backwards).is_err());

        let bad_layout = "keyboard:\n  layout: dvorak\n";
        assert!(AppConfig::from_yaml(bad_layout).is_err());

        let bad_tempo = "export:\n  tempo: 0\n";
        assert!(AppConfig::from_yaml(bad_tempo).is_err());

        let bad_velocity = "export:\n  velocity: 0\n";
        assert!(AppConfig::from_yaml(bad_velocity).is_err());

        assert!(AppConfig::from_yaml("this is not valid yaml: [").is_err());
    }

    #[test]
    fn test_validate_reports_config_error() {
        let mut config = AppConfig::default();
        config.endpoint = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), "Config error");
    }

    #[test]
    fn test_layout_from_config() {
        let layout = KeyboardConfig::default().layout().unwrap();
        assert_eq!(layout.note_for('a'), Some(48));
        assert_eq!(layout.note_for('\''), Some(65));
    }

    #[test]
    fn test_exporter_from_config() {
        let export = ExportConfig {
            program: 5,
            ..ExportConfig::default()
        };
        let exporter = export.exporter();
        assert_eq!(exporter.program(), 5);
        assert_eq!(exporter.seconds_to_ticks(1.0), 256);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pianorec.yaml");

        let mut config = AppConfig::default();
        config.keyboard.layout = "bottom_row".to_string();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.keyboard.layout, "bottom_row");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_or_default(dir.path().join("missing.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.yaml");
        fs::write(&path, "this is not valid yaml: [").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }
}
