// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Hardware MIDI keyboard input.
//!
//! A midir input port forwards note messages from its callback thread to the
//! UI loop over a channel. Everything else on the wire is dropped.

pub mod input;

pub use input::{list_sources, print_ports, MidiInput, MidiMessage};

/// Status bytes and controller numbers used on the wire
pub mod messages {
    // Channel voice status (low nibble carries the channel)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;

    /// Controller that silences a channel
    pub const ALL_NOTES_OFF: u8 = 123;

    /// Real-time clock tick, dropped by the input filter
    pub const TIMING_CLOCK: u8 = 0xF8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_bytes_carry_channel() {
        assert_eq!(messages::NOTE_ON | 9, 0x99);
        assert_eq!(messages::NOTE_OFF & 0xF0, 0x80);
        assert_eq!(messages::PROGRAM_CHANGE | 0x0F, 0xCF);
        assert!(messages::ALL_NOTES_OFF < 0x80);
    }
}
