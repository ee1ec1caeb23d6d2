// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::num::ParseIntError;

use midly::{live::LiveEvent, MidiMessage};
use tracing::debug;

use crate::engine::Command;
use crate::tuning::{Position, Tuning};

/// Controller number for "all sound off".
const ALL_SOUND_OFF: u8 = 120;

/// Controller number for "all notes off".
const ALL_NOTES_OFF: u8 = 123;

/// Translates a raw live MIDI message into an engine command. Notes are placed on the lowest
/// string that can play them. Returns `None` for messages the engine has no use for.
pub fn translate(raw: &[u8], tuning: &Tuning, max_fret: u8) -> Option<Command> {
    match LiveEvent::parse(raw) {
        Ok(event) => translate_event(&event, tuning, max_fret),
        Err(e) => {
            debug!(err = %e, "Unable to parse MIDI message.");
            None
        }
    }
}

/// Translates a parsed live MIDI event into an engine command.
pub fn translate_event(event: &LiveEvent<'_>, tuning: &Tuning, max_fret: u8) -> Option<Command> {
    let LiveEvent::Midi { message, .. } = event else {
        return None;
    };

    match *message {
        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
            position(tuning, key.as_int(), max_fret).map(Command::NoteOn)
        }
        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
            position(tuning, key.as_int(), max_fret).map(|position| Command::NoteOff {
                position,
                immediate: false,
            })
        }
        MidiMessage::Controller { controller, .. } => match controller.as_int() {
            ALL_NOTES_OFF => Some(Command::StopAll { immediate: false }),
            ALL_SOUND_OFF => Some(Command::StopAll { immediate: true }),
            _ => None,
        },
        _ => None,
    }
}

/// Parses a MIDI message written as whitespace-separated hex bytes, e.g. `90 28 64`.
pub fn parse_hex(line: &str) -> Result<Vec<u8>, ParseIntError> {
    line.split_whitespace()
        .map(|byte| u8::from_str_radix(byte, 16))
        .collect()
}

fn position(tuning: &Tuning, key: u8, max_fret: u8) -> Option<Position> {
    let position = tuning.find_position(key, max_fret);
    if position.is_none() {
        debug!(key, max_fret, "MIDI note is not playable on the instrument.");
    }
    position
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate_standard(raw: &[u8]) -> Option<Command> {
        translate(raw, &Tuning::standard(), 22)
    }

    #[test]
    fn test_note_on() {
        assert_eq!(
            translate_standard(&[0x90, 40, 100]),
            Some(Command::NoteOn(Position::new(6, 0)))
        );
        // E4 is out of reach on string 6, so it lands on string 5.
        assert_eq!(
            translate_standard(&[0x93, 64, 1]),
            Some(Command::NoteOn(Position::new(5, 19)))
        );
    }

    #[test]
    fn test_note_off() {
        let off = Some(Command::NoteOff {
            position: Position::new(6, 7),
            immediate: false,
        });
        assert_eq!(translate_standard(&[0x80, 47, 64]), off);
        // Note on with zero velocity is a note off.
        assert_eq!(translate_standard(&[0x90, 47, 0]), off);
    }

    #[test]
    fn test_unplayable_notes() {
        assert_eq!(translate_standard(&[0x90, 39, 100]), None);
        assert_eq!(translate_standard(&[0x90, 64 + 23, 100]), None);
        assert_eq!(translate(&[0x90, 70, 100], &Tuning::standard(), 5), None);
    }

    #[test]
    fn test_controllers() {
        assert_eq!(
            translate_standard(&[0xB0, 123, 0]),
            Some(Command::StopAll { immediate: false })
        );
        assert_eq!(
            translate_standard(&[0xB0, 120, 0]),
            Some(Command::StopAll { immediate: true })
        );
        assert_eq!(translate_standard(&[0xB0, 7, 100]), None);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("90 28 64").unwrap(), vec![0x90, 40, 100]);
        assert_eq!(parse_hex("  b0\t7B 00 ").unwrap(), vec![0xB0, 123, 0]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
        assert!(parse_hex("90 zz").is_err());
        assert!(parse_hex("100").is_err());

        assert_eq!(
            translate_standard(&parse_hex("80 2f 40").unwrap()),
            Some(Command::NoteOff {
                position: Position::new(6, 7),
                immediate: false,
            })
        );
    }

    #[test]
    fn test_ignored_messages() {
        assert_eq!(translate_standard(&[0xC0, 5]), None);
        assert_eq!(translate_standard(&[]), None);
    }
}
