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

//! String tuning: maps a (string, fret) position to an absolute MIDI pitch.
//!
//! Strings are numbered the way guitarists number them: string 1 is the highest
//! (thinnest) string and string 6 is the lowest. The same table is used to tag
//! recorded samples at load time and to resolve notes at play time.

use std::fmt;

/// Number of strings on the instrument.
pub const STRING_COUNT: u8 = 6;

/// Open-string pitches for standard tuning, indexed by `string - 1`.
const STANDARD_OPEN_PITCHES: [u8; STRING_COUNT as usize] = [
    64, // E4
    59, // B3
    55, // G3
    50, // D3
    45, // A2
    40, // E2
];

/// Errors produced by tuning lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TuningError {
    #[error("string {0} is not on the instrument (expected 1..={STRING_COUNT})")]
    InvalidString(u8),
}

/// A played position on the fretboard. This is also the key of the active-notes table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// The string, 1 (highest) through 6 (lowest).
    pub string: u8,
    /// The fret, 0 being the open string.
    pub fret: u8,
}

impl Position {
    /// Creates a new position.
    pub fn new(string: u8, fret: u8) -> Position {
        Position { string, fret }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "string {} fret {}", self.string, self.fret)
    }
}

/// The tuning table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuning {
    open_pitches: [u8; STRING_COUNT as usize],
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning::standard()
    }
}

impl Tuning {
    /// Standard E tuning (E2 A2 D3 G3 B3 E4).
    pub const fn standard() -> Tuning {
        Tuning {
            open_pitches: STANDARD_OPEN_PITCHES,
        }
    }

    /// Returns true if the string index exists on the instrument.
    pub fn is_valid_string(string: u8) -> bool {
        (1..=STRING_COUNT).contains(&string)
    }

    /// Returns the MIDI pitch of the open string.
    pub fn open_pitch(&self, string: u8) -> Result<u8, TuningError> {
        if !Self::is_valid_string(string) {
            return Err(TuningError::InvalidString(string));
        }
        Ok(self.open_pitches[(string - 1) as usize])
    }

    /// Returns the MIDI pitch for the given string and fret.
    pub fn pitch(&self, string: u8, fret: u8) -> Result<u8, TuningError> {
        Ok(self.open_pitch(string)?.saturating_add(fret))
    }

    /// Finds a position that plays the given MIDI pitch, preferring the lowest string
    /// that can reach it within `max_fret`.
    pub fn find_position(&self, midi: u8, max_fret: u8) -> Option<Position> {
        (1..=STRING_COUNT).rev().find_map(|string| {
            let open = self.open_pitches[(string - 1) as usize];
            let fret = midi.checked_sub(open)?;
            (fret <= max_fret).then(|| Position::new(string, fret))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_pitches() {
        let tuning = Tuning::standard();
        assert_eq!(tuning.open_pitch(6), Ok(40));
        assert_eq!(tuning.open_pitch(5), Ok(45));
        assert_eq!(tuning.open_pitch(4), Ok(50));
        assert_eq!(tuning.open_pitch(3), Ok(55));
        assert_eq!(tuning.open_pitch(2), Ok(59));
        assert_eq!(tuning.open_pitch(1), Ok(64));
    }

    #[test]
    fn test_invalid_strings() {
        let tuning = Tuning::standard();
        assert_eq!(tuning.open_pitch(0), Err(TuningError::InvalidString(0)));
        assert_eq!(tuning.open_pitch(7), Err(TuningError::InvalidString(7)));
        assert_eq!(tuning.pitch(9, 3), Err(TuningError::InvalidString(9)));
    }

    #[test]
    fn test_pitch_is_open_plus_fret() {
        let tuning = Tuning::standard();
        for string in 1..=STRING_COUNT {
            let open = tuning.open_pitch(string).unwrap();
            let mut previous = None;
            for fret in 0..=22 {
                let pitch = tuning.pitch(string, fret).unwrap();
                assert_eq!(pitch, open + fret);
                if let Some(previous) = previous {
                    assert!(pitch > previous);
                }
                previous = Some(pitch);
            }
        }
    }

    #[test]
    fn test_find_position_prefers_low_strings() {
        let tuning = Tuning::standard();

        // E2 only exists on the open low E string.
        assert_eq!(tuning.find_position(40, 22), Some(Position::new(6, 0)));
        // A2 is reachable on string 6 at fret 5 before the open A string.
        assert_eq!(tuning.find_position(45, 22), Some(Position::new(6, 5)));
        // With a short neck the search moves on to higher strings.
        assert_eq!(tuning.find_position(64, 12), Some(Position::new(3, 9)));
        // Below the lowest string.
        assert_eq!(tuning.find_position(39, 22), None);
        // Above the highest fret of the highest string.
        assert_eq!(tuning.find_position(64 + 23, 22), None);
    }
}
