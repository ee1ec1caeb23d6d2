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
use crate::samples::{Pickup, ResolveError};
use crate::tuning::Position;

/// Why a note did not sound. None of these are fatal; the note is dropped and logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NoteError {
    #[error("string {0} is not on the instrument")]
    InvalidString(u8),

    #[error("fret {fret} is beyond the last fret ({max_fret})")]
    InvalidFret { fret: u8, max_fret: u8 },

    #[error("no sample for {position} on the {pickup} pickup: {source}")]
    SampleUnavailable {
        position: Position,
        pickup: Pickup,
        #[source]
        source: ResolveError,
    },

    #[error("no voice available for {0}")]
    VoiceExhausted(Position),
}
