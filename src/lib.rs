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

//! A sample-based guitar voice engine.
//!
//! A played position is mapped to a pitch with the [`tuning`] table, matched against the
//! recordings in a [`samples::SampleBank`] and pitch-shifted from the nearest recorded fret.
//! The [`engine`] plays notes through a fixed [`pool`] of voices, fades them out on release and
//! attenuates everything through the connection [`gate`] when a cable is unplugged.

pub mod audio;
pub mod config;
pub mod engine;
pub mod gate;
pub mod midi;
pub mod pool;
pub mod samples;
pub mod scheduler;
pub mod tuning;
#[cfg(test)]
mod testutil;
