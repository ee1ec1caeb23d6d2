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

//! Recorded sample library.
//!
//! This module provides:
//! - Asset discovery on disk
//! - The `<pickup><string>_<fret>` naming convention
//! - The immutable sample bank and its nearest-fret resolver

mod bank;
mod error;
mod loader;
pub mod name;
mod pickup;

pub use bank::{pitch_multiplier, Resolution, Sample, SampleBank};
pub use error::{LoadError, NameError, ResolveError};
pub use loader::{scan, Asset};
pub use pickup::Pickup;
