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
use std::path::PathBuf;

use super::Pickup;

/// Errors from parsing a sample name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("'{0}' does not contain a <pickup><string>_<fret> tag")]
    NoTag(String),

    #[error("fret {fret} in '{name}' is out of range")]
    FretOutOfRange { name: String, fret: String },
}

/// Errors from resolving a sample for a played position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("string {0} is not on the instrument")]
    InvalidString(u8),

    #[error("no sample recorded for string {string} on the {pickup} pickup")]
    NoSampleAvailable { pickup: Pickup, string: u8 },
}

/// Errors from scanning an asset library on disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unable to read sample directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
