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
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::audio;
use crate::engine::NoteEngine;
use crate::samples::{self, SampleBank};
use crate::tuning::Tuning;

mod error;
mod instrument;
mod tab;

pub use error::ConfigError;
pub use instrument::Instrument;
pub use tab::{Tab, TabNote};

/// Loads the sample bank described by an instrument. `base` is the directory relative sample
/// paths are resolved against.
pub fn load_bank(instrument: &Instrument, base: &Path) -> Result<SampleBank, Box<dyn Error>> {
    let dir = instrument.samples_dir(base);
    let assets = samples::scan(&dir)?;
    let bank = SampleBank::load(assets, Tuning::standard(), instrument.max_fret());
    if bank.is_empty() {
        warn!(dir = %dir.display(), "No usable samples found");
    }
    Ok(bank)
}

/// Initializes a note engine from the given instrument file.
pub fn init_engine(path: &Path) -> Result<(Instrument, NoteEngine), Box<dyn Error>> {
    let instrument = Instrument::deserialize(path)?;
    let base = path.parent().unwrap_or(Path::new("."));
    let bank = load_bank(&instrument, base)?;
    let device = audio::get_device(instrument.device())?;

    info!(
        instrument = %path.display(),
        device = instrument.device(),
        "Initializing note engine"
    );
    let engine = NoteEngine::new(instrument.engine_settings()?, Arc::new(bank), device);
    Ok((instrument, engine))
}
