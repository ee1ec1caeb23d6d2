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

//! The sample bank: an immutable index of recorded samples and the nearest-fret resolver.

use std::array;
use std::fmt;

use tracing::{debug, info, warn};

use super::error::ResolveError;
use super::loader::Asset;
use super::name;
use super::Pickup;
use crate::tuning::{Tuning, STRING_COUNT};

/// Semitones per octave in equal temperament.
const SEMITONES_PER_OCTAVE: f64 = 12.0;

/// A recorded sample for one pickup, string and fret.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pickup: Pickup,
    string: u8,
    recorded_fret: u8,
    asset: Asset,
    base_pitch: u8,
}

impl Sample {
    /// Returns the pickup the sample was recorded with.
    pub fn pickup(&self) -> Pickup {
        self.pickup
    }

    /// Returns the string the sample was recorded on.
    pub fn string(&self) -> u8 {
        self.string
    }

    /// Returns the fret the sample was recorded at.
    pub fn recorded_fret(&self) -> u8 {
        self.recorded_fret
    }

    /// Returns the audio asset.
    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    /// Returns the MIDI pitch of the recording.
    pub fn base_pitch(&self) -> u8 {
        self.base_pitch
    }
}

/// Returns the playback rate that shifts a recording at `base_fret` to `fret`.
pub fn pitch_multiplier(fret: u8, base_fret: u8) -> f64 {
    if fret == base_fret {
        return 1.0;
    }
    let semitones = f64::from(fret) - f64::from(base_fret);
    2f64.powf(semitones / SEMITONES_PER_OCTAVE)
}

/// The outcome of resolving a played position against the bank.
#[derive(Clone, Copy, Debug)]
pub struct Resolution<'a> {
    sample: &'a Sample,
    fret: u8,
    exact: bool,
}

impl<'a> Resolution<'a> {
    /// Returns the resolved sample.
    pub fn sample(&self) -> &'a Sample {
        self.sample
    }

    /// Returns true if the sample was recorded at exactly the requested fret.
    pub fn is_exact(&self) -> bool {
        self.exact
    }

    /// Returns the fret the sample was recorded at.
    pub fn base_fret(&self) -> u8 {
        self.sample.recorded_fret
    }

    /// Returns the playback rate needed to reach the requested fret.
    pub fn pitch_multiplier(&self) -> f64 {
        if self.exact {
            1.0
        } else {
            pitch_multiplier(self.fret, self.base_fret())
        }
    }
}

/// Recorded samples indexed by pickup and string, each list sorted by recorded fret.
pub struct SampleBank {
    tuning: Tuning,
    tables: [[Vec<Sample>; STRING_COUNT as usize]; 3],
}

impl SampleBank {
    /// Creates an empty bank.
    pub fn empty(tuning: Tuning) -> SampleBank {
        SampleBank {
            tuning,
            tables: array::from_fn(|_| array::from_fn(|_| Vec::new())),
        }
    }

    /// Builds the bank from an asset library. Assets whose names do not follow the naming
    /// convention, or that were recorded above `max_fret`, are skipped with a warning.
    pub fn load<I>(assets: I, tuning: Tuning, max_fret: u8) -> SampleBank
    where
        I: IntoIterator<Item = Asset>,
    {
        let mut bank = SampleBank::empty(tuning);
        let mut skipped = 0usize;

        for asset in assets {
            let parsed = match name::parse(asset.name()) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(asset = asset.name(), error = %e, "Skipping sample");
                    skipped += 1;
                    continue;
                }
            };

            if parsed.fret > max_fret {
                warn!(
                    asset = asset.name(),
                    fret = parsed.fret,
                    max_fret,
                    "Skipping sample above the last fret"
                );
                skipped += 1;
                continue;
            }

            let base_pitch = match tuning.pitch(parsed.string, parsed.fret) {
                Ok(pitch) => pitch,
                Err(e) => {
                    warn!(asset = asset.name(), error = %e, "Skipping sample");
                    skipped += 1;
                    continue;
                }
            };

            bank.insert(Sample {
                pickup: parsed.pickup,
                string: parsed.string,
                recorded_fret: parsed.fret,
                asset,
                base_pitch,
            });
        }

        info!(samples = bank.len(), skipped, "Sample bank loaded");
        for string in bank.missing_strings() {
            warn!(string, "No samples recorded for string on any pickup, it will not sound");
        }

        bank
    }

    fn insert(&mut self, sample: Sample) {
        let table = &mut self.tables[sample.pickup.index()][(sample.string - 1) as usize];
        match table.binary_search_by_key(&sample.recorded_fret, |s| s.recorded_fret) {
            Ok(existing) => {
                warn!(
                    replaced = table[existing].asset.name(),
                    asset = sample.asset.name(),
                    "Duplicate sample for position, keeping the later one"
                );
                table[existing] = sample;
            }
            Err(at) => {
                debug!(
                    asset = sample.asset.name(),
                    pickup = %sample.pickup,
                    string = sample.string,
                    fret = sample.recorded_fret,
                    "Sample added"
                );
                table.insert(at, sample);
            }
        }
    }

    /// Returns the tuning the bank was tagged with.
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Returns the samples recorded for a pickup and string, ordered by fret.
    pub fn samples(&self, pickup: Pickup, string: u8) -> &[Sample] {
        if !Tuning::is_valid_string(string) {
            return &[];
        }
        &self.tables[pickup.index()][(string - 1) as usize]
    }

    /// Returns the recorded frets for a pickup and string, in ascending order.
    pub fn recorded_frets(&self, pickup: Pickup, string: u8) -> Vec<u8> {
        self.samples(pickup, string)
            .iter()
            .map(|s| s.recorded_fret)
            .collect()
    }

    /// Returns the total number of samples.
    pub fn len(&self) -> usize {
        self.tables.iter().flatten().map(Vec::len).sum()
    }

    /// Returns true if no samples were loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the strings that have no recording under any pickup.
    pub fn missing_strings(&self) -> Vec<u8> {
        (1..=STRING_COUNT)
            .filter(|&string| {
                Pickup::ALL
                    .iter()
                    .all(|&pickup| self.samples(pickup, string).is_empty())
            })
            .collect()
    }

    /// Resolves the sample to play for a position on the given pickup.
    ///
    /// An exact recording is preferred. Otherwise the recording with the smallest fret
    /// distance is chosen, and equidistant recordings resolve to the lower fret.
    pub fn resolve(
        &self,
        string: u8,
        fret: u8,
        pickup: Pickup,
    ) -> Result<Resolution<'_>, ResolveError> {
        if !Tuning::is_valid_string(string) {
            return Err(ResolveError::InvalidString(string));
        }

        let table = self.samples(pickup, string);
        if let Ok(index) = table.binary_search_by_key(&fret, |s| s.recorded_fret) {
            return Ok(Resolution {
                sample: &table[index],
                fret,
                exact: true,
            });
        }

        table
            .iter()
            .min_by_key(|s| (s.recorded_fret.abs_diff(fret), s.recorded_fret))
            .map(|sample| Resolution {
                sample,
                fret,
                exact: false,
            })
            .ok_or(ResolveError::NoSampleAvailable { pickup, string })
    }

    /// Resolves on the preferred pickup, falling back to the other pickups in order when the
    /// preferred one has nothing recorded for the string.
    pub fn resolve_with_fallback(
        &self,
        string: u8,
        fret: u8,
        preferred: Pickup,
    ) -> Result<Resolution<'_>, ResolveError> {
        let first = match self.resolve(string, fret, preferred) {
            Err(e @ ResolveError::NoSampleAvailable { .. }) => e,
            other => return other,
        };

        Pickup::ALL
            .iter()
            .filter(|&&pickup| pickup != preferred)
            .find_map(|&pickup| self.resolve(string, fret, pickup).ok())
            .inspect(|resolution| {
                debug!(
                    string,
                    fret,
                    preferred = %preferred,
                    used = %resolution.sample().pickup(),
                    "Falling back to another pickup"
                );
            })
            .ok_or(first)
    }
}

impl fmt::Debug for SampleBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBank")
            .field("samples", &self.len())
            .field("missing_strings", &self.missing_strings())
            .finish()
    }
}
