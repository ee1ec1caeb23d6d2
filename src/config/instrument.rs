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
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File};
use duration_string::DurationString;
use serde::Deserialize;

use super::error::ConfigError;
use crate::engine::{EngineSettings, DEFAULT_MAX_FRET, DEFAULT_POOL_SIZE, DEFAULT_RELEASE_TIME};
use crate::gate::DEFAULT_DISCONNECTED_GAIN_DB;
use crate::samples::Pickup;
use crate::scheduler::DEFAULT_TICK_INTERVAL;

/// The default playback device.
const DEFAULT_DEVICE: &str = "mock";

/// Parses an optional duration string such as "300ms", falling back to a default.
pub(super) fn parse_duration(
    field: &'static str,
    value: Option<&String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        Some(value) => DurationString::from_string(value.clone())
            .map(Into::into)
            .map_err(|e| ConfigError::InvalidDuration {
                field,
                value: value.clone(),
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}

/// A YAML representation of an instrument.
#[derive(Deserialize, Clone, Debug)]
pub struct Instrument {
    /// The directory holding the recorded samples. Relative paths are resolved against the
    /// directory containing the configuration file.
    samples: String,

    /// The playback device.
    device: Option<String>,

    /// The number of voices.
    pool_size: Option<usize>,

    /// How long released notes take to fade out, e.g. "300ms".
    release_time: Option<String>,

    base_volume: Option<f32>,
    lowest_string_gain: Option<f32>,
    highest_string_gain: Option<f32>,

    /// How far the gate attenuates while a cable is unplugged.
    disconnected_gain_db: Option<f32>,

    /// Whether the cables start out plugged in.
    connected: Option<bool>,

    pickup: Option<Pickup>,
    pickup_fallback: Option<bool>,
    max_fret: Option<u8>,

    /// How often fades are stepped, e.g. "10ms".
    tick_interval: Option<String>,
}

impl Instrument {
    /// Creates a new instrument configuration with defaults for everything but the samples.
    pub fn new(samples: &str) -> Instrument {
        Instrument {
            samples: samples.to_string(),
            device: None,
            pool_size: None,
            release_time: None,
            base_volume: None,
            lowest_string_gain: None,
            highest_string_gain: None,
            disconnected_gain_db: None,
            connected: None,
            pickup: None,
            pickup_fallback: None,
            max_fret: None,
            tick_interval: None,
        }
    }

    /// Parses and validates an instrument from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Instrument, ConfigError> {
        let instrument = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Instrument>()?;
        instrument.validate()?;
        Ok(instrument)
    }

    /// Returns the samples directory as written in the configuration.
    pub fn samples(&self) -> &str {
        &self.samples
    }

    /// Returns the samples directory, resolved against the given base directory.
    pub fn samples_dir(&self, base: &Path) -> PathBuf {
        let samples = Path::new(&self.samples);
        if samples.is_absolute() {
            samples.to_path_buf()
        } else {
            base.join(samples)
        }
    }

    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size.unwrap_or(DEFAULT_POOL_SIZE)
    }

    /// Returns the release time (default: 300ms).
    pub fn release_time(&self) -> Result<Duration, ConfigError> {
        parse_duration(
            "release_time",
            self.release_time.as_ref(),
            DEFAULT_RELEASE_TIME,
        )
    }

    pub fn base_volume(&self) -> f32 {
        self.base_volume.unwrap_or(1.0)
    }

    pub fn lowest_string_gain(&self) -> f32 {
        self.lowest_string_gain.unwrap_or(0.8)
    }

    pub fn highest_string_gain(&self) -> f32 {
        self.highest_string_gain.unwrap_or(1.2)
    }

    pub fn disconnected_gain_db(&self) -> f32 {
        self.disconnected_gain_db
            .unwrap_or(DEFAULT_DISCONNECTED_GAIN_DB)
    }

    pub fn connected(&self) -> bool {
        self.connected.unwrap_or(true)
    }

    pub fn pickup(&self) -> Pickup {
        self.pickup.unwrap_or_default()
    }

    pub fn pickup_fallback(&self) -> bool {
        self.pickup_fallback.unwrap_or(true)
    }

    pub fn max_fret(&self) -> u8 {
        self.max_fret.unwrap_or(DEFAULT_MAX_FRET)
    }

    /// Returns the fade step interval (default: 10ms).
    pub fn tick_interval(&self) -> Result<Duration, ConfigError> {
        parse_duration(
            "tick_interval",
            self.tick_interval.as_ref(),
            DEFAULT_TICK_INTERVAL,
        )
    }

    /// Rejects values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples.is_empty() {
            return Err(ConfigError::Invalid("samples must not be empty".to_string()));
        }
        if self.pool_size() == 0 {
            return Err(ConfigError::Invalid(
                "pool_size must be at least 1".to_string(),
            ));
        }
        for (field, gain) in [
            ("base_volume", self.base_volume()),
            ("lowest_string_gain", self.lowest_string_gain()),
            ("highest_string_gain", self.highest_string_gain()),
        ] {
            if !gain.is_finite() || gain < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a non-negative number, got {}",
                    field, gain
                )));
            }
        }
        let db = self.disconnected_gain_db();
        if !db.is_finite() || db > 0.0 {
            return Err(ConfigError::Invalid(format!(
                "disconnected_gain_db must be a finite attenuation (<= 0), got {}",
                db
            )));
        }
        if self.tick_interval()?.is_zero() {
            return Err(ConfigError::Invalid(
                "tick_interval must be greater than zero".to_string(),
            ));
        }
        self.release_time()?;
        Ok(())
    }

    /// Converts the configuration into engine settings.
    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        Ok(EngineSettings {
            pool_size: self.pool_size(),
            release_time: self.release_time()?,
            base_volume: self.base_volume(),
            lowest_string_gain: self.lowest_string_gain(),
            highest_string_gain: self.highest_string_gain(),
            pickup: self.pickup(),
            pickup_fallback: self.pickup_fallback(),
            max_fret: self.max_fret(),
            connected: self.connected(),
            disconnected_gain_db: self.disconnected_gain_db(),
        })
    }
}
