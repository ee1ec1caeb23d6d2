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

//! The note engine: turns note-on/note-off events into voices.
//!
//! Each played position moves through `Silent -> Sounding -> FadingOut -> Silent`. The engine
//! resolves the pitch with the tuning table, picks a recording from the sample bank, takes a
//! voice from the pool and tells the playback device what to play. Fades are stepped by
//! [`NoteEngine::tick`], which the owner must call periodically.
//!
//! The engine is single threaded. Use [`crate::scheduler`] to drive it from several threads.

mod error;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::audio::Device;
use crate::gate::{Connection, ConnectionGate, GateChange, DEFAULT_DISCONNECTED_GAIN_DB};
use crate::pool::{Sweep, Voice, VoiceId, VoicePool, VoiceState};
use crate::samples::{Pickup, SampleBank};
use crate::tuning::{Position, Tuning, STRING_COUNT};

pub use error::NoteError;

/// Default number of voices.
pub const DEFAULT_POOL_SIZE: usize = 32;

/// Default fade-out time after a note is released.
pub const DEFAULT_RELEASE_TIME: Duration = Duration::from_millis(300);

/// Default highest fret on the neck.
pub const DEFAULT_MAX_FRET: u8 = 22;

/// Engine tuning knobs. See [`crate::config::Instrument`] for how these are loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineSettings {
    /// Number of voices in the pool.
    pub pool_size: usize,
    /// Fade-out time for non-immediate note-offs.
    pub release_time: Duration,
    /// Overall volume.
    pub base_volume: f32,
    /// Gain multiplier for string 6.
    pub lowest_string_gain: f32,
    /// Gain multiplier for string 1.
    pub highest_string_gain: f32,
    /// The pickup selected at startup.
    pub pickup: Pickup,
    /// Whether to borrow another pickup's recordings when the selected one has none.
    pub pickup_fallback: bool,
    /// The highest playable fret.
    pub max_fret: u8,
    /// Whether the instrument starts out plugged in.
    pub connected: bool,
    /// Gate attenuation while unplugged.
    pub disconnected_gain_db: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            pool_size: DEFAULT_POOL_SIZE,
            release_time: DEFAULT_RELEASE_TIME,
            base_volume: 1.0,
            lowest_string_gain: 0.8,
            highest_string_gain: 1.2,
            pickup: Pickup::Neck,
            pickup_fallback: true,
            max_fret: DEFAULT_MAX_FRET,
            connected: true,
            disconnected_gain_db: DEFAULT_DISCONNECTED_GAIN_DB,
        }
    }
}

impl EngineSettings {
    /// Linearly interpolates the per-string gain from string 6 to string 1.
    pub fn string_gain(&self, string: u8) -> f32 {
        let string = string.clamp(1, STRING_COUNT);
        let t = f32::from(STRING_COUNT - string) / f32::from(STRING_COUNT - 1);
        self.lowest_string_gain + (self.highest_string_gain - self.lowest_string_gain) * t
    }
}

/// The state of a played position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteState {
    Silent,
    Sounding,
    FadingOut,
}

/// A typed request to the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Start a note, retriggering it if it is already sounding.
    NoteOn(Position),
    /// Release a note, either immediately or with a fade.
    NoteOff { position: Position, immediate: bool },
    /// Select the pickup for subsequent notes.
    SetPickup(Pickup),
    /// Release every sounding note.
    StopAll { immediate: bool },
    /// Plug or unplug a cable.
    SetConnection {
        connection: Connection,
        connected: bool,
    },
    /// Step fades and reclaim finished voices.
    Tick,
}

/// A command stamped with the time it happened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteEvent {
    pub command: Command,
    pub timestamp: Instant,
}

impl NoteEvent {
    /// Stamps a command with the current time.
    pub fn now(command: Command) -> NoteEvent {
        NoteEvent {
            command,
            timestamp: Instant::now(),
        }
    }
}

/// Plays notes from a sample bank through a voice pool.
pub struct NoteEngine {
    settings: EngineSettings,
    tuning: Tuning,
    bank: Arc<SampleBank>,
    pool: VoicePool,
    gate: ConnectionGate,
    pickup: Pickup,
}

impl NoteEngine {
    /// Creates a new engine. All voices are allocated here.
    pub fn new(settings: EngineSettings, bank: Arc<SampleBank>, device: Arc<dyn Device>) -> Self {
        info!(
            voices = settings.pool_size,
            samples = bank.len(),
            release_ms = settings.release_time.as_millis(),
            pickup = %settings.pickup,
            device = %device,
            "Creating note engine"
        );

        NoteEngine {
            tuning: *bank.tuning(),
            pool: VoicePool::new(settings.pool_size, device),
            gate: ConnectionGate::new(settings.connected, settings.disconnected_gain_db),
            pickup: settings.pickup,
            settings,
            bank,
        }
    }

    /// Starts a note. If the position is already sounding, the old voice is stopped first.
    pub fn note_on(&mut self, position: Position, now: Instant) -> Result<VoiceId, NoteError> {
        let midi = match self.tuning.pitch(position.string, position.fret) {
            Ok(midi) => midi,
            Err(_) => {
                error!(string = position.string, "Note on an invalid string");
                return Err(NoteError::InvalidString(position.string));
            }
        };
        if position.fret > self.settings.max_fret {
            error!(
                fret = position.fret,
                max_fret = self.settings.max_fret,
                "Note beyond the last fret"
            );
            return Err(NoteError::InvalidFret {
                fret: position.fret,
                max_fret: self.settings.max_fret,
            });
        }

        if self.pool.bound(position).is_some() {
            debug!(%position, "Retriggering note");
            self.note_off(position, true, now);
        }

        let pickup = self.pickup;
        let resolved = if self.settings.pickup_fallback {
            self.bank
                .resolve_with_fallback(position.string, position.fret, pickup)
        } else {
            self.bank.resolve(position.string, position.fret, pickup)
        };
        let resolution = match resolved {
            Ok(resolution) => resolution,
            Err(source) => {
                warn!(%position, %pickup, error = %source, "No sample for note, dropping it");
                return Err(NoteError::SampleUnavailable {
                    position,
                    pickup,
                    source,
                });
            }
        };

        let gain = self.settings.base_volume
            * self.settings.string_gain(position.string)
            * self.gate.gate();
        let pitch = resolution.pitch_multiplier();

        let Some(id) = self.pool.acquire() else {
            warn!(
                %position,
                voices = self.pool.capacity(),
                "No voice available, dropping note"
            );
            return Err(NoteError::VoiceExhausted(position));
        };

        let sample = resolution.sample();
        self.pool.start(id, sample.asset(), gain, pitch, now);
        self.pool.bind_active(position, id);

        debug!(
            %position,
            midi,
            asset = sample.asset().name(),
            exact = resolution.is_exact(),
            base_fret = resolution.base_fret(),
            gain,
            pitch,
            voice = id.index(),
            "Note on"
        );
        Ok(id)
    }

    /// Releases a note. Immediate release stops the voice now; otherwise it fades out over the
    /// release time. Returns false if the position was not sounding.
    pub fn note_off(&mut self, position: Position, immediate: bool, now: Instant) -> bool {
        let Some(id) = self.pool.bound(position) else {
            return false;
        };

        if immediate || self.settings.release_time.is_zero() {
            self.pool.unbind(position);
            self.pool.release(id);
            debug!(%position, voice = id.index(), "Note stopped");
        } else if self.pool.begin_fade(id, self.settings.release_time, now) {
            debug!(
                %position,
                voice = id.index(),
                release_ms = self.settings.release_time.as_millis(),
                "Note fading out"
            );
        }
        true
    }

    /// Releases every sounding note. Returns how many notes were released.
    pub fn stop_all(&mut self, immediate: bool, now: Instant) -> usize {
        let keys: Vec<Position> = self.pool.keys().collect();
        let stopped = keys
            .into_iter()
            .filter(|&key| self.note_off(key, immediate, now))
            .count();

        if stopped > 0 {
            info!(stopped, immediate, "All notes stopped");
        }
        stopped
    }

    /// Selects the pickup used for new notes. Sounding notes keep their sample.
    pub fn set_pickup(&mut self, pickup: Pickup) {
        if self.pickup != pickup {
            info!(%pickup, "Pickup changed");
            self.pickup = pickup;
        }
    }

    /// Returns the selected pickup.
    pub fn pickup(&self) -> Pickup {
        self.pickup
    }

    /// Plugs or unplugs a cable. When the gate opens or closes every sounding note is
    /// re-leveled in place.
    pub fn set_connection(&mut self, connection: Connection, connected: bool) -> Option<GateChange> {
        let change = self.gate.set(connection, connected)?;
        let updated = self.recalculate_gains();
        debug!(updated, gain = change.gain, "Re-leveled sounding notes");
        Some(change)
    }

    /// Recomputes the gain of every sounding note without touching pitch or playback position.
    pub fn recalculate_gains(&mut self) -> usize {
        let settings = &self.settings;
        let gate = self.gate.gate();
        self.pool
            .relevel(|key| settings.base_volume * settings.string_gain(key.string) * gate)
    }

    /// Steps fades and reclaims voices whose samples finished.
    pub fn tick(&mut self, now: Instant) -> Sweep {
        let sweep = self.pool.sweep(now);
        if sweep.faded > 0 || sweep.finished > 0 {
            debug!(
                faded = sweep.faded,
                finished = sweep.finished,
                active = self.pool.active_count(),
                "Voices returned to pool"
            );
        }
        sweep
    }

    /// Applies a command. Only note-on can fail.
    pub fn apply(&mut self, command: Command, now: Instant) -> Result<(), NoteError> {
        match command {
            Command::NoteOn(position) => {
                self.note_on(position, now)?;
            }
            Command::NoteOff {
                position,
                immediate,
            } => {
                self.note_off(position, immediate, now);
            }
            Command::SetPickup(pickup) => self.set_pickup(pickup),
            Command::StopAll { immediate } => {
                self.stop_all(immediate, now);
            }
            Command::SetConnection {
                connection,
                connected,
            } => {
                self.set_connection(connection, connected);
            }
            Command::Tick => {
                self.tick(now);
            }
        }
        Ok(())
    }

    /// Returns the state of a played position.
    pub fn state(&self, position: Position) -> NoteState {
        match self
            .pool
            .bound(position)
            .map(|id| self.pool.voice(id).state())
        {
            Some(VoiceState::Active) => NoteState::Sounding,
            Some(VoiceState::FadingOut) => NoteState::FadingOut,
            Some(VoiceState::Idle) | None => NoteState::Silent,
        }
    }

    /// Returns the voice playing a position.
    pub fn voice_for(&self, position: Position) -> Option<&Voice> {
        self.pool.bound(position).map(|id| self.pool.voice(id))
    }

    /// Returns the number of sounding voices.
    pub fn active_voices(&self) -> usize {
        self.pool.active_count()
    }

    /// Returns the voice pool.
    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    /// Returns the sample bank.
    pub fn bank(&self) -> &Arc<SampleBank> {
        &self.bank
    }

    /// Returns the connection gate.
    pub fn gate(&self) -> &ConnectionGate {
        &self.gate
    }

    /// Returns the settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

impl std::fmt::Debug for NoteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteEngine")
            .field("samples", &self.bank.len())
            .field("pickup", &self.pickup)
            .field("connected", &self.gate.is_enabled())
            .field("active_voices", &self.pool.active_count())
            .finish()
    }
}
