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

//! A single playback voice and its fade-out ramp.

use std::fmt;
use std::time::{Duration, Instant};

use crate::samples::Asset;
use crate::tuning::Position;

/// Identifies a voice slot in the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(usize);

impl VoiceId {
    pub(super) fn new(index: usize) -> VoiceId {
        VoiceId(index)
    }

    /// Returns the slot index, which is also the device slot.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice {}", self.0)
    }
}

/// The lifecycle state of a voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceState {
    /// Not playing; available to the pool.
    Idle,
    /// Playing at its configured gain.
    Active,
    /// Ramping down to silence before returning to the pool.
    FadingOut,
}

/// A linear gain ramp to silence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fade {
    start_gain: f32,
    started_at: Instant,
    duration: Duration,
}

impl Fade {
    /// Creates a ramp from `start_gain` to zero over `duration`, starting at `started_at`.
    pub fn new(start_gain: f32, started_at: Instant, duration: Duration) -> Fade {
        Fade {
            start_gain,
            started_at,
            duration,
        }
    }

    /// Returns the gain the ramp started from.
    pub fn start_gain(&self) -> f32 {
        self.start_gain
    }

    /// Returns when the ramp started.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the ramp length.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns true once the ramp has reached silence.
    pub fn is_complete(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) >= self.duration
    }

    /// Returns the ramp gain at the given time.
    pub fn gain_at(&self, now: Instant) -> f32 {
        if self.is_complete(now) {
            return 0.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        let progress = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.start_gain * (1.0 - progress) as f32
    }
}

/// A playback voice. Voices are created once by the pool and recycled forever.
pub struct Voice {
    id: VoiceId,
    /// Set between acquire and release, even before playback starts.
    pub(super) allocated: bool,
    pub(super) asset: Option<Asset>,
    pub(super) gain: f32,
    pub(super) pitch: f64,
    /// Playback position within the asset, in asset time.
    pub(super) position: Duration,
    pub(super) state: VoiceState,
    pub(super) fade: Option<Fade>,
    /// The note this voice is bound to in the active-notes table.
    pub(super) key: Option<Position>,
    pub(super) started_at: Option<Instant>,
    pub(super) last_tick: Option<Instant>,
}

impl Voice {
    pub(super) fn new(index: usize) -> Voice {
        Voice {
            id: VoiceId::new(index),
            allocated: false,
            asset: None,
            gain: 0.0,
            pitch: 1.0,
            position: Duration::ZERO,
            state: VoiceState::Idle,
            fade: None,
            key: None,
            started_at: None,
            last_tick: None,
        }
    }

    /// Returns to the pristine idle state.
    pub(super) fn reset(&mut self) {
        self.allocated = false;
        self.asset = None;
        self.gain = 0.0;
        self.pitch = 1.0;
        self.position = Duration::ZERO;
        self.state = VoiceState::Idle;
        self.fade = None;
        self.key = None;
        self.started_at = None;
        self.last_tick = None;
    }

    /// Advances the playback position to `now`, scaled by the playback rate.
    pub(super) fn advance(&mut self, now: Instant) {
        if let Some(last) = self.last_tick {
            let elapsed = now.saturating_duration_since(last);
            self.position += elapsed.mul_f64(self.pitch);
        }
        self.last_tick = Some(now);
    }

    /// Returns the voice's slot.
    pub fn id(&self) -> VoiceId {
        self.id
    }

    /// Returns the asset being played, if any.
    pub fn asset(&self) -> Option<&Asset> {
        self.asset.as_ref()
    }

    /// Returns the current gain, including any fade.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Returns the playback rate.
    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Returns the playback position within the asset as of the last tick.
    pub fn position(&self) -> Duration {
        self.position
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Returns the running fade, if the voice is fading out.
    pub fn fade(&self) -> Option<&Fade> {
        self.fade.as_ref()
    }

    /// Returns the note the voice is bound to.
    pub fn key(&self) -> Option<Position> {
        self.key
    }

    /// Returns when playback started.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Returns true if the voice is producing sound (active or fading).
    pub fn is_sounding(&self) -> bool {
        self.state != VoiceState::Idle
    }
}

impl fmt::Debug for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Voice")
            .field("id", &self.id.0)
            .field("state", &self.state)
            .field("asset", &self.asset.as_ref().map(|a| a.name()))
            .field("gain", &self.gain)
            .field("pitch", &self.pitch)
            .field("key", &self.key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_ramp() {
        let start = Instant::now();
        let fade = Fade::new(0.8, start, Duration::from_millis(400));

        assert_eq!(fade.gain_at(start), 0.8);
        assert!((fade.gain_at(start + Duration::from_millis(100)) - 0.6).abs() < 1e-6);
        assert!((fade.gain_at(start + Duration::from_millis(200)) - 0.4).abs() < 1e-6);
        assert!(!fade.is_complete(start + Duration::from_millis(399)));
        assert!(fade.is_complete(start + Duration::from_millis(400)));
        assert_eq!(fade.gain_at(start + Duration::from_millis(400)), 0.0);
        assert_eq!(fade.gain_at(start + Duration::from_secs(5)), 0.0);
    }

    #[test]
    fn test_zero_length_fade_is_complete() {
        let start = Instant::now();
        let fade = Fade::new(1.0, start, Duration::ZERO);
        assert!(fade.is_complete(start));
        assert_eq!(fade.gain_at(start), 0.0);
    }

    #[test]
    fn test_advance_scales_by_pitch() {
        let start = Instant::now();
        let mut voice = Voice::new(0);
        voice.pitch = 2.0;
        voice.advance(start);
        assert_eq!(voice.position(), Duration::ZERO);

        voice.advance(start + Duration::from_millis(100));
        assert_eq!(voice.position(), Duration::from_millis(200));

        voice.reset();
        assert_eq!(voice.position(), Duration::ZERO);
        assert_eq!(voice.state(), VoiceState::Idle);
        assert!(voice.last_tick.is_none());
    }
}
