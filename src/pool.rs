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

//! Fixed-capacity voice pool.
//!
//! All voices, the free list and the active-notes table are allocated up front, so acquiring,
//! starting and releasing voices never allocates. The pool is not thread safe on its own; it is
//! owned by the note engine and only touched from one scheduling domain.

mod voice;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::audio::Device;
use crate::samples::Asset;
use crate::tuning::Position;

pub use voice::{Fade, Voice, VoiceId, VoiceState};

/// What a sweep did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sweep {
    /// Voices whose fade-out completed and were returned to the pool.
    pub faded: usize,
    /// Voices whose asset played to its end and were returned to the pool.
    pub finished: usize,
}

/// Manages a fixed set of voices and the notes bound to them.
pub struct VoicePool {
    voices: Vec<Voice>,
    /// Free voices. Popped from the back.
    idle: Vec<VoiceId>,
    /// The active-notes table.
    active: HashMap<Position, VoiceId>,
    device: Arc<dyn Device>,
}

impl VoicePool {
    /// Creates a pool with `capacity` idle voices.
    pub fn new(capacity: usize, device: Arc<dyn Device>) -> Self {
        let voices: Vec<Voice> = (0..capacity).map(Voice::new).collect();
        // Reverse so that voice 0 is handed out first.
        let idle: Vec<VoiceId> = voices.iter().rev().map(Voice::id).collect();

        Self {
            voices,
            idle,
            active: HashMap::with_capacity(capacity),
            device,
        }
    }

    /// Takes a voice out of the pool. If no voice is idle, an active voice whose asset already
    /// played to its end is reclaimed. Returns `None` when every voice is busy.
    pub fn acquire(&mut self) -> Option<VoiceId> {
        if self.idle.is_empty() {
            let finished = self
                .voices
                .iter()
                .find(|v| v.state == VoiceState::Active && self.device.is_finished(v.id().index()))
                .map(Voice::id)?;
            debug!(voice = finished.index(), "Reclaiming finished voice");
            self.release(finished);
        }

        let id = self.idle.pop()?;
        self.voices[id.index()].allocated = true;
        Some(id)
    }

    /// Stops a voice and returns it to the pool. Any note bound to it is unbound.
    /// Releasing a voice that is already in the pool does nothing.
    pub fn release(&mut self, id: VoiceId) {
        let Some(voice) = self.voices.get_mut(id.index()) else {
            warn!(voice = id.index(), "Release of unknown voice");
            return;
        };
        if !voice.allocated {
            return;
        }

        self.device.stop(id.index());
        if let Some(key) = voice.key {
            if self.active.get(&key) == Some(&id) {
                self.active.remove(&key);
            }
        }
        voice.reset();
        self.idle.push(id);
    }

    /// Starts playback of an asset on an acquired voice.
    pub fn start(&mut self, id: VoiceId, asset: &Asset, gain: f32, pitch: f64, now: Instant) {
        let voice = &mut self.voices[id.index()];
        voice.asset = Some(asset.clone());
        voice.gain = gain;
        voice.pitch = pitch;
        voice.position = Duration::ZERO;
        voice.state = VoiceState::Active;
        voice.fade = None;
        voice.started_at = Some(now);
        voice.last_tick = Some(now);
        self.device.play(id.index(), asset, gain, pitch);
    }

    /// Binds a note to a voice. A different voice already bound to the same note is released
    /// first, so a note never owns two voices.
    pub fn bind_active(&mut self, key: Position, id: VoiceId) {
        if let Some(previous) = self.active.get(&key).copied() {
            if previous != id {
                warn!(%key, voice = previous.index(), "Note was still bound, releasing old voice");
                self.release(previous);
            }
        }
        self.voices[id.index()].key = Some(key);
        self.active.insert(key, id);
    }

    /// Removes a note from the active-notes table. Unbinding an unbound note is a no-op.
    pub fn unbind(&mut self, key: Position) -> Option<VoiceId> {
        let id = self.active.remove(&key)?;
        self.voices[id.index()].key = None;
        Some(id)
    }

    /// Starts a fade to silence on an active voice. Returns false if the voice is not active,
    /// which includes voices that are already fading.
    pub fn begin_fade(&mut self, id: VoiceId, duration: Duration, now: Instant) -> bool {
        let voice = &mut self.voices[id.index()];
        if voice.state != VoiceState::Active {
            return false;
        }
        voice.advance(now);
        voice.state = VoiceState::FadingOut;
        voice.fade = Some(Fade::new(voice.gain, now, duration));
        true
    }

    /// Sets the full (unfaded) gain of a sounding voice. A fading voice keeps its progress
    /// through the ramp but ramps down from the new level.
    pub fn set_base_gain(&mut self, id: VoiceId, gain: f32) {
        let voice = &mut self.voices[id.index()];
        match voice.state {
            VoiceState::Idle => return,
            VoiceState::Active => voice.gain = gain,
            VoiceState::FadingOut => {
                if let Some(fade) = voice.fade.as_mut() {
                    let remaining = if fade.start_gain() > 0.0 {
                        voice.gain / fade.start_gain()
                    } else {
                        0.0
                    };
                    *fade = Fade::new(gain, fade.started_at(), fade.duration());
                    voice.gain = gain * remaining;
                }
            }
        }
        self.device.set_gain(id.index(), voice.gain);
    }

    /// Recomputes the base gain of every bound, sounding voice from its note. Pitch and playback
    /// position are left alone. Returns the number of voices updated.
    pub fn relevel<F>(&mut self, gain_for: F) -> usize
    where
        F: Fn(Position) -> f32,
    {
        let mut updated = 0;
        for index in 0..self.voices.len() {
            let voice = &self.voices[index];
            let Some(key) = voice.key.filter(|_| voice.is_sounding()) else {
                continue;
            };
            self.set_base_gain(VoiceId::new(index), gain_for(key));
            updated += 1;
        }
        updated
    }

    /// Advances playback positions, steps fades and returns finished voices to the pool.
    pub fn sweep(&mut self, now: Instant) -> Sweep {
        let mut sweep = Sweep::default();

        for index in 0..self.voices.len() {
            let finished = self.device.is_finished(index);
            let voice = &mut self.voices[index];

            match voice.state {
                VoiceState::Idle => continue,
                VoiceState::Active => {
                    voice.advance(now);
                    if finished {
                        sweep.finished += 1;
                        let id = voice.id();
                        self.release(id);
                    }
                }
                VoiceState::FadingOut => {
                    voice.advance(now);
                    let Some(fade) = voice.fade else {
                        let id = voice.id();
                        self.release(id);
                        continue;
                    };

                    voice.gain = fade.gain_at(now);
                    self.device.set_gain(index, voice.gain);

                    if fade.is_complete(now) {
                        sweep.faded += 1;
                        let id = voice.id();
                        self.release(id);
                    } else if finished {
                        sweep.finished += 1;
                        let id = voice.id();
                        self.release(id);
                    }
                }
            }
        }

        sweep
    }

    /// Returns a voice.
    pub fn voice(&self, id: VoiceId) -> &Voice {
        &self.voices[id.index()]
    }

    /// Returns the voice bound to a note, if any.
    pub fn bound(&self, key: Position) -> Option<VoiceId> {
        self.active.get(&key).copied()
    }

    /// Returns the notes currently bound to voices.
    pub fn keys(&self) -> impl Iterator<Item = Position> + '_ {
        self.active.keys().copied()
    }

    /// Returns the voices that are currently sounding.
    pub fn sounding(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter().filter(|v| v.is_sounding())
    }

    /// Returns the number of sounding voices.
    pub fn active_count(&self) -> usize {
        self.sounding().count()
    }

    /// Returns the number of notes in the active-notes table.
    pub fn bound_count(&self) -> usize {
        self.active.len()
    }

    /// Returns the number of voices waiting in the pool.
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Returns the total number of voices.
    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    /// Returns the playback device.
    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }
}

impl fmt::Debug for VoicePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoicePool")
            .field("capacity", &self.voices.len())
            .field("idle", &self.idle.len())
            .field("bound", &self.active.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock;

    fn make_pool(capacity: usize) -> (VoicePool, Arc<mock::Device>) {
        let device = Arc::new(mock::Device::get("mock-pool"));
        (VoicePool::new(capacity, device.clone()), device)
    }

    fn start_note(pool: &mut VoicePool, key: Position, now: Instant) -> VoiceId {
        let id = pool.acquire().unwrap();
        pool.start(id, &Asset::named("n1_0"), 1.0, 1.0, now);
        pool.bind_active(key, id);
        id
    }

    #[test]
    fn test_acquire_until_exhausted() {
        let (mut pool, _) = make_pool(2);
        assert_eq!(pool.acquire().map(|id| id.index()), Some(0));
        assert_eq!(pool.acquire().map(|id| id.index()), Some(1));
        assert_eq!(pool.acquire(), None);
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn test_acquire_reclaims_finished_voice() {
        let now = Instant::now();
        let (mut pool, device) = make_pool(2);
        let first = start_note(&mut pool, Position::new(1, 0), now);
        start_note(&mut pool, Position::new(2, 0), now);
        assert_eq!(pool.acquire(), None);

        device.finish(first.index());
        assert_eq!(pool.acquire(), Some(first));
        // The finished note no longer owns a voice.
        assert_eq!(pool.bound(Position::new(1, 0)), None);
        assert_eq!(pool.bound_count(), 1);
    }

    #[test]
    fn test_release_is_idempotent() {
        let now = Instant::now();
        let (mut pool, device) = make_pool(2);
        let key = Position::new(3, 5);
        let id = start_note(&mut pool, key, now);

        pool.release(id);
        assert_eq!(pool.idle_count(), 2);
        assert_eq!(pool.bound(key), None);
        assert_eq!(pool.voice(id).state(), VoiceState::Idle);
        assert!(!device.slot(id.index()).unwrap().playing);

        pool.release(id);
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn test_release_of_acquired_but_unstarted_voice() {
        let (mut pool, _) = make_pool(1);
        let id = pool.acquire().unwrap();
        pool.release(id);
        assert_eq!(pool.acquire(), Some(id));
    }

    #[test]
    fn test_unbind_is_idempotent() {
        let now = Instant::now();
        let (mut pool, _) = make_pool(2);
        let key = Position::new(4, 2);
        let id = start_note(&mut pool, key, now);

        assert_eq!(pool.unbind(key), Some(id));
        assert_eq!(pool.unbind(key), None);
        assert_eq!(pool.voice(id).key(), None);
        // The voice itself is still allocated until released.
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn test_bind_replaces_previous_voice() {
        let now = Instant::now();
        let (mut pool, _) = make_pool(3);
        let key = Position::new(6, 0);
        let first = start_note(&mut pool, key, now);
        let second = start_note(&mut pool, key, now);

        assert_ne!(first, second);
        assert_eq!(pool.bound(key), Some(second));
        assert_eq!(pool.bound_count(), 1);
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.voice(first).state(), VoiceState::Idle);
    }

    #[test]
    fn test_sweep_completes_fade() {
        let now = Instant::now();
        let (mut pool, device) = make_pool(1);
        let key = Position::new(2, 3);
        let id = start_note(&mut pool, key, now);

        assert!(pool.begin_fade(id, Duration::from_millis(100), now));
        assert!(!pool.begin_fade(id, Duration::from_millis(100), now));

        let sweep = pool.sweep(now + Duration::from_millis(50));
        assert_eq!(sweep, Sweep::default());
        assert!((pool.voice(id).gain() - 0.5).abs() < 1e-6);
        assert!((device.slot(0).unwrap().gain - 0.5).abs() < 1e-6);

        let sweep = pool.sweep(now + Duration::from_millis(110));
        assert_eq!(sweep.faded, 1);
        assert_eq!(pool.voice(id).state(), VoiceState::Idle);
        assert_eq!(pool.bound(key), None);
        assert_eq!(device.slot(0).unwrap().gain, 0.0);
        assert_eq!(pool.idle_count(), 1);
    }

    #[test]
    fn test_sweep_reclaims_finished_voices() {
        let now = Instant::now();
        let (mut pool, device) = make_pool(2);
        let id = start_note(&mut pool, Position::new(1, 1), now);
        start_note(&mut pool, Position::new(1, 2), now);

        device.finish(id.index());
        let sweep = pool.sweep(now + Duration::from_millis(10));
        assert_eq!(sweep.finished, 1);
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.bound(Position::new(1, 1)), None);
    }

    #[test]
    fn test_sweep_advances_position() {
        let now = Instant::now();
        let (mut pool, _) = make_pool(1);
        let id = pool.acquire().unwrap();
        pool.start(id, &Asset::named("n1_0"), 1.0, 0.5, now);

        pool.sweep(now + Duration::from_millis(200));
        assert_eq!(pool.voice(id).position(), Duration::from_millis(100));
    }

    #[test]
    fn test_set_base_gain_keeps_fade_progress() {
        let now = Instant::now();
        let (mut pool, device) = make_pool(1);
        let id = start_note(&mut pool, Position::new(5, 0), now);

        pool.begin_fade(id, Duration::from_millis(100), now);
        pool.sweep(now + Duration::from_millis(50));
        pool.set_base_gain(id, 0.2);

        assert!((pool.voice(id).gain() - 0.1).abs() < 1e-6);
        assert_eq!(pool.voice(id).fade().unwrap().start_gain(), 0.2);
        assert!((device.slot(0).unwrap().gain - 0.1).abs() < 1e-6);

        pool.sweep(now + Duration::from_millis(75));
        assert!((pool.voice(id).gain() - 0.05).abs() < 1e-6);
    }
}
