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
use std::{
    collections::HashMap,
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::Mutex;
use tracing::debug;

use crate::samples::Asset;

/// What the mock device knows about a voice slot.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotState {
    pub asset: Asset,
    pub gain: f32,
    pub pitch: f64,
    pub playing: bool,
    pub finished: bool,
}

/// A mock device. Doesn't actually play anything, but remembers what it was told.
pub struct Device {
    name: String,
    slots: Mutex<HashMap<usize, SlotState>>,
    plays: AtomicUsize,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            slots: Mutex::new(HashMap::new()),
            plays: AtomicUsize::new(0),
        }
    }

    /// Returns the state of a slot, if it was ever played.
    pub fn slot(&self, slot: usize) -> Option<SlotState> {
        self.slots.lock().get(&slot).cloned()
    }

    /// Marks the asset in a slot as having played to its end.
    pub fn finish(&self, slot: usize) {
        if let Some(state) = self.slots.lock().get_mut(&slot) {
            state.finished = true;
        }
    }

    /// Returns how many times play was called.
    pub fn play_count(&self) -> usize {
        self.plays.load(Ordering::Relaxed)
    }

    /// Returns how many slots are currently playing.
    pub fn playing_count(&self) -> usize {
        self.slots.lock().values().filter(|s| s.playing).count()
    }
}

impl super::Device for Device {
    fn play(&self, slot: usize, asset: &Asset, gain: f32, pitch: f64) {
        self.plays.fetch_add(1, Ordering::Relaxed);
        debug!(
            device = self.name,
            slot,
            asset = asset.name(),
            gain,
            pitch,
            "Playing asset."
        );
        self.slots.lock().insert(
            slot,
            SlotState {
                asset: asset.clone(),
                gain,
                pitch,
                playing: true,
                finished: false,
            },
        );
    }

    fn set_gain(&self, slot: usize, gain: f32) {
        if let Some(state) = self.slots.lock().get_mut(&slot) {
            state.gain = gain;
        }
    }

    fn stop(&self, slot: usize) {
        if let Some(state) = self.slots.lock().get_mut(&slot) {
            if state.playing {
                debug!(device = self.name, slot, "Stopping slot.");
            }
            state.playing = false;
        }
    }

    fn is_finished(&self, slot: usize) -> bool {
        self.slots.lock().get(&slot).is_some_and(|s| s.finished)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}
