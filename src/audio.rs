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
use std::{error::Error, fmt, sync::Arc};

use crate::samples::Asset;

pub mod mock;

/// A playback device renders voices. The engine only ever tells it which asset to play in
/// which voice slot, at what gain and playback rate; mixing and effects are the device's job.
pub trait Device: fmt::Display + Send + Sync {
    /// Starts playing the asset from the beginning in the given voice slot.
    fn play(&self, slot: usize, asset: &Asset, gain: f32, pitch: f64);

    /// Changes the gain of a playing slot without restarting it.
    fn set_gain(&self, slot: usize, gain: f32);

    /// Stops the slot.
    fn stop(&self, slot: usize);

    /// Returns true if the asset in the slot has played to its end.
    fn is_finished(&self, slot: usize) -> bool;
}

/// Gets a device with the given name.
pub fn get_device(name: &str) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(name)));
    }

    Err(format!(
        "no playback device named '{}' (only mock devices are built in)",
        name
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_device() {
        let device = get_device("mock-output").unwrap();
        assert_eq!(device.to_string(), "mock-output (Mock)");
        assert!(get_device("hw:0").is_err());
    }
}
