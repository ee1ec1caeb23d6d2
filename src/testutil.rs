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
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::audio::mock;
use crate::engine::{EngineSettings, NoteEngine};
use crate::samples::{Asset, SampleBank};
use crate::tuning::Tuning;

/// Builds a bank of in-memory assets from sample names, using standard tuning.
pub fn bank_from_names(names: &[&str]) -> SampleBank {
    SampleBank::load(
        names.iter().map(|name| Asset::named(name)),
        Tuning::standard(),
        22,
    )
}

/// Builds an engine over a mock device.
pub fn engine_with(settings: EngineSettings, names: &[&str]) -> (NoteEngine, Arc<mock::Device>) {
    let device = Arc::new(mock::Device::get("mock-engine"));
    let engine = NoteEngine::new(settings, Arc::new(bank_from_names(names)), device.clone());
    (engine, device)
}

/// Wait for the given predicate to return true or fail.
#[inline]
pub fn eventually<F>(predicate: F, error_msg: &str)
where
    F: Fn() -> bool,
{
    let start = Instant::now();
    let tick = Duration::from_millis(10);
    let timeout = Duration::from_secs(3);

    loop {
        if start.elapsed() > timeout {
            panic!("{}", error_msg);
        }
        if predicate() {
            return;
        }
        thread::sleep(tick);
    }
}
