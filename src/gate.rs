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

//! The connection gate: a uniform attenuation applied while the instrument is unplugged.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Default attenuation while disconnected, in decibels.
pub const DEFAULT_DISCONNECTED_GAIN_DB: f32 = -70.0;

/// A cable that must be plugged in for the instrument to be heard.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Connection {
    /// The cable between the guitar and the amplifier.
    Guitar,
    /// The amplifier's own output.
    Amplifier,
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connection::Guitar => write!(f, "guitar"),
            Connection::Amplifier => write!(f, "amplifier"),
        }
    }
}

/// Emitted when the gate opens or closes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateChange {
    /// Whether the gate is now open.
    pub enabled: bool,
    /// The new gain scalar.
    pub gain: f32,
}

/// Converts decibels to a linear gain.
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Tracks the connection state and derives the gate gain from it.
#[derive(Clone, Debug)]
pub struct ConnectionGate {
    guitar: bool,
    amplifier: bool,
    disconnected_gain: f32,
}

impl ConnectionGate {
    /// Creates a gate. `disconnected_gain_db` must be finite so that the gate never hard-mutes.
    pub fn new(connected: bool, disconnected_gain_db: f32) -> ConnectionGate {
        ConnectionGate {
            guitar: connected,
            amplifier: connected,
            disconnected_gain: db_to_gain(disconnected_gain_db).max(f32::MIN_POSITIVE),
        }
    }

    /// Returns true if every connection is made.
    pub fn is_enabled(&self) -> bool {
        self.guitar && self.amplifier
    }

    /// Returns true if the given connection is made.
    pub fn is_connected(&self, connection: Connection) -> bool {
        match connection {
            Connection::Guitar => self.guitar,
            Connection::Amplifier => self.amplifier,
        }
    }

    /// Returns the gain scalar: unity when enabled, a small non-zero attenuation otherwise.
    pub fn gate(&self) -> f32 {
        if self.is_enabled() {
            1.0
        } else {
            self.disconnected_gain
        }
    }

    /// Updates a connection. Returns the change if the gate opened or closed as a result.
    pub fn set(&mut self, connection: Connection, connected: bool) -> Option<GateChange> {
        let was_enabled = self.is_enabled();
        match connection {
            Connection::Guitar => self.guitar = connected,
            Connection::Amplifier => self.amplifier = connected,
        }

        let enabled = self.is_enabled();
        if enabled == was_enabled {
            return None;
        }

        info!(%connection, connected, enabled, "Connection gate changed");
        Some(GateChange {
            enabled,
            gain: self.gate(),
        })
    }
}

impl Default for ConnectionGate {
    fn default() -> Self {
        ConnectionGate::new(true, DEFAULT_DISCONNECTED_GAIN_DB)
    }
}
