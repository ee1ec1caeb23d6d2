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
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A pickup position. Each pickup has its own set of recorded samples with a distinct timbre.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Pickup {
    /// The neck pickup.
    #[default]
    Neck,
    /// The middle pickup.
    Middle,
    /// The bridge pickup.
    Bridge,
}

impl Pickup {
    /// All pickups, in fallback order.
    pub const ALL: [Pickup; 3] = [Pickup::Neck, Pickup::Middle, Pickup::Bridge];

    /// Returns the pickup for a sample name tag.
    pub fn from_tag(tag: char) -> Option<Pickup> {
        match tag {
            'n' => Some(Pickup::Neck),
            'm' => Some(Pickup::Middle),
            'b' => Some(Pickup::Bridge),
            _ => None,
        }
    }

    /// Returns the tag used in sample names.
    pub fn tag(&self) -> char {
        match self {
            Pickup::Neck => 'n',
            Pickup::Middle => 'm',
            Pickup::Bridge => 'b',
        }
    }

    /// Index into per-pickup tables.
    pub(crate) fn index(&self) -> usize {
        match self {
            Pickup::Neck => 0,
            Pickup::Middle => 1,
            Pickup::Bridge => 2,
        }
    }
}

impl fmt::Display for Pickup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pickup::Neck => "neck",
            Pickup::Middle => "middle",
            Pickup::Bridge => "bridge",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Pickup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neck" | "n" => Ok(Pickup::Neck),
            "middle" | "m" => Ok(Pickup::Middle),
            "bridge" | "b" => Ok(Pickup::Bridge),
            _ => Err(format!("unknown pickup '{}' (expected neck, middle or bridge)", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        for pickup in Pickup::ALL {
            assert_eq!(Pickup::from_tag(pickup.tag()), Some(pickup));
        }
        assert_eq!(Pickup::from_tag('x'), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Neck".parse::<Pickup>(), Ok(Pickup::Neck));
        assert_eq!(" bridge ".parse::<Pickup>(), Ok(Pickup::Bridge));
        assert_eq!("m".parse::<Pickup>(), Ok(Pickup::Middle));
        assert!("tremolo".parse::<Pickup>().is_err());
    }
}
