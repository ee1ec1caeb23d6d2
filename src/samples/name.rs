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

//! Sample naming convention.
//!
//! Every recorded sample carries a tag of the form `<pickup><string>_<fret>`, where the pickup
//! is one of `n` (neck), `m` (middle) or `b` (bridge), the string is 1 through 6 and the fret
//! is a decimal number. The tag may appear anywhere in the name (`clean_n3_7` is valid); the
//! first occurrence wins and matching is case-insensitive.

use super::error::NameError;
use super::Pickup;

/// The parsed components of a sample name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleName {
    pub pickup: Pickup,
    pub string: u8,
    pub fret: u8,
}

/// Parses a sample name into its pickup, string and recorded fret.
pub fn parse(name: &str) -> Result<SampleName, NameError> {
    let lowered = name.to_ascii_lowercase();
    let bytes = lowered.as_bytes();

    for start in 0..bytes.len() {
        let Some((pickup, string, digits)) = match_tag(&bytes[start..]) else {
            continue;
        };

        let fret_str = &lowered[start + 3..start + 3 + digits];
        let fret = fret_str
            .parse::<u8>()
            .map_err(|_| NameError::FretOutOfRange {
                name: name.to_string(),
                fret: fret_str.to_string(),
            })?;

        return Ok(SampleName {
            pickup,
            string,
            fret,
        });
    }

    Err(NameError::NoTag(name.to_string()))
}

/// Matches a tag at the start of the slice, returning the pickup, string and the number of
/// fret digits that follow the underscore.
fn match_tag(bytes: &[u8]) -> Option<(Pickup, u8, usize)> {
    let pickup = Pickup::from_tag(*bytes.first()? as char)?;
    let string = match *bytes.get(1)? {
        b @ b'1'..=b'6' => b - b'0',
        _ => return None,
    };
    if *bytes.get(2)? != b'_' {
        return None;
    }
    let digits = bytes[3..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    Some((pickup, string, digits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_names() {
        assert_eq!(
            parse("n3_7"),
            Ok(SampleName {
                pickup: Pickup::Neck,
                string: 3,
                fret: 7
            })
        );
        assert_eq!(
            parse("B6_21"),
            Ok(SampleName {
                pickup: Pickup::Bridge,
                string: 6,
                fret: 21
            })
        );
    }

    #[test]
    fn test_parse_embedded_tag() {
        let parsed = parse("Clean_M1_0_take2").unwrap();
        assert_eq!(parsed.pickup, Pickup::Middle);
        assert_eq!(parsed.string, 1);
        assert_eq!(parsed.fret, 0);

        // A false start is skipped over.
        let parsed = parse("bn2_14").unwrap();
        assert_eq!(parsed.pickup, Pickup::Neck);
        assert_eq!(parsed.string, 2);
        assert_eq!(parsed.fret, 14);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(parse("n7_3"), Err(NameError::NoTag(_))));
        assert!(matches!(parse("x3_3"), Err(NameError::NoTag(_))));
        assert!(matches!(parse("n3-3"), Err(NameError::NoTag(_))));
        assert!(matches!(parse("n3_"), Err(NameError::NoTag(_))));
        assert!(matches!(parse(""), Err(NameError::NoTag(_))));
        assert!(matches!(
            parse("n3_999"),
            Err(NameError::FretOutOfRange { .. })
        ));
    }
}
