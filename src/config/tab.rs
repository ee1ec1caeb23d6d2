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
use std::path::Path;
use std::time::Duration;

use config::{Config, File};
use serde::Deserialize;

use super::error::ConfigError;
use super::instrument::parse_duration;
use crate::engine::Command;
use crate::samples::Pickup;
use crate::tuning::{Position, Tuning};

/// A YAML representation of a tab: a timed list of notes to play.
#[derive(Deserialize, Clone, Debug)]
pub struct Tab {
    /// The pickup to select before the first note.
    pickup: Option<Pickup>,

    notes: Vec<TabNote>,
}

/// A single note in a tab.
#[derive(Deserialize, Clone, Debug)]
pub struct TabNote {
    /// When the note starts, relative to the start of the tab.
    at: String,
    string: u8,
    fret: u8,
    /// How long the note is held. Notes without a length ring until the end of the tab.
    length: Option<String>,
}

impl TabNote {
    pub fn position(&self) -> Position {
        Position::new(self.string, self.fret)
    }
}

impl Tab {
    /// Parse a tab from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Tab, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Tab>()?)
    }

    pub fn pickup(&self) -> Option<Pickup> {
        self.pickup
    }

    pub fn notes(&self) -> &[TabNote] {
        &self.notes
    }

    /// Flattens the tab into commands ordered by time. A note's release is dropped when the
    /// same position is struck again before the release is due, so a held note never cuts off
    /// the note that retriggered it. At equal times, note-offs come before note-ons.
    pub fn schedule(&self) -> Result<Vec<(Duration, Command)>, ConfigError> {
        let mut timed = Vec::with_capacity(self.notes.len());
        for note in &self.notes {
            if !Tuning::is_valid_string(note.string) {
                return Err(ConfigError::Invalid(format!(
                    "tab note at {} is on string {}, which is not on the instrument",
                    note.at, note.string
                )));
            }

            let at = parse_duration("at", Some(&note.at), Duration::ZERO)?;
            let off = note
                .length
                .as_ref()
                .map(|length| parse_duration("length", Some(length), Duration::ZERO))
                .transpose()?
                .map(|length| at + length);
            timed.push((note.position(), at, off));
        }

        let mut commands = Vec::with_capacity(timed.len() * 2 + 1);
        if let Some(pickup) = self.pickup {
            commands.push((Duration::ZERO, Command::SetPickup(pickup)));
        }

        for (index, &(position, at, off)) in timed.iter().enumerate() {
            commands.push((at, Command::NoteOn(position)));

            let Some(off) = off else {
                continue;
            };
            let retriggered = timed.iter().enumerate().any(|(other, &(p, other_at, _))| {
                other != index
                    && p == position
                    && (other_at > at || (other_at == at && other > index))
                    && other_at <= off
            });
            if !retriggered {
                commands.push((
                    off,
                    Command::NoteOff {
                        position,
                        immediate: false,
                    },
                ));
            }
        }

        commands.sort_by_key(|(at, command)| (*at, order(command)));
        Ok(commands)
    }
}

fn order(command: &Command) -> u8 {
    match command {
        Command::SetPickup(_) => 0,
        Command::NoteOff { .. } | Command::StopAll { .. } => 1,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use config::{Config, File, FileFormat};

    use super::*;
    use crate::engine::{EngineSettings, NoteState};
    use crate::testutil::engine_with;

    fn parse(yaml: &str) -> Tab {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_schedule() {
        let tab = parse(
            r#"
            pickup: middle
            notes:
              - { at: 500ms, string: 5, fret: 2, length: 1s }
              - { at: 0s, string: 6, fret: 0, length: 250ms }
              - { at: 500ms, string: 6, fret: 0 }
            "#,
        );

        assert_eq!(tab.pickup(), Some(Pickup::Middle));
        assert_eq!(tab.notes().len(), 3);

        let ms = Duration::from_millis;
        assert_eq!(
            tab.schedule().unwrap(),
            vec![
                (ms(0), Command::SetPickup(Pickup::Middle)),
                (ms(0), Command::NoteOn(Position::new(6, 0))),
                (
                    ms(250),
                    Command::NoteOff {
                        position: Position::new(6, 0),
                        immediate: false
                    }
                ),
                (ms(500), Command::NoteOn(Position::new(5, 2))),
                (ms(500), Command::NoteOn(Position::new(6, 0))),
                (
                    ms(1500),
                    Command::NoteOff {
                        position: Position::new(5, 2),
                        immediate: false
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_retriggered_note_keeps_ringing() {
        let tab = parse(
            r#"
            notes:
              - { at: 0s, string: 6, fret: 0, length: 1s }
              - { at: 500ms, string: 6, fret: 0, length: 2s }
            "#,
        );

        let position = Position::new(6, 0);
        let schedule = tab.schedule().unwrap();
        assert_eq!(
            schedule,
            vec![
                (Duration::ZERO, Command::NoteOn(position)),
                (Duration::from_millis(500), Command::NoteOn(position)),
                (
                    Duration::from_millis(2500),
                    Command::NoteOff {
                        position,
                        immediate: false
                    }
                ),
            ]
        );

        let (mut engine, _) = engine_with(EngineSettings::default(), &["n6_0"]);
        let start = Instant::now();
        let mut events = schedule.into_iter().peekable();
        for elapsed in [500, 1000, 2000, 2500] {
            let now = start + Duration::from_millis(elapsed);
            while let Some((at, command)) = events.next_if(|(at, _)| start + *at <= now) {
                engine.apply(command, start + at).unwrap();
            }
            engine.tick(now);
            if elapsed < 2500 {
                assert_eq!(engine.state(position), NoteState::Sounding);
            }
        }
        assert_eq!(engine.state(position), NoteState::FadingOut);
    }

    #[test]
    fn test_invalid_notes() {
        let tab = parse("notes: [{ at: 0s, string: 7, fret: 0 }]");
        assert!(matches!(tab.schedule(), Err(ConfigError::Invalid(_))));

        let tab = parse("notes: [{ at: later, string: 1, fret: 0 }]");
        assert!(matches!(
            tab.schedule(),
            Err(ConfigError::InvalidDuration { field: "at", .. })
        ));
    }

    #[test]
    fn test_deserialize_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("riff.yaml");
        std::fs::write(&path, "notes:\n  - { at: 0s, string: 1, fret: 3 }\n").unwrap();

        let tab = Tab::deserialize(&path).unwrap();
        assert_eq!(tab.pickup(), None);
        assert_eq!(tab.notes()[0].position(), Position::new(1, 3));
    }
}
