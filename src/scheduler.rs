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

//! Runs a [`NoteEngine`] on its own thread.
//!
//! The engine is not thread safe, so it is owned by a single scheduler thread. Other threads
//! talk to it through an [`EngineHandle`], which stamps each command and queues it. Commands are
//! applied in the order they were sent, and fades are stepped on a fixed tick between them.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use tracing::{debug, error, info, span, Level};

use crate::engine::{Command, NoteEngine, NoteEvent};
use crate::gate::Connection;
use crate::samples::Pickup;
use crate::tuning::Position;

/// Default interval between fade steps.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// How many commands can be queued before senders block.
const COMMAND_QUEUE_DEPTH: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("the scheduler is not running")]
    Closed,
    #[error("unable to start the scheduler thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("the scheduler thread panicked")]
    Panicked,
}

/// A cheap, clonable way to send commands to a running engine.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    commands: Sender<NoteEvent>,
}

impl EngineHandle {
    /// Queues a command, stamped with the current time.
    pub fn send(&self, command: Command) -> Result<(), SchedulerError> {
        self.commands
            .send(NoteEvent::now(command))
            .map_err(|_| SchedulerError::Closed)
    }

    pub fn note_on(&self, position: Position) -> Result<(), SchedulerError> {
        self.send(Command::NoteOn(position))
    }

    pub fn note_off(&self, position: Position, immediate: bool) -> Result<(), SchedulerError> {
        self.send(Command::NoteOff {
            position,
            immediate,
        })
    }

    pub fn set_pickup(&self, pickup: Pickup) -> Result<(), SchedulerError> {
        self.send(Command::SetPickup(pickup))
    }

    pub fn stop_all(&self, immediate: bool) -> Result<(), SchedulerError> {
        self.send(Command::StopAll { immediate })
    }

    pub fn set_connection(
        &self,
        connection: Connection,
        connected: bool,
    ) -> Result<(), SchedulerError> {
        self.send(Command::SetConnection {
            connection,
            connected,
        })
    }
}

/// Owns the scheduler thread.
pub struct Scheduler {
    handle: EngineHandle,
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<NoteEngine>>,
}

impl Scheduler {
    /// Moves the engine onto a new thread and starts processing commands.
    pub fn start(engine: NoteEngine, tick_interval: Duration) -> Result<Scheduler, SchedulerError> {
        let (commands_tx, commands_rx) = bounded(COMMAND_QUEUE_DEPTH);
        let (stop_tx, stop_rx) = bounded(1);

        let thread = thread::Builder::new()
            .name("note-scheduler".to_string())
            .spawn(move || Scheduler::run(engine, commands_rx, stop_rx, tick_interval))?;

        Ok(Scheduler {
            handle: EngineHandle {
                commands: commands_tx,
            },
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// Returns a handle for sending commands.
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Stops the scheduler and hands the engine back. Commands queued before the call are
    /// applied first.
    pub fn shutdown(mut self) -> Result<NoteEngine, SchedulerError> {
        self.stop_and_join().ok_or(SchedulerError::Panicked)
    }

    fn stop_and_join(&mut self) -> Option<NoteEngine> {
        // Dropping the stop sender wakes the thread.
        self.stop.take();
        let thread = self.thread.take()?;
        match thread.join() {
            Ok(engine) => Some(engine),
            Err(_) => {
                error!("Note scheduler thread panicked");
                None
            }
        }
    }

    fn run(
        mut engine: NoteEngine,
        commands: Receiver<NoteEvent>,
        stop: Receiver<()>,
        tick_interval: Duration,
    ) -> NoteEngine {
        let span = span!(Level::INFO, "note scheduler");
        let _enter = span.enter();

        let ticker = tick(tick_interval);
        info!(
            tick_ms = tick_interval.as_millis(),
            "Note scheduler started."
        );

        loop {
            select! {
                recv(commands) -> event => match event {
                    Ok(event) => Scheduler::apply(&mut engine, event),
                    Err(_) => break,
                },
                recv(ticker) -> now => {
                    if let Ok(now) = now {
                        engine.tick(now);
                    }
                },
                recv(stop) -> _ => break,
            }
        }

        for event in commands.try_iter() {
            Scheduler::apply(&mut engine, event);
        }
        info!("Note scheduler stopped.");
        engine
    }

    fn apply(engine: &mut NoteEngine, event: NoteEvent) {
        if let Err(e) = engine.apply(event.command, event.timestamp) {
            debug!(err = %e, command = ?event.command, "Command dropped.");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineSettings, NoteState};
    use crate::testutil::{engine_with, eventually};

    #[test]
    fn test_commands_reach_engine() {
        let settings = EngineSettings {
            release_time: Duration::from_millis(20),
            ..Default::default()
        };
        let (engine, device) = engine_with(settings, &["n1_0", "n2_0"]);
        let scheduler = Scheduler::start(engine, Duration::from_millis(5)).unwrap();
        let handle = scheduler.handle();

        handle.note_on(Position::new(1, 0)).unwrap();
        handle.note_on(Position::new(2, 0)).unwrap();
        eventually(|| device.playing_count() == 2, "Notes never started");

        // The tick finishes the fade without any further commands.
        handle.note_off(Position::new(1, 0), false).unwrap();
        eventually(|| device.playing_count() == 1, "Fade never completed");

        let engine = scheduler.shutdown().unwrap();
        assert_eq!(engine.state(Position::new(1, 0)), NoteState::Silent);
        assert_eq!(engine.state(Position::new(2, 0)), NoteState::Sounding);
    }

    #[test]
    fn test_commands_apply_in_order() {
        let (engine, _) = engine_with(EngineSettings::default(), &["n1_0", "m1_0"]);
        let scheduler = Scheduler::start(engine, DEFAULT_TICK_INTERVAL).unwrap();
        let handle = scheduler.handle();

        let position = Position::new(1, 0);
        handle.note_on(position).unwrap();
        handle.note_off(position, true).unwrap();
        handle.set_pickup(Pickup::Middle).unwrap();
        handle.note_on(position).unwrap();

        let engine = scheduler.shutdown().unwrap();
        assert_eq!(engine.pickup(), Pickup::Middle);
        assert_eq!(engine.state(position), NoteState::Sounding);
        assert_eq!(
            engine.voice_for(position).unwrap().asset().unwrap().name(),
            "m1_0"
        );
    }

    #[test]
    fn test_handle_after_shutdown() {
        let (engine, _) = engine_with(EngineSettings::default(), &["n1_0"]);
        let scheduler = Scheduler::start(engine, DEFAULT_TICK_INTERVAL).unwrap();
        let handle = scheduler.handle();
        let engine = scheduler.shutdown().unwrap();
        drop(engine);

        assert!(matches!(
            handle.stop_all(true),
            Err(SchedulerError::Closed)
        ));
    }

    #[test]
    fn test_connection_changes() {
        let (engine, _) = engine_with(EngineSettings::default(), &["n1_0"]);
        let scheduler = Scheduler::start(engine, DEFAULT_TICK_INTERVAL).unwrap();
        let handle = scheduler.handle();

        handle.set_connection(Connection::Amplifier, false).unwrap();
        let engine = scheduler.shutdown().unwrap();
        assert!(!engine.gate().is_enabled());
        assert!(!engine.gate().is_connected(Connection::Amplifier));
    }
}
