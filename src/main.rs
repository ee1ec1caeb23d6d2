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
use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::{crate_version, Parser, Subcommand};
use tokio::time::{sleep, sleep_until, Instant};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use fretwork::config::{self, Tab};
use fretwork::engine::DEFAULT_MAX_FRET;
use fretwork::midi;
use fretwork::samples::{self, Pickup, SampleBank};
use fretwork::scheduler::Scheduler;
use fretwork::tuning::{Tuning, STRING_COUNT};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A sample-based guitar voice engine."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the recorded frets found in a sample directory.
    Samples {
        /// The path to the sample directory.
        path: String,
    },
    /// Shows which recording a position resolves to and how far it is pitch-shifted.
    Resolve {
        /// The path to the sample directory.
        path: String,
        /// The string, 1 (highest) through 6 (lowest).
        string: u8,
        /// The fret.
        fret: u8,
        /// The pickup to resolve against.
        #[arg(short, long, default_value = "neck")]
        pickup: Pickup,
        /// Don't fall back to other pickups.
        #[arg(long)]
        no_fallback: bool,
    },
    /// Plays live MIDI read from stdin, one message per line as hex bytes (e.g. "90 28 64").
    Midi {
        /// The path to the instrument config.
        instrument_path: String,
    },
    /// Plays a tab through an instrument.
    Play {
        /// The path to the instrument config.
        instrument_path: String,
        /// The path to the tab.
        tab_path: String,
    },
}

fn load_bank(path: &str) -> Result<SampleBank, Box<dyn Error>> {
    let assets = samples::scan(&PathBuf::from(path))?;
    Ok(SampleBank::load(
        assets,
        Tuning::standard(),
        DEFAULT_MAX_FRET,
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Samples { path } => {
            let bank = load_bank(&path)?;

            if bank.is_empty() {
                println!("No samples found in {}.", path.as_str());
                return Ok(());
            }

            println!("Samples (count: {}):", bank.len());
            for pickup in Pickup::ALL {
                println!("{}:", pickup);
                for string in 1..=STRING_COUNT {
                    let frets = bank.recorded_frets(pickup, string);
                    if frets.is_empty() {
                        println!("  string {}: none", string);
                    } else {
                        let frets: Vec<String> = frets.iter().map(u8::to_string).collect();
                        println!("  string {}: frets {}", string, frets.join(", "));
                    }
                }
            }

            let missing = bank.missing_strings();
            if !missing.is_empty() {
                println!("\nStrings with no samples on any pickup: {:?}", missing);
            }
        }
        Commands::Resolve {
            path,
            string,
            fret,
            pickup,
            no_fallback,
        } => {
            let bank = load_bank(&path)?;
            let midi = bank.tuning().pitch(string, fret)?;
            let resolution = if no_fallback {
                bank.resolve(string, fret, pickup)?
            } else {
                bank.resolve_with_fallback(string, fret, pickup)?
            };

            let sample = resolution.sample();
            println!(
                "string {} fret {} (MIDI {}) on the {} pickup:",
                string, fret, midi, pickup
            );
            println!("- sample: {}", sample.asset());
            println!(
                "- recorded at fret {} on the {} pickup",
                resolution.base_fret(),
                sample.pickup()
            );
            if resolution.is_exact() {
                println!("- exact match");
            } else {
                println!("- pitch multiplier: {:.4}", resolution.pitch_multiplier());
            }
        }
        Commands::Midi { instrument_path } => {
            let (instrument, engine) = config::init_engine(&PathBuf::from(&instrument_path))?;
            let tuning = *engine.bank().tuning();
            let max_fret = instrument.max_fret();
            let scheduler = Scheduler::start(engine, instrument.tick_interval()?)?;
            let handle = scheduler.handle();

            let received = tokio::task::spawn_blocking(move || -> Result<usize, String> {
                let mut received = 0;
                for line in io::stdin().lines() {
                    let line = line.map_err(|e| e.to_string())?;
                    let raw = match midi::parse_hex(&line) {
                        Ok(raw) => raw,
                        Err(e) => {
                            warn!(line = %line, err = %e, "Ignoring malformed MIDI line.");
                            continue;
                        }
                    };
                    if let Some(command) = midi::translate(&raw, &tuning, max_fret) {
                        handle.send(command).map_err(|e| e.to_string())?;
                        received += 1;
                    }
                }
                Ok(received)
            })
            .await??;

            let engine = scheduler.shutdown()?;
            println!(
                "Applied {} MIDI commands ({} voices still sounding).",
                received,
                engine.active_voices()
            );
        }
        Commands::Play {
            instrument_path,
            tab_path,
        } => {
            let (instrument, engine) = config::init_engine(&PathBuf::from(&instrument_path))?;
            let tab = Tab::deserialize(&PathBuf::from(&tab_path))?;
            let schedule = tab.schedule()?;

            let scheduler = Scheduler::start(engine, instrument.tick_interval()?)?;
            let handle = scheduler.handle();

            let start = Instant::now();
            for (at, command) in schedule {
                sleep_until(start + at).await;
                handle.send(command)?;
            }

            // Let the last notes ring out before stopping.
            sleep(instrument.release_time()?).await;
            handle.stop_all(false)?;
            sleep(instrument.release_time()? + instrument.tick_interval()? * 2).await;

            let engine = scheduler.shutdown()?;
            println!(
                "Played {} notes in {:.2}s ({} voices still sounding).",
                tab.notes().len(),
                start.elapsed().as_secs_f64(),
                engine.active_voices()
            );
        }
    }

    Ok(())
}
