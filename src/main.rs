//! Battle Keys terminal entry point
//!
//! Usage: `battle-keys [PHRASE_FILE] [SETTINGS_JSON] [--seed N]`
//!
//! Every character typed on stdin is fed to the game as a keystroke. A line
//! reading `:quit` ends the game and `:restart` starts it over. The summary
//! is printed as JSON on exit.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{SyncSender, TrySendError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;

use battle_keys::phrases::load_phrases;
use battle_keys::{GameEvent, GameRunner, RunOutcome, Settings, SystemClock};

const QUIT_COMMAND: &str = ":quit";
const RESTART_COMMAND: &str = ":restart";
const STATUS_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Parser, Debug)]
#[command(name = "battle-keys")]
#[command(about = "Real-time typing shooter: type the engine words to destroy torpedo chains")]
struct Args {
    /// Phrase list, one wave per line (overrides the settings file)
    phrase_file: Option<PathBuf>,
    /// Settings JSON; written with defaults if it does not exist
    settings: Option<PathBuf>,
    /// Fixed RNG seed (overrides the settings file)
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn settings(&self) -> Settings {
        let mut settings = match &self.settings {
            Some(path) => Settings::load_or_create(path),
            None => Settings::default(),
        };
        if let Some(seed) = self.seed {
            settings.seed = Some(seed);
        }
        if let Some(path) = &self.phrase_file {
            settings.phrase_file = path.clone();
        }
        settings
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::init();
    log::info!("Battle Keys starting...");

    let settings = args.settings();
    let phrases = load_phrases(&settings.phrase_file);

    let runner = GameRunner::start(&settings, phrases, Arc::new(SystemClock::new()))
        .context("failed to start the tick thread")?;

    let sender = runner.event_sender();
    thread::Builder::new()
        .name("battle-keys-stdin".into())
        .spawn(move || forward_stdin(sender))
        .context("failed to start the input thread")?;

    let mut last_status = String::new();
    while !runner.is_finished() {
        thread::sleep(STATUS_INTERVAL);
        if let Some(frame) = runner.latest_snapshot() {
            let status = format!(
                "wave {} | health {} | points {} | combo \"{}\" | typed \"{}\"",
                frame.wave_number,
                frame.home.health,
                frame.points,
                frame.combo.trim_end(),
                frame.active_input,
            );
            if status != last_status {
                eprintln!("{status}");
                last_status = status;
            }
        }
    }

    match runner.join() {
        RunOutcome::Summary(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        RunOutcome::Quit => {
            log::info!("Quit before the end of the game");
            Ok(())
        }
        RunOutcome::Halted(reason) => bail!("game halted: {reason}"),
    }
}

fn forward_stdin(sender: SyncSender<GameEvent>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        match line.trim() {
            QUIT_COMMAND => {
                let _ = sender.send(GameEvent::Quit);
                return;
            }
            RESTART_COMMAND => {
                if sender.send(GameEvent::Restart).is_err() {
                    return;
                }
                continue;
            }
            _ => {}
        }
        for ch in line.chars() {
            match sender.try_send(GameEvent::Key(ch)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => log::warn!("Input queue full, dropping {ch:?}"),
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}
