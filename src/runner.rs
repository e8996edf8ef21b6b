//! Tick thread
//!
//! Runs the simulation at a fixed rate on its own thread. Keystrokes arrive
//! over a bounded channel and are applied at the start of the next tick; the
//! newest frame is kept in shared state for whoever draws it.

use std::io;
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::settings::Settings;
use crate::sim::{GamePhase, GameState, Summary, TickInput, tick};
use crate::snapshot::FrameSnapshot;

/// Input forwarded to the tick thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Key(char),
    /// Tear the game down and start over on the next seed
    Restart,
    Quit,
}

/// How a game ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Summary(Summary),
    Quit,
    Halted(String),
}

type SharedFrame = Arc<Mutex<Option<FrameSnapshot>>>;

pub struct GameRunner {
    events: SyncSender<GameEvent>,
    latest: SharedFrame,
    handle: Option<JoinHandle<RunOutcome>>,
    seed: u64,
}

impl GameRunner {
    /// Start a game on a new thread.
    pub fn start(settings: &Settings, phrases: Vec<String>, clock: Arc<dyn Clock>) -> io::Result<Self> {
        let seed = settings.seed.unwrap_or_else(rand::random);
        let (events, rx) = mpsc::sync_channel(settings.effective_queue_capacity());
        let latest: SharedFrame = Arc::new(Mutex::new(None));

        let game = GameLoop {
            state: GameState::new(phrases.clone(), seed, clock.now_ms()),
            phrases,
            seed,
            rx,
            clock,
            interval: Duration::from_millis(settings.tick_interval_ms()),
        };
        let thread_frame = Arc::clone(&latest);
        let handle = thread::Builder::new()
            .name("battle-keys-tick".into())
            .spawn(move || game.run(&thread_frame))?;

        log::info!("Tick thread started (seed {seed}, {} Hz)", settings.effective_tick_hz());
        Ok(Self { events, latest, handle: Some(handle), seed })
    }

    /// Seed of the first game; each restart moves on to the next one
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Queue a keystroke. Returns false if it was dropped.
    pub fn send_key(&self, ch: char) -> bool {
        match self.events.try_send(GameEvent::Key(ch)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("Input queue full, dropping {ch:?}");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Sender for feeding events from another thread
    pub fn event_sender(&self) -> SyncSender<GameEvent> {
        self.events.clone()
    }

    /// Start over on the same phrases with the next seed.
    pub fn restart(&self) {
        let _ = self.events.send(GameEvent::Restart);
    }

    pub fn quit(&self) {
        // The loop may already have exited on its own
        let _ = self.events.send(GameEvent::Quit);
    }

    /// Most recent frame, if a tick has run
    pub fn latest_snapshot(&self) -> Option<FrameSnapshot> {
        self.latest.lock().ok().and_then(|frame| frame.clone())
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Wait for the game to end.
    pub fn join(mut self) -> RunOutcome {
        self.wait()
    }

    fn wait(&mut self) -> RunOutcome {
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                log::error!("Tick thread panicked");
                RunOutcome::Halted("tick thread panicked".to_string())
            }),
            None => RunOutcome::Quit,
        }
    }
}

impl Drop for GameRunner {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.quit();
            self.wait();
        }
    }
}

/// Everything the tick thread owns
struct GameLoop {
    state: GameState,
    phrases: Vec<String>,
    seed: u64,
    rx: Receiver<GameEvent>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl GameLoop {
    /// Runs until the game leaves `Playing`, a quit arrives or the senders go away.
    fn run(mut self, latest: &Mutex<Option<FrameSnapshot>>) -> RunOutcome {
        let mut next_tick = Instant::now();

        loop {
            // 1. Drain queued input
            let input = self.drain_events();

            // 2. Step
            let result = tick(&mut self.state, &input, self.clock.now_ms());

            // 3. Publish
            if let Ok(mut frame) = latest.lock() {
                *frame = Some(FrameSnapshot::capture(&self.state));
            }

            if let Err(err) = result {
                return RunOutcome::Halted(err.to_string());
            }
            let state = &self.state;
            match state.phase {
                GamePhase::Playing => {}
                GamePhase::Title => return RunOutcome::Quit,
                GamePhase::Summary => return state.summary.clone().map_or(RunOutcome::Quit, RunOutcome::Summary),
                GamePhase::Halted => return RunOutcome::Halted(state.halt_reason.clone().unwrap_or_default()),
            }

            // 4. Sleep until the next tick
            next_tick += self.interval;
            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            } else if now - next_tick > self.interval * 2 {
                // Too far behind, don't try to catch up
                next_tick = now;
            }
        }
    }

    /// Collect queued keys for the next tick. A restart drops the keys
    /// queued before it and replaces the game.
    fn drain_events(&mut self) -> TickInput {
        let mut input = TickInput::default();
        loop {
            match self.rx.try_recv() {
                Ok(GameEvent::Key(ch)) => input.keys.push(ch),
                Ok(GameEvent::Restart) => {
                    input.keys.clear();
                    self.restart();
                }
                Ok(GameEvent::Quit) | Err(TryRecvError::Disconnected) => {
                    input.quit = true;
                    break;
                }
                Err(TryRecvError::Empty) => break,
            }
        }
        input
    }

    fn restart(&mut self) {
        self.seed = self.seed.wrapping_add(1);
        log::info!("Restarting with seed {}", self.seed);
        self.state = GameState::new(self.phrases.clone(), self.seed, self.clock.now_ms());
    }
}
