//! Game state and phase machine
//!
//! Everything the director advances each tick lives here.

use serde::{Deserialize, Serialize};

use super::error::SimError;
use super::home::HomeShip;
use super::stats::{GameStat, GameStatus, Summary};
use super::view::BattleView;
use super::wave::AttackWave;
use super::world::{Battle, World};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Not playing; the player quit back to the title
    Title,
    /// Waves in progress
    Playing,
    /// Game over, summary available
    Summary,
    /// A tick hit a broken invariant and stopped
    Halted,
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,
    pub world: World,
    pub home: HomeShip,
    pub wave: Option<AttackWave>,
    pub stats: GameStat,
    pub view: BattleView,
    phrases: Vec<String>,
    next_phrase: usize,
    /// Waves started so far
    pub wave_count: u32,
    /// When the last wave completed
    pub win_ms: Option<u64>,
    pub summary: Option<Summary>,
    pub halt_reason: Option<String>,
    /// Clock reading of the last tick
    pub time_ms: u64,
    pub tick_count: u64,
}

impl GameState {
    /// New game over `phrases`, one per wave. With no phrases the game is
    /// over before it starts.
    pub fn new(phrases: Vec<String>, seed: u64, now_ms: u64) -> Self {
        let phrases: Vec<String> = phrases.into_iter().filter(|p| !p.trim().is_empty()).collect();
        let mut state = Self {
            phase: GamePhase::Playing,
            world: World::new(seed),
            home: HomeShip::new(),
            wave: None,
            stats: GameStat::new(),
            view: BattleView::default(),
            phrases,
            next_phrase: 0,
            wave_count: 0,
            win_ms: None,
            summary: None,
            halt_reason: None,
            time_ms: now_ms,
            tick_count: 0,
        };

        log::info!("New game: {} phrases, seed {}", state.phrases.len(), seed);
        match state.take_phrase() {
            Some(phrase) => state.start_wave(&phrase, now_ms),
            None => {
                log::warn!("No phrases to play, going straight to the summary");
                state.finish(GameStatus::Win);
            }
        }
        state
    }

    pub fn seed(&self) -> u64 {
        self.world.seed
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    fn take_phrase(&mut self) -> Option<String> {
        let phrase = self.phrases.get(self.next_phrase).cloned()?;
        self.next_phrase += 1;
        Some(phrase)
    }

    /// Replace the current wave, clearing any pulses still in flight.
    pub fn start_wave(&mut self, phrase: &str, now_ms: u64) {
        self.home.clear_pulses();
        self.wave_count += 1;
        self.stats.on_next_wave();
        self.wave = Some(AttackWave::new(phrase, self.wave_count, now_ms, &mut self.world.rng));
        log::info!("Wave {} begins", self.wave_count);
    }

    /// Move on after a completed wave. Returns true if another wave started.
    pub fn advance_phrase(&mut self, now_ms: u64) -> bool {
        match self.take_phrase() {
            Some(phrase) => {
                self.start_wave(&phrase, now_ms);
                true
            }
            None => false,
        }
    }

    pub fn finish(&mut self, status: GameStatus) {
        let summary = self.stats.summary(status);
        log::info!("Game over ({:?}) with {} points", status, summary.points);
        self.summary = Some(summary);
        self.phase = GamePhase::Summary;
    }

    pub fn halt(&mut self, err: &SimError) {
        log::error!("Simulation halted: {err}");
        self.halt_reason = Some(err.to_string());
        self.phase = GamePhase::Halted;
    }

    /// Split borrows for the home ship and the rest of the battle
    pub fn split(&mut self) -> (&mut HomeShip, Battle<'_>, &BattleView) {
        (
            &mut self.home,
            Battle { world: &mut self.world, stats: &mut self.stats, wave: self.wave.as_mut() },
            &self.view,
        )
    }

    /// Apply one keystroke. Returns false if the character was ignored.
    pub fn type_char(&mut self, ch: char, now_ms: u64) -> bool {
        let (home, mut battle, _) = self.split();
        home.pulse(ch, &mut battle, now_ms)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !self.home.angle.is_finite() {
            return Err(SimError::NonFiniteHome);
        }
        self.world.validate()
    }
}
