//! Attack waves
//!
//! A wave is the squadron for one phrase. It decides when ships appear and
//! which word each one carries, steering supply toward the phrase's next
//! word whenever nobody on the field is carrying it.

use std::f64::consts::TAU;

use glam::DVec2;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::error::SimError;
use super::flight_path::{FlightPath, FlightPoint, PathAction};
use super::group::TorpedoGroups;
use super::world::World;
use crate::consts::*;
use crate::{cross_z, normalize_angle};

const FILL: bool = true;
const PASS: bool = false;

/// Base loops flown by each batch, as (x, y, refuel point)
const TRACKS: [&[(f64, f64, bool)]; 3] = [
    &[
        (1.6, 0.0, FILL), (0.1, -0.4, PASS), (-0.15, -0.6, PASS), (0.0, -1.0, PASS), (0.3, -1.0, PASS),
        (0.4, -0.7, PASS), (-0.5, -0.5, PASS), (-1.0, -0.2, PASS), (-0.9, 0.4, PASS), (-0.7, 0.5, PASS),
        (-0.6, 0.25, PASS), (-0.75, 0.0, PASS), (-1.0, 0.25, PASS), (-1.2, 1.2, FILL), (-0.2, 0.8, PASS),
        (0.5, 1.0, PASS), (0.7, 0.8, PASS), (0.4, 0.6, PASS), (0.0, 0.7, PASS), (0.0, 1.2, PASS),
        (0.6, 1.4, PASS), (1.7, 0.7, PASS), (1.6, 0.1, PASS),
    ],
    &[
        (1.6, 0.0, FILL), (0.8, -0.6, PASS), (0.4, -0.9, PASS), (-0.7, -1.0, PASS), (-0.6, -0.7, PASS),
        (-0.2, -0.6, PASS), (0.3, -0.65, PASS), (0.4, -0.9, PASS), (-0.2, -1.1, PASS), (-0.75, -0.65, PASS),
        (-0.75, -0.1, PASS), (-0.9, 0.2, PASS), (-1.3, 0.2, FILL), (-1.2, -0.25, PASS), (-0.8, -0.4, PASS),
        (-0.5, -0.15, PASS), (-0.7, 0.6, PASS), (-0.4, 0.8, PASS), (0.25, 0.75, PASS), (0.2, 0.5, PASS),
        (-0.25, 0.5, PASS), (-0.2, 0.8, PASS), (0.6, 0.9, PASS), (1.0, 0.6, PASS),
    ],
    &[
        (1.6, 0.0, FILL), (0.7, 0.65, PASS), (-0.1, 0.5, PASS), (-0.75, 0.6, PASS), (-0.75, 0.9, PASS),
        (0.2, 0.9, PASS), (0.2, 0.75, PASS), (-0.2, 0.4, PASS), (-0.6, 0.25, PASS), (-0.8, 0.7, PASS),
        (-0.4, 0.75, PASS), (-0.25, 0.25, PASS), (-0.7, 0.2, PASS), (-0.75, -0.75, PASS), (-0.25, -1.3, FILL),
        (0.4, -0.75, PASS), (0.3, -0.4, PASS), (-0.25, -0.7, PASS), (0.1, -0.9, PASS), (0.9, -0.8, PASS),
    ],
];

/// Tag a raw track. Refuel points become FILL; a vertex becomes LAUNCH when
/// the legs before and after both head toward home and sweep across it.
pub fn tag_track(track: &[(f64, f64, bool)]) -> Vec<FlightPoint> {
    let n = track.len();
    (0..n)
        .map(|i| {
            let (x, y, fill) = track[i];
            let action = if i == 0 || fill {
                PathAction::Fill
            } else {
                let p = DVec2::new(x, y);
                let (px, py, _) = track[i - 1];
                let (nx, ny, _) = track[(i + 1) % n];
                let to_home = -p;
                let before = p - DVec2::new(px, py);
                let after = DVec2::new(nx, ny) - p;
                let sweeps = cross_z(before, to_home) * cross_z(after, to_home) < 0.0;
                if to_home.dot(before) > 0.0 && to_home.dot(after) > 0.0 && sweeps {
                    PathAction::Launch
                } else {
                    PathAction::None
                }
            };
            FlightPoint::new(x, y, action)
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackWave {
    phrase: String,
    phrase_words: Vec<String>,
    shuffled_words: Vec<String>,
    curr_word_idx: usize,
    phrase_match_ct: usize,
    pub ships_left: u32,
    pub can_add: bool,
    pub wave_number: u32,
    pub start_ms: u64,
    pub last_ship_added_ms: u64,
    track_idx: usize,
}

impl AttackWave {
    /// Wave for `phrase`. The caller clears outstanding pulses.
    pub fn new<R: Rng + ?Sized>(phrase: &str, wave_number: u32, now_ms: u64, rng: &mut R) -> Self {
        let phrase_words: Vec<String> = phrase.split_whitespace().map(str::to_string).collect();
        let mut shuffled_words = phrase_words.clone();
        shuffled_words.shuffle(rng);
        Self {
            phrase: phrase_words.join(" "),
            phrase_words,
            shuffled_words,
            curr_word_idx: 0,
            phrase_match_ct: 0,
            ships_left: WAVE_SHIPS,
            can_add: true,
            wave_number,
            start_ms: now_ms,
            last_ship_added_ms: now_ms,
            track_idx: TRACKS.len() - 1,
        }
    }

    /// Master phrase, words separated by single spaces
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Master phrase with the spaces removed
    pub fn phrase_compact(&self) -> String {
        self.phrase_words.concat()
    }

    pub fn phrase_words(&self) -> &[String] {
        &self.phrase_words
    }

    pub fn shuffled_words(&self) -> &[String] {
        &self.shuffled_words
    }

    pub fn phrase_match_ct(&self) -> usize {
        self.phrase_match_ct
    }

    /// True while the next phrase word is already on the field, or the
    /// whole phrase has been destroyed in order.
    pub fn can_continue_phrase(&self, groups: &TorpedoGroups) -> bool {
        match self.phrase_words.get(self.phrase_match_ct) {
            Some(next) => groups.contains_seq(next),
            None => true,
        }
    }

    /// Word for the next ship.
    pub fn get_word(&mut self, groups: &TorpedoGroups) -> String {
        if !self.can_continue_phrase(groups) {
            return self.phrase_words[self.phrase_match_ct].clone();
        }
        let word = self.shuffled_words[self.curr_word_idx % self.shuffled_words.len()].clone();
        self.curr_word_idx = (self.curr_word_idx + 1) % self.shuffled_words.len();
        word
    }

    /// Advance the phrase on the next expected word, else start over.
    pub fn submit_word(&mut self, word: &str) {
        if self.phrase_words.get(self.phrase_match_ct).is_some_and(|w| w == word) {
            self.phrase_match_ct += 1;
        } else {
            self.phrase_match_ct = 0;
        }
    }

    /// Loop for the `ship_idx`-th ship of a batch. The first ship of a batch
    /// moves on to the next base track.
    fn make_flight_path(&mut self, ship_idx: u32, angle: f64, home: DVec2) -> Result<FlightPath, SimError> {
        if ship_idx == 0 {
            self.track_idx = (self.track_idx + 1) % TRACKS.len();
        }
        let base = FlightPath::new(tag_track(TRACKS[self.track_idx]))?;
        base.rotated(normalize_angle(angle + ship_idx as f64 * SHIP_ANGLE_STEP), home)
    }

    /// Spawn up to `count` ships. Returns true once the squadron is spent.
    pub fn add_enemy_group(&mut self, count: u32, world: &mut World, home: DVec2, now_ms: u64) -> Result<bool, SimError> {
        if self.ships_left == 0 {
            return Ok(true);
        }
        if !self.can_add {
            return Ok(false);
        }
        self.last_ship_added_ms = now_ms;
        let angle = world.rng.random::<f64>() * TAU;
        let mut ship_idx = 0;
        while ship_idx < count && self.ships_left > 0 {
            self.ships_left -= 1;
            let word = self.get_word(&world.groups);
            let path = self.make_flight_path(ship_idx, angle, home)?;
            world.spawn_ship(&word, path, now_ms, ship_idx as u64 * SHIP_STAGGER_MS);
            ship_idx += 1;
        }
        log::debug!("Wave {}: added {} ships, {} left", self.wave_number, ship_idx, self.ships_left);
        Ok(self.ships_left == 0)
    }

    /// Pace ship arrivals. Returns true once the wave is complete.
    pub fn update(&mut self, world: &mut World, home: DVec2, now_ms: u64) -> Result<bool, SimError> {
        if now_ms.saturating_sub(self.start_ms) < WAVE_PAUSE_MS {
            return Ok(false);
        }
        if now_ms.saturating_sub(self.last_ship_added_ms) > WAVE_ADD_INTERVAL_MS {
            self.add_enemy_group(1, world, home, now_ms)
        } else if world.groups.is_empty() {
            self.add_enemy_group(WAVE_REFILL_BATCH, world, home, now_ms)
        } else if !self.can_continue_phrase(&world.groups) {
            self.add_enemy_group(1, world, home, now_ms)
        } else {
            Ok(false)
        }
    }

    /// Banner age while the wave title is showing
    pub fn banner_age(&self, now_ms: u64) -> Option<u64> {
        let age = now_ms.saturating_sub(self.start_ms);
        (age < WAVE_PAUSE_MS + WAVE_BANNER_ANIM_MS).then_some(age)
    }
}
