//! The player's home ship
//!
//! Holds the typed buffer and the live pulses, turns keystrokes into pulses
//! and points, aims at the focused group and absorbs torpedo hits.

use std::collections::BTreeSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::group::MatchEffect;
use super::pulse::{Pulse, PulseKind};
use super::torpedo::TorpedoId;
use super::view::BattleView;
use super::wave::AttackWave;
use super::world::Battle;
use crate::consts::*;
use crate::{delta_angle, heading, normalize_angle};

/// Letters, the digits 0-9 and the listed symbols may be typed.
/// Numeric characters outside ASCII (superscripts, fractions, roman
/// numerals, circled digits) are not.
pub fn is_pulse_char(ch: char) -> bool {
    ch.is_ascii_digit() || (ch.is_alphabetic() && !ch.is_numeric()) || PULSE_SYMBOLS.contains(ch)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeShip {
    pub pos: DVec2,
    pub angle: f64,
    pub health: u32,
    pub pulses: Vec<Pulse>,
    /// Characters of the live pulses, oldest first
    pub active: String,
    pub explode_ms: Option<u64>,
    pub damage_ms: Option<u64>,
    pub hit_torps: BTreeSet<TorpedoId>,
}

impl Default for HomeShip {
    fn default() -> Self {
        Self {
            pos: DVec2::ZERO,
            angle: std::f64::consts::FRAC_PI_2,
            health: HOME_MAX_HEALTH,
            pulses: Vec::new(),
            active: String::new(),
            explode_ms: None,
            damage_ms: None,
            hit_torps: BTreeSet::new(),
        }
    }
}

impl HomeShip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining health while alive, -1 during the explosion and game-over
    /// fade, 0 once both have played.
    pub fn ship_status(&self, now_ms: u64) -> i32 {
        match self.explode_ms {
            Some(t) if self.health == 0 => {
                if now_ms.saturating_sub(t) > EXPLODE_ANIM_MS + GAME_OVER_FADE_MS {
                    0
                } else {
                    -1
                }
            }
            _ => self.health as i32,
        }
    }

    /// Shaking after a recent hit
    pub fn is_shaking(&self, now_ms: u64) -> bool {
        self.damage_ms.is_some_and(|t| now_ms.saturating_sub(t) < DAMAGE_SHAKE_MS)
    }

    /// Type one character. Returns false if it was ignored.
    pub fn pulse(&mut self, ch: char, battle: &mut Battle<'_>, now_ms: u64) -> bool {
        if self.ship_status(now_ms) <= 0 || !is_pulse_char(ch) {
            return false;
        }
        self.active.push(ch);
        let mut pulse = Pulse::new(battle.world.next_entity_id(), self.pos, now_ms);
        self.update_all_match_cts(true, Some(&mut pulse), battle);
        self.pulses.push(pulse);
        true
    }

    /// Re-match every group against the typed buffer and score the keystroke.
    pub fn update_all_match_cts(&mut self, letter_added: bool, pulse: Option<&mut Pulse>, battle: &mut Battle<'_>) {
        let mut pulse = pulse;
        let full_match = match pulse.as_deref_mut() {
            Some(p) if letter_added => p.check_full_match(&self.active, &mut battle.world.groups),
            _ => false,
        };

        let mut effect = false;
        let mut progressed = false;
        let mut word: Option<String> = None;
        for group in battle.world.groups.iter_mut() {
            let prev = group.match_ct;
            match group.update_match_ct(&self.active) {
                MatchEffect::Full => {
                    effect = true;
                    if word.as_ref().is_none_or(|w| group.seq.len() > w.len()) {
                        word = Some(group.seq.clone());
                    }
                }
                MatchEffect::Partial => effect = true,
                MatchEffect::None => {}
            }
            if group.match_ct > prev {
                progressed = true;
            }
        }

        if letter_added {
            let stats = &mut *battle.stats;
            if progressed || full_match {
                if full_match {
                    let word = word.unwrap_or_default();
                    stats.points += word.chars().count() as u64;
                    if let Some(wave) = battle.wave.as_deref_mut()
                        && format!("{}{}", stats.combo, word).ends_with(wave.phrase())
                    {
                        Self::clear_all(pulse.as_deref_mut(), wave);
                    }
                } else {
                    stats.points += 1;
                }
                if let Some(wave) = battle.wave.as_deref_mut()
                    && self.active.ends_with(&wave.phrase_compact())
                {
                    Self::clear_all(pulse.as_deref_mut(), wave);
                }
            } else if !effect || !stats.can_start_word {
                stats.clear_combo(battle.wave.as_deref_mut());
            }
            battle.stats.can_start_word = full_match;
        }

        if self.active.is_empty() {
            battle.stats.clear_combo(battle.wave.as_deref_mut());
        }
    }

    fn clear_all(pulse: Option<&mut Pulse>, wave: &mut AttackWave) {
        if let Some(pulse) = pulse {
            if pulse.kind != PulseKind::ClearAll {
                log::info!("Wave {}: phrase \"{}\" typed, clearing the field", wave.wave_number, wave.phrase());
            }
            pulse.kind = PulseKind::ClearAll;
        }
        wave.can_add = false;
    }

    /// A pulse finished: forget its character and refresh the matches.
    pub fn pulse_expiry(&mut self, battle: &mut Battle<'_>) {
        if !self.active.is_empty() {
            self.active.remove(0);
        }
        self.update_all_match_cts(false, None, battle);
    }

    /// Turn toward `focus` (or idle-spin) and advance every pulse.
    pub fn move_fwd(
        &mut self,
        focus: Option<DVec2>,
        battle: &mut Battle<'_>,
        view: &BattleView,
        now_ms: u64,
        delta_ms: u64,
    ) {
        let dt_ms = delta_ms as f64;
        match focus {
            Some(target) => {
                let target_angle = heading(target - self.pos);
                let da = delta_angle(target_angle, self.angle);
                let dir = if da > 0.0 { 1.0 } else { -1.0 };
                let turn = dir * HOME_TURN_RATE * dt_ms;
                self.angle = if turn.abs() > da.abs() { target_angle } else { normalize_angle(self.angle + turn) };
            }
            None => self.angle = normalize_angle(self.angle + HOME_IDLE_TURN_RATE * dt_ms),
        }

        let mut expired = 0;
        self.pulses.retain_mut(|p| {
            let done = p.move_fwd(battle, view, now_ms, delta_ms);
            expired += usize::from(done);
            !done
        });
        for _ in 0..expired {
            self.pulse_expiry(battle);
        }
    }

    /// Struck by a released torpedo. Each torpedo counts once.
    pub fn cause_damage(&mut self, torp: TorpedoId, now_ms: u64, wave: Option<&mut AttackWave>) {
        if !self.hit_torps.insert(torp) {
            return;
        }
        self.health = self.health.saturating_sub(1);
        self.damage_ms = Some(now_ms);
        log::info!("Home ship hit by torpedo {torp}, health {}", self.health);
        if self.health == 0 {
            self.explode(now_ms, wave);
        }
    }

    pub fn explode(&mut self, now_ms: u64, wave: Option<&mut AttackWave>) {
        if let Some(wave) = wave {
            wave.can_add = false;
        }
        let restart = match self.explode_ms {
            None => true,
            Some(t) => {
                let since = now_ms.saturating_sub(t);
                since > EXPLODE_RENEW_MIN_MS && since < EXPLODE_ANIM_MS
            }
        };
        if restart {
            self.explode_ms = Some(now_ms);
        }
    }

    /// Mark every pulse for removal at its next advance.
    pub fn clear_pulses(&mut self) {
        for pulse in &mut self.pulses {
            pulse.pending_remove = true;
        }
    }
}
