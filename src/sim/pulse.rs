//! Expanding ring pulses
//!
//! Every accepted keystroke emits a pulse from the home ship. A pulse only
//! destroys groups whose whole sequence was typed when it was emitted, and
//! only once its front reaches one of their torpedoes.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::group::TorpedoGroups;
use super::view::BattleView;
use super::world::{Battle, GroupId};
use crate::consts::{PULSE_CLEAR_MS, PULSE_SPEED};

pub type PulseId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PulseKind {
    Normal,
    /// Sweeps every group on the field
    ClearAll,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pulse {
    pub id: PulseId,
    pub center: DVec2,
    pub rad: f64,
    pub start_ms: u64,
    pub speed: f64,
    pub kind: PulseKind,
    /// Groups fully typed when this pulse was emitted
    pub targets: Vec<GroupId>,
    pub contacted: bool,
    pub pending_remove: bool,
}

impl Pulse {
    pub fn new(id: PulseId, center: DVec2, now_ms: u64) -> Self {
        Self {
            id,
            center,
            rad: 0.0,
            start_ms: now_ms,
            speed: PULSE_SPEED,
            kind: PulseKind::Normal,
            targets: Vec::new(),
            contacted: false,
            pending_remove: false,
        }
    }

    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.start_ms)
    }

    /// Collect every group whose sequence is a suffix of `active`.
    ///
    /// Matching groups get `match_ct = |seq|`. Returns true if any matched.
    pub fn check_full_match(&mut self, active: &str, groups: &mut TorpedoGroups) -> bool {
        self.targets.clear();
        let mut matched = false;
        for (start, _) in active.char_indices() {
            let Some(bucket) = groups.bucket_mut(&active[start..]) else {
                continue;
            };
            for group in bucket.iter_mut() {
                group.match_ct = group.seq_len();
                self.targets.push(group.id);
                matched = true;
            }
        }
        matched
    }

    fn in_range(&self, pt: DVec2) -> bool {
        self.center.distance(pt) < self.rad
    }

    /// Advance the ring and resolve contacts. Returns true once the pulse is done.
    pub fn move_fwd(&mut self, battle: &mut Battle<'_>, view: &BattleView, now_ms: u64, delta_ms: u64) -> bool {
        if self.pending_remove || self.age_ms(now_ms) > PULSE_CLEAR_MS {
            return true;
        }
        if self.kind == PulseKind::ClearAll
            && !view.in_view(DVec2::splat(self.rad))
            && battle.world.groups.is_empty()
        {
            if let Some(wave) = battle.wave.as_deref_mut() {
                wave.ships_left = 0;
            }
            return true;
        }

        let active = self.rad < view.extent();

        if self.kind == PulseKind::ClearAll {
            let mut ships = Vec::new();
            let mut hits = Vec::new();
            for group in battle.world.groups.iter() {
                match group.torps.first() {
                    None => ships.extend(group.parent),
                    Some(first) if self.in_range(first.pos) && group.locked != Some(self.id) => {
                        hits.push((group.id, group.seq.clone()))
                    }
                    Some(_) => {}
                }
            }
            for ship in ships {
                battle.world.lock_ship(ship, self.id, now_ms);
            }
            for (id, seq) in hits {
                battle.stats.add_combo(&seq, battle.wave.as_deref_mut());
                battle.world.lock_group(id, self.id, 0, now_ms);
            }
        }

        if active && !self.contacted {
            let hit = self.targets.iter().find_map(|&id| {
                let group = battle.world.groups.get(id)?;
                if group.locked.is_some() {
                    return None;
                }
                let idx = group.torp_in_range(self.center, self.rad)?;
                Some((id, idx, group.seq.clone()))
            });
            if let Some((id, idx, seq)) = hit {
                battle.stats.add_combo(&seq, battle.wave.as_deref_mut());
                self.contacted = true;
                battle.world.lock_group(id, self.id, idx, now_ms);
            }
        }

        self.rad += self.speed * delta_ms as f64 / 1000.0;
        false
    }
}
