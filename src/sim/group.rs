//! Torpedo chains and the sequence index
//!
//! A group is the chain of torpedoes spelling one engine sequence. Groups are
//! indexed by that sequence; two ships may carry the same word at once, so
//! each key holds a list.

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::enemy::{EnemyShip, ShipStep};
use super::pulse::PulseId;
use super::torpedo::{TorpedoId, TorpedoState, TxTorpedo};
use super::view::BattleView;
use super::world::{GroupId, ShipId};
use crate::consts::TORP_PULSED_SPEED;

/// Outcome of re-matching a group against the typed buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEffect {
    None,
    /// A prefix of the sequence ends the typed buffer
    Partial,
    /// The whole sequence ends the typed buffer
    Full,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorpedoGroup {
    pub id: GroupId,
    pub seq: String,
    pub start_ms: u64,
    pub torps: Vec<TxTorpedo>,
    /// Characters of `seq` currently typed
    pub match_ct: usize,
    /// Pulse that destroyed this group
    pub locked: Option<PulseId>,
    pub parent: Option<ShipId>,
    /// Torpedo the rest of the chain follows after a lock
    pub leader: Option<usize>,
    /// Whether any torpedo has been inside the view
    pub seen_in_view: bool,
}

/// Per-tick report from a single group
#[derive(Debug, Default)]
pub struct GroupStep {
    pub remove: bool,
    /// Parent ship that launched this tick and needs a new group
    pub launched: Option<ShipId>,
    /// Parent ship waiting for a new word
    pub fill: Option<ShipId>,
    pub hits: Vec<TorpedoId>,
}

impl TorpedoGroup {
    /// Chain for `seq`, every torpedo stacked on the ship position.
    pub fn new(id: GroupId, seq: &str, ship: &EnemyShip, first_torp_id: TorpedoId, now_ms: u64) -> Self {
        let torps = seq
            .chars()
            .enumerate()
            .map(|(i, ch)| TxTorpedo::new(first_torp_id + i as u32, ch, ship.pos, ship.vel, i == 0))
            .collect();
        Self {
            id,
            seq: seq.to_string(),
            start_ms: now_ms,
            torps,
            match_ct: 0,
            locked: None,
            parent: Some(ship.id),
            leader: None,
            seen_in_view: false,
        }
    }

    pub fn seq_len(&self) -> usize {
        self.seq.chars().count()
    }

    /// Re-derive `match_ct` from the typed buffer.
    ///
    /// A full match clears the count again; highlighting restarts on the
    /// next keystroke.
    pub fn update_match_ct(&mut self, active: &str) -> MatchEffect {
        let len = self.seq_len();
        if len == 0 {
            self.match_ct = 0;
            return MatchEffect::None;
        }
        self.match_ct = self
            .seq
            .char_indices()
            .map(|(i, ch)| i + ch.len_utf8())
            .enumerate()
            .filter(|&(_, end)| active.ends_with(&self.seq[..end]))
            .map(|(n, _)| n + 1)
            .max()
            .unwrap_or(0);
        if self.match_ct == len {
            self.match_ct = 0;
            MatchEffect::Full
        } else if self.match_ct != 0 {
            MatchEffect::Partial
        } else {
            MatchEffect::None
        }
    }

    /// Mark the group destroyed by `pulse`; `closest` drags the rest outward.
    /// The parent ship is locked by the caller.
    pub fn lock(&mut self, pulse: PulseId, closest: usize) {
        self.locked = Some(pulse);
        for torp in &mut self.torps {
            torp.state = TorpedoState::Follow;
            torp.max_speed = TORP_PULSED_SPEED;
        }
        if let Some(torp) = self.torps.get_mut(closest) {
            torp.state = TorpedoState::Pulsed;
            self.leader = Some(closest);
        }
    }

    /// Where the chain starts: the ship if attached, else the first torpedo.
    pub fn first_pos(&self, ships: &BTreeMap<ShipId, EnemyShip>) -> Option<DVec2> {
        self.parent
            .and_then(|id| ships.get(&id))
            .map(|ship| ship.pos)
            .or_else(|| self.torps.first().map(|t| t.pos))
    }

    /// Index of the first torpedo closer than `rad` to `center`
    pub fn torp_in_range(&self, center: DVec2, rad: f64) -> Option<usize> {
        self.torps.iter().position(|t| t.pos.distance(center) < rad)
    }

    /// Advance the parent ship, then each torpedo toward its leader.
    pub fn move_fwd(
        &mut self,
        ships: &mut BTreeMap<ShipId, EnemyShip>,
        home: DVec2,
        view: &BattleView,
        now_ms: u64,
        delta_ms: u64,
        rng: &mut impl rand::Rng,
    ) -> GroupStep {
        let dt = delta_ms as f64 / 1000.0;
        let mut step = GroupStep::default();
        let mut parent_gone = false;

        let mut lead = None;
        if let Some(ship_id) = self.parent {
            match ships.get_mut(&ship_id) {
                Some(ship) => {
                    match ship.move_fwd(home, view, now_ms, delta_ms, rng) {
                        ShipStep::Remove => parent_gone = true,
                        ShipStep::Launch { torp_vel } => {
                            for torp in &mut self.torps {
                                if torp.state == TorpedoState::Follow {
                                    torp.state = TorpedoState::Released;
                                    torp.vel = torp_vel;
                                }
                            }
                            self.parent = None;
                            step.launched = Some(ship_id);
                        }
                        ShipStep::Fill => step.fill = Some(ship_id),
                        ShipStep::Continue => {}
                    }
                    lead = Some(ship.pos);
                }
                None => self.parent = None,
            }
        }

        for i in 0..self.torps.len() {
            let target = if i > 0 {
                Some(self.torps[i - 1].pos)
            } else {
                match self.leader {
                    Some(j) => self.torps.get(j).map(|t| t.pos),
                    None => lead,
                }
            };
            let torp = &mut self.torps[i];
            if let Some(target) = target {
                torp.target = target;
            }
            if torp.move_fwd(home, dt) {
                step.hits.push(torp.id);
            }
        }

        let any_in_view = self.torps.iter().any(|t| view.in_view(t.pos));
        self.seen_in_view |= any_in_view;
        let detached_done = self.parent.is_none()
            && step.launched.is_none()
            && (self.torps.is_empty() || self.seen_in_view);
        step.remove = !any_in_view && (self.locked.is_some() || parent_gone || detached_done);
        step
    }
}

/// Live groups indexed by engine sequence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TorpedoGroups {
    buckets: BTreeMap<String, Vec<TorpedoGroup>>,
}

impl TorpedoGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: TorpedoGroup) {
        self.buckets.entry(group.seq.clone()).or_default().push(group);
    }

    /// Remove a group by ID, dropping its bucket if it empties.
    pub fn remove(&mut self, id: GroupId) -> Option<TorpedoGroup> {
        let (seq, idx) = self
            .buckets
            .iter()
            .find_map(|(seq, list)| list.iter().position(|g| g.id == id).map(|i| (seq.clone(), i)))?;
        let list = self.buckets.get_mut(&seq)?;
        let group = list.remove(idx);
        if list.is_empty() {
            self.buckets.remove(&seq);
        }
        Some(group)
    }

    pub fn contains_seq(&self, seq: &str) -> bool {
        self.buckets.contains_key(seq)
    }

    pub fn get(&self, id: GroupId) -> Option<&TorpedoGroup> {
        self.iter().find(|g| g.id == id)
    }

    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut TorpedoGroup> {
        self.iter_mut().find(|g| g.id == id)
    }

    /// All groups registered under `seq`
    pub fn bucket_mut(&mut self, seq: &str) -> Option<&mut Vec<TorpedoGroup>> {
        self.buckets.get_mut(seq)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TorpedoGroup> {
        self.buckets.values().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TorpedoGroup> {
        self.buckets.values_mut().flatten()
    }

    pub fn ids(&self) -> Vec<GroupId> {
        self.iter().map(|g| g.id).collect()
    }

    /// No sequence has a live group
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Group the home ship should aim at: fewest characters left to type,
    /// then nearest to `point`. Word-less groups are skipped.
    pub fn get_focused(&self, ships: &BTreeMap<ShipId, EnemyShip>, point: DVec2) -> Option<&TorpedoGroup> {
        let mut best: Option<(&TorpedoGroup, usize, f64)> = None;
        for group in self.iter().filter(|g| !g.seq.is_empty()) {
            let Some(pos) = group.first_pos(ships) else {
                continue;
            };
            let deficit = group.seq_len().saturating_sub(group.match_ct);
            let dist = pos.distance(point);
            let better = match best {
                None => true,
                Some((_, d, r)) => deficit < d || (deficit == d && dist < r),
            };
            if better {
                best = Some((group, deficit, dist));
            }
        }
        best.map(|(g, _, _)| g)
    }
}
