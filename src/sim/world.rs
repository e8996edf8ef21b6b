//! Entity arena
//!
//! Ships live in a map keyed by stable ID and groups live in the sequence
//! index. Cross references between them are IDs, never borrows, so a group
//! can outlive the ship that launched it.

use std::collections::BTreeMap;

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::enemy::EnemyShip;
use super::error::SimError;
use super::flight_path::{FlightPath, FlightPoint, PathAction};
use super::group::{TorpedoGroup, TorpedoGroups};
use super::pulse::PulseId;
use super::stats::GameStat;
use super::torpedo::TorpedoId;
use super::view::BattleView;
use super::wave::AttackWave;

pub type ShipId = u32;
pub type GroupId = u32;

/// Everything a pulse or keystroke may touch besides the home ship
pub struct Battle<'a> {
    pub world: &'a mut World,
    pub stats: &'a mut GameStat,
    pub wave: Option<&'a mut AttackWave>,
}

/// Per-tick report from `World::move_all`
#[derive(Debug, Default)]
pub struct MoveReport {
    /// Released torpedoes touching the home ship
    pub hits: Vec<TorpedoId>,
    /// Empty ships that reached a FILL marker
    pub fills: Vec<ShipId>,
    pub removed: usize,
}

#[derive(Debug, Clone)]
pub struct World {
    pub seed: u64,
    pub rng: Pcg32,
    pub ships: BTreeMap<ShipId, EnemyShip>,
    pub groups: TorpedoGroups,
    next_id: u32,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            ships: BTreeMap::new(),
            groups: TorpedoGroups::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Allocate `count` consecutive IDs, returning the first
    fn reserve_ids(&mut self, count: usize) -> u32 {
        let first = self.next_id;
        self.next_id += count as u32;
        first
    }

    /// Create a ship carrying `seq` along `path`, starting after `delay_ms`.
    pub fn spawn_ship(&mut self, seq: &str, path: FlightPath, now_ms: u64, delay_ms: u64) -> ShipId {
        let ship_id = self.next_entity_id();
        let group_id = self.next_entity_id();
        let mut ship = EnemyShip::new(ship_id, group_id, seq, path, now_ms, delay_ms);
        ship.has_torps = !seq.is_empty();
        let first = self.reserve_ids(seq.chars().count());
        self.groups.insert(TorpedoGroup::new(group_id, seq, &ship, first, now_ms));
        self.ships.insert(ship_id, ship);
        ship_id
    }

    /// Ship circling a tiny loop at `pos`. Test support for placing a ship
    /// without flying it in.
    #[doc(hidden)]
    pub fn spawn_hovering(&mut self, seq: &str, pos: DVec2, now_ms: u64) -> Result<ShipId, SimError> {
        let path = FlightPath::new(vec![
            FlightPoint::new(pos.x, pos.y, PathAction::None),
            FlightPoint::new(pos.x + 0.005, pos.y, PathAction::None),
            FlightPoint::new(pos.x + 0.005, pos.y + 0.005, PathAction::None),
            FlightPoint::new(pos.x, pos.y + 0.005, PathAction::None),
        ])?;
        Ok(self.spawn_ship(seq, path, now_ms, 0))
    }

    /// Give a ship that just launched an empty group so it stays tracked.
    fn attach_empty_group(&mut self, ship_id: ShipId, now_ms: u64) {
        let group_id = self.next_entity_id();
        let Some(ship) = self.ships.get_mut(&ship_id) else {
            return;
        };
        let group = TorpedoGroup::new(group_id, "", ship, 0, now_ms);
        ship.group = group_id;
        ship.seq.clear();
        self.groups.insert(group);
    }

    /// Load `seq` onto an empty ship, replacing its word-less group.
    pub fn refill(&mut self, ship_id: ShipId, seq: &str, now_ms: u64) -> Option<GroupId> {
        let group_id = self.next_entity_id();
        let first = self.reserve_ids(seq.chars().count());
        let ship = self.ships.get_mut(&ship_id)?;
        let old = ship.group;
        let group = TorpedoGroup::new(group_id, seq, ship, first, now_ms);
        ship.load(group_id, seq);

        let stale = self
            .groups
            .get(old)
            .is_some_and(|g| g.parent == Some(ship_id) && g.torps.is_empty());
        if stale {
            self.groups.remove(old);
        }
        self.groups.insert(group);
        log::debug!("Ship {ship_id} loaded \"{seq}\"");
        Some(group_id)
    }

    pub fn lock_ship(&mut self, ship_id: ShipId, pulse: PulseId, now_ms: u64) {
        if let Some(ship) = self.ships.get_mut(&ship_id) {
            ship.lock(pulse, now_ms);
        }
    }

    /// Destroy a group: lock it and its parent ship.
    pub fn lock_group(&mut self, group_id: GroupId, pulse: PulseId, closest: usize, now_ms: u64) {
        let Some(group) = self.groups.get_mut(group_id) else {
            return;
        };
        group.lock(pulse, closest);
        log::debug!("Group {} \"{}\" destroyed by pulse {}", group_id, group.seq, pulse);
        if let Some(ship) = group.parent {
            self.lock_ship(ship, pulse, now_ms);
        }
    }

    /// Advance every group once and cull the dead ones.
    pub fn move_all(&mut self, home: DVec2, view: &BattleView, now_ms: u64, delta_ms: u64) -> MoveReport {
        let mut report = MoveReport::default();
        let mut dead = Vec::new();
        let mut launched = Vec::new();

        for group in self.groups.iter_mut() {
            let step = group.move_fwd(&mut self.ships, home, view, now_ms, delta_ms, &mut self.rng);
            if step.remove {
                dead.push(group.id);
            }
            launched.extend(step.launched);
            report.fills.extend(step.fill);
            report.hits.extend(step.hits);
        }

        for ship in launched {
            self.attach_empty_group(ship, now_ms);
        }
        for id in dead {
            if let Some(group) = self.groups.remove(id) {
                if let Some(ship) = group.parent {
                    self.ships.remove(&ship);
                }
                report.removed += 1;
            }
        }
        report
    }

    /// Aim point of the focused group
    pub fn focused_target(&self, point: DVec2) -> Option<DVec2> {
        self.groups
            .get_focused(&self.ships, point)
            .and_then(|g| g.first_pos(&self.ships))
    }

    /// Check the arena invariants.
    pub fn validate(&self) -> Result<(), SimError> {
        for ship in self.ships.values() {
            if !(ship.pos.is_finite() && ship.vel.is_finite()) {
                return Err(SimError::NonFiniteShip { ship: ship.id });
            }
            let speed = ship.vel.length();
            if speed > ship.max_speed + 1e-9 {
                return Err(SimError::ShipOverspeed { ship: ship.id, speed, max: ship.max_speed });
            }
        }
        for group in self.groups.iter() {
            let len = group.seq_len();
            if group.match_ct > len {
                return Err(SimError::MatchCountOutOfRange { group: group.id, match_ct: group.match_ct, len });
            }
            if group.torps.iter().any(|t| !(t.pos.is_finite() && t.vel.is_finite())) {
                return Err(SimError::NonFiniteTorpedo { group: group.id });
            }
        }
        Ok(())
    }

    /// Drop whatever `err` blames, with the ship or group tied to it.
    pub fn cull(&mut self, err: &SimError) {
        let doomed: Vec<GroupId> = match *err {
            SimError::NonFiniteShip { ship } | SimError::ShipOverspeed { ship, .. } => {
                self.ships.remove(&ship);
                self.groups.iter().filter(|g| g.parent == Some(ship)).map(|g| g.id).collect()
            }
            SimError::NonFiniteTorpedo { group } | SimError::MatchCountOutOfRange { group, .. } => vec![group],
            SimError::DegeneratePath { .. } | SimError::NonFiniteHome => Vec::new(),
        };
        for id in doomed {
            if let Some(group) = self.groups.remove(id)
                && let Some(ship) = group.parent
            {
                self.ships.remove(&ship);
            }
        }
    }
}
