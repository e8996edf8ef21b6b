//! Enemy ships
//!
//! A ship chases a point sliding around its flight loop with bounded
//! acceleration, obeys the loop's LAUNCH and FILL markers, and flies
//! straight out of the field once destroyed.

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::flight_path::{FlightPath, PathAction};
use super::pulse::PulseId;
use super::view::BattleView;
use super::world::{GroupId, ShipId};
use crate::consts::*;

/// What the owning group has to do after a ship moved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShipStep {
    Continue,
    /// Destroyed and off screen
    Remove,
    /// Release the chain with this velocity
    Launch { torp_vel: DVec2 },
    /// Empty ship reached a FILL marker
    Fill,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyShip {
    pub id: ShipId,
    /// Group currently attached to this ship
    pub group: GroupId,
    pub seq: String,
    pub pos: DVec2,
    pub vel: DVec2,
    pub target: DVec2,
    pub path: FlightPath,
    /// Time the ship starts flying (creation plus stagger delay)
    pub start_ms: u64,
    /// Time for one lap of the loop at preferred speed
    pub cycle_ms: f64,
    pub has_torps: bool,
    pub locked: Option<PulseId>,
    pub exploded: bool,
    pub explode_ms: Option<u64>,
    pub max_speed: f64,
    pub match_ct: usize,
}

impl EnemyShip {
    pub fn new(id: ShipId, group: GroupId, seq: &str, path: FlightPath, now_ms: u64, delay_ms: u64) -> Self {
        let pos = path.sample(0.0);
        let cycle_ms = path.total_dist() / SHIP_PREFERRED_SPEED * 1000.0;
        Self {
            id,
            group,
            seq: seq.to_string(),
            pos,
            vel: DVec2::ZERO,
            target: pos,
            path,
            start_ms: now_ms + delay_ms,
            cycle_ms,
            has_torps: true,
            locked: None,
            exploded: false,
            explode_ms: None,
            max_speed: SHIP_MAX_SPEED,
            match_ct: 0,
        }
    }

    /// Fraction of the loop reached after `elapsed_ms` of flight
    pub fn path_frac(&self, elapsed_ms: i64) -> f64 {
        if elapsed_ms < 0 {
            0.0
        } else {
            (elapsed_ms as f64 / self.cycle_ms) % 1.0
        }
    }

    /// Heading used for drawing
    pub fn heading(&self) -> f64 {
        crate::heading(self.target - self.pos)
    }

    pub fn lock(&mut self, pulse: PulseId, now_ms: u64) {
        if self.exploded {
            return;
        }
        self.locked = Some(pulse);
        self.exploded = true;
        self.explode_ms = Some(now_ms);
        self.max_speed = SHIP_FLYOFF_SPEED;
    }

    /// Point the ship at a new word after a FILL.
    pub fn load(&mut self, group: GroupId, seq: &str) {
        self.group = group;
        self.seq = seq.to_string();
        self.has_torps = true;
        self.match_ct = 0;
    }

    pub fn move_fwd<R: Rng + ?Sized>(
        &mut self,
        home: DVec2,
        view: &BattleView,
        now_ms: u64,
        delta_ms: u64,
        rng: &mut R,
    ) -> ShipStep {
        let dt = delta_ms as f64 / 1000.0;

        if self.locked.is_some() {
            self.pos += (self.pos - home).normalize_or_zero() * self.max_speed * dt;
            return if view.in_view(self.pos) { ShipStep::Continue } else { ShipStep::Remove };
        }

        let elapsed = now_ms as i64 - self.start_ms as i64;
        if elapsed <= 0 {
            return ShipStep::Continue;
        }

        let frac = self.path_frac(elapsed);
        self.pos += self.vel * dt;
        self.target = self.path.target_pos(frac, rng);

        let mut step = ShipStep::Continue;
        match self.path.action() {
            PathAction::Launch => {
                let to_home = home - self.pos;
                let speed = self.vel.length();
                let dist = to_home.length();
                if speed > 0.0 && dist > 0.0 && to_home.dot(self.vel) / (speed * dist) > LAUNCH_ALIGNMENT {
                    self.path.action_taken();
                    if speed >= SHIP_MIN_LAUNCH_SPEED && elapsed >= SHIP_MIN_LAUNCH_DELAY_MS {
                        self.has_torps = false;
                        self.match_ct = 0;
                        step = ShipStep::Launch { torp_vel: to_home * speed };
                    }
                }
            }
            PathAction::Fill if !self.has_torps => {
                self.path.action_taken();
                step = ShipStep::Fill;
            }
            _ => {}
        }

        self.steer(dt);
        step
    }

    fn steer(&mut self, dt: f64) {
        let diff = self.target - self.pos;
        let dist = diff.length();
        let speed = self.vel.length();
        let max_dv = SHIP_ACCEL * dt;

        if speed > SHIP_PREFERRED_SPEED && dist < STEER_NEAR_DIST {
            self.vel -= self.vel.normalize_or_zero() * max_dv;
            if SHIP_PREFERRED_SPEED - self.vel.length() > 0.01 {
                self.vel = diff.normalize_or_zero() * SHIP_PREFERRED_SPEED;
            }
        } else if dist > STEER_NEAR_DIST && speed * speed / SHIP_ACCEL / 2.0 > dist * STEER_BRAKE_MARGIN {
            self.vel -= self.vel.normalize_or_zero() * max_dv;
        } else if dist > STEER_NEAR_DIST {
            self.vel += diff / dist * max_dv;
        }

        if self.vel.length() > self.max_speed {
            self.vel = self.vel.normalize() * self.max_speed;
        }
    }
}
