//! Single-character torpedoes
//!
//! A torpedo trails its leader while in a chain, flies at the home ship once
//! released, and is pushed outward once its group has been hit by a pulse.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::heading;

pub type TorpedoId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TorpedoState {
    /// Trailing its target point in the chain
    Follow,
    /// Launched at the home ship
    Released,
    /// Dragged away from the home ship after a pulse hit
    Pulsed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxTorpedo {
    pub id: TorpedoId,
    pub ch: char,
    pub pos: DVec2,
    pub vel: DVec2,
    /// Point this torpedo trails while following
    pub target: DVec2,
    /// Gap kept to the target point
    pub min_dist: f64,
    pub state: TorpedoState,
    pub max_speed: f64,
    /// Heading used for drawing
    pub angle: f64,
    /// Set once the torpedo has struck the home ship
    pub hit: bool,
}

impl TxTorpedo {
    /// Create a torpedo sitting on its ship. `lead` marks the first of the chain.
    pub fn new(id: TorpedoId, ch: char, pos: DVec2, vel: DVec2, lead: bool) -> Self {
        Self {
            id,
            ch,
            pos,
            vel,
            target: pos,
            min_dist: if lead { TORP_LEAD_SPACING } else { TORP_SPACING },
            state: TorpedoState::Follow,
            max_speed: TORP_MAX_SPEED,
            angle: 0.0,
            hit: false,
        }
    }

    /// Advance one tick. Returns true when a released torpedo is touching
    /// the home ship at `home`.
    pub fn move_fwd(&mut self, home: DVec2, dt: f64) -> bool {
        match self.state {
            TorpedoState::Released => {
                self.pos += self.vel * dt;
                let speed = self.vel.length();
                let slow = TORP_MAX_ACCEL * dt;
                if speed - slow > TORP_MIN_SPEED {
                    self.vel -= self.vel / speed * slow;
                }
                self.angle = heading(self.vel);
                if self.pos.distance(home) < HOME_CONTACT_RADIUS {
                    self.hit = true;
                    return true;
                }
                false
            }
            TorpedoState::Pulsed => {
                self.pos += (self.pos - home).normalize_or_zero() * self.max_speed * dt;
                false
            }
            TorpedoState::Follow => {
                let mut delta = self.target - self.pos;
                self.angle = heading(delta);
                delta -= delta.normalize_or_zero() * self.min_dist;
                let dist = delta.length();
                let max_dist = self.max_speed * dt;
                if dist > max_dist {
                    self.pos += delta / dist * max_dist;
                } else if dist > self.min_dist {
                    self.pos += delta;
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn test_follow_keeps_spacing() {
        let mut torp = TxTorpedo::new(1, 'a', DVec2::ZERO, DVec2::ZERO, false);
        torp.target = DVec2::new(0.5, 0.0);
        for _ in 0..600 {
            torp.move_fwd(DVec2::new(-5.0, 0.0), DT);
        }
        let gap = torp.target.distance(torp.pos);
        assert!(gap >= TORP_SPACING - 1e-9 && gap < 2.0 * TORP_SPACING, "gap {gap}");
    }

    #[test]
    fn test_follow_speed_capped() {
        let mut torp = TxTorpedo::new(1, 'a', DVec2::ZERO, DVec2::ZERO, true);
        torp.target = DVec2::new(1.0, 0.0);
        torp.move_fwd(DVec2::new(-5.0, 0.0), 0.1);
        assert!((torp.pos.x - TORP_MAX_SPEED * 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_released_decelerates_to_floor() {
        let mut torp = TxTorpedo::new(1, 'a', DVec2::new(-0.9, 0.0), DVec2::new(0.5, 0.0), false);
        torp.state = TorpedoState::Released;
        for _ in 0..60 {
            torp.move_fwd(DVec2::new(5.0, 5.0), DT);
        }
        let speed = torp.vel.length();
        assert!(speed > TORP_MIN_SPEED - 1e-9 && speed <= TORP_MIN_SPEED + TORP_MAX_ACCEL * DT, "speed {speed}");
    }

    #[test]
    fn test_released_contact() {
        let mut torp = TxTorpedo::new(1, 'a', DVec2::new(-0.1, 0.0), DVec2::new(0.3, 0.0), false);
        torp.state = TorpedoState::Released;
        let mut touched = false;
        for _ in 0..30 {
            touched |= torp.move_fwd(DVec2::ZERO, DT);
        }
        assert!(touched);
        assert!(torp.hit);
    }

    #[test]
    fn test_pulsed_moves_away() {
        let mut torp = TxTorpedo::new(1, 'a', DVec2::new(0.3, 0.4), DVec2::ZERO, false);
        torp.state = TorpedoState::Pulsed;
        torp.max_speed = TORP_PULSED_SPEED;
        torp.move_fwd(DVec2::ZERO, 1.0);
        assert!((torp.pos.length() - (0.5 + TORP_PULSED_SPEED)).abs() < 1e-9);
    }
}
