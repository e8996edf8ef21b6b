//! Closed flight loops sampled by arc length
//!
//! A path is a polyline whose last vertex repeats the first. Each vertex
//! carries the cumulative distance travelled to reach it, so a fraction of
//! the loop maps straight onto a point with one scan.

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::SimError;
use crate::consts::LAUNCH_KEEP_CHANCE;
use crate::rotate_about;

/// Action a ship is asked to take on reaching a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathAction {
    #[default]
    None,
    /// Fire the torpedo chain at the home ship
    Launch,
    /// Load a fresh torpedo chain
    Fill,
}

/// A vertex of a flight path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightPoint {
    pub pos: DVec2,
    pub action: PathAction,
    /// Arc length from the first vertex
    pub dist_to: f64,
}

impl FlightPoint {
    pub fn new(x: f64, y: f64, action: PathAction) -> Self {
        Self { pos: DVec2::new(x, y), action, dist_to: 0.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightPath {
    points: Vec<FlightPoint>,
    total_dist: f64,
    /// Segment sampled on the previous call to `target_pos`
    last_idx: usize,
    pending: PathAction,
}

impl FlightPath {
    /// Build a closed loop from its distinct vertices.
    pub fn new(vertices: Vec<FlightPoint>) -> Result<Self, SimError> {
        let count = vertices.len();
        let Some(&first) = vertices.first() else {
            return Err(SimError::DegeneratePath { points: 0 });
        };
        let mut points = vertices;
        points.push(first);

        let mut total = 0.0;
        points[0].dist_to = 0.0;
        for i in 1..points.len() {
            total += points[i].pos.distance(points[i - 1].pos);
            points[i].dist_to = total;
        }
        if !(total > 0.0 && total.is_finite()) {
            return Err(SimError::DegeneratePath { points: count });
        }

        Ok(Self { points, total_dist: total, last_idx: 0, pending: PathAction::None })
    }

    /// New path with every vertex rotated by `theta` about `pivot`.
    pub fn rotated(&self, theta: f64, pivot: DVec2) -> Result<Self, SimError> {
        let vertices = self.points[..self.points.len() - 1]
            .iter()
            .map(|p| FlightPoint { pos: rotate_about(p.pos, theta, pivot), ..*p })
            .collect();
        Self::new(vertices)
    }

    pub fn total_dist(&self) -> f64 {
        self.total_dist
    }

    /// Vertices including the closing duplicate
    pub fn points(&self) -> &[FlightPoint] {
        &self.points
    }

    /// Segment index and point at `frac` of the loop
    fn locate(&self, frac: f64) -> (usize, DVec2) {
        let dist = frac.rem_euclid(1.0) * self.total_dist;
        for (i, pair) in self.points.windows(2).enumerate() {
            let (curr, next) = (&pair[0], &pair[1]);
            if next.dist_to > dist {
                let t = (dist - curr.dist_to) / (next.dist_to - curr.dist_to);
                return (i, curr.pos.lerp(next.pos, t));
            }
        }
        (0, self.points[0].pos)
    }

    /// Point at `frac` of the loop without touching the action latch
    pub fn sample(&self, frac: f64) -> DVec2 {
        self.locate(frac).1
    }

    /// Point at `frac` of the loop.
    ///
    /// Entering a new segment latches that segment's starting action. LAUNCH
    /// survives the latch only with probability `LAUNCH_KEEP_CHANCE`.
    pub fn target_pos<R: Rng + ?Sized>(&mut self, frac: f64, rng: &mut R) -> DVec2 {
        let (idx, pos) = self.locate(frac);
        if idx != self.last_idx {
            self.last_idx = idx;
            self.pending = match self.points[idx].action {
                PathAction::Launch if !rng.random_bool(LAUNCH_KEEP_CHANCE) => PathAction::None,
                action => action,
            };
        }
        pos
    }

    /// Action latched at the last segment change
    pub fn action(&self) -> PathAction {
        self.pending
    }

    pub fn action_taken(&mut self) {
        self.pending = PathAction::None;
    }

    /// Latch an action directly, as if its segment had just been entered.
    /// Test support.
    #[doc(hidden)]
    pub fn force_action(&mut self, action: PathAction) {
        self.pending = action;
    }
}
