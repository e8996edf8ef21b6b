//! Battle Keys - a real-time typing shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (flight paths, torpedo chains, pulses, waves)
//! - `snapshot`: Read-only per-frame view handed to a presentation layer
//! - `runner`: Tick thread, input queue and clock wiring
//! - `settings`: Runtime configuration
//! - `phrases`: Phrase file loading

pub mod clock;
pub mod phrases;
pub mod runner;
pub mod settings;
pub mod sim;
pub mod snapshot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use runner::{GameEvent, GameRunner, RunOutcome};
pub use settings::Settings;
pub use snapshot::FrameSnapshot;

use glam::DVec2;
use std::f64::consts::{PI, TAU};

/// Game configuration constants
///
/// Distances are in battle-space units (bsu), speeds in bsu/s, times in ms.
pub mod consts {
    // --- Loop ---
    /// Target tick rate of the director
    pub const TICK_HZ: u32 = 60;
    /// Bounded input queue size
    pub const EVENT_QUEUE_CAPACITY: usize = 256;

    // --- View ---
    /// Side of the square play window centred on the home ship
    pub const VIEW_SIZE: f64 = 2.0;
    /// Height of the status bar under the play field (pixels)
    pub const BOTTOM_BAR_PX: u32 = 50;
    /// Share of the smaller window dimension used by the play field
    pub const VIEW_FILL: f64 = 0.9;

    // --- Enemy ships ---
    pub const SHIP_MAX_SPEED: f64 = 0.5;
    pub const SHIP_PREFERRED_SPEED: f64 = 0.4;
    pub const SHIP_ACCEL: f64 = 0.8;
    /// Speed of a destroyed ship leaving the field
    pub const SHIP_FLYOFF_SPEED: f64 = 0.8;
    /// Below this speed a launch is suppressed
    pub const SHIP_MIN_LAUNCH_SPEED: f64 = 0.3;
    /// A ship may not launch until this long after its start
    pub const SHIP_MIN_LAUNCH_DELAY_MS: i64 = 5000;
    /// Normalised heading·(home − pos) needed before launching
    pub const LAUNCH_ALIGNMENT: f64 = 0.95;
    /// Closer than this to the path target the ship stops accelerating
    pub const STEER_NEAR_DIST: f64 = 0.1;
    /// Brake once the stopping distance passes this share of the gap
    pub const STEER_BRAKE_MARGIN: f64 = 0.8;
    /// Chance a LAUNCH vertex actually proposes a launch
    pub const LAUNCH_KEEP_CHANCE: f64 = 0.3;

    // --- Torpedoes ---
    pub const TORP_MAX_SPEED: f64 = 0.5;
    /// Speed of every torpedo in a locked group
    pub const TORP_PULSED_SPEED: f64 = 0.5;
    pub const TORP_MAX_ACCEL: f64 = 1.0;
    /// Released torpedoes never slow below this
    pub const TORP_MIN_SPEED: f64 = 0.1;
    /// Spacing between the ship and the first torpedo
    pub const TORP_LEAD_SPACING: f64 = 0.03;
    /// Spacing between consecutive torpedoes
    pub const TORP_SPACING: f64 = 0.04;

    // --- Home ship ---
    pub const HOME_MAX_HEALTH: u32 = 5;
    pub const HOME_CONTACT_RADIUS: f64 = 0.06;
    /// Aiming turn rate (rad/ms)
    pub const HOME_TURN_RATE: f64 = 0.003;
    /// Idle spin rate (rad/ms)
    pub const HOME_IDLE_TURN_RATE: f64 = 0.001;
    pub const EXPLODE_ANIM_MS: u64 = 1000;
    pub const GAME_OVER_FADE_MS: u64 = 2000;
    pub const DAMAGE_SHAKE_MS: u64 = 1000;
    /// Window in which a repeat hit restarts the explosion
    pub const EXPLODE_RENEW_MIN_MS: u64 = 500;

    // --- Pulses ---
    pub const PULSE_SPEED: f64 = 1.5;
    pub const PULSE_CLEAR_MS: u64 = 10_000;
    pub const PULSE_ANIM_MS: u64 = 750;
    /// Symbols accepted as typed input besides letters and digits
    pub const PULSE_SYMBOLS: &str = "!@#$%^&*()-=_+[]\\{}|;':\",./<>?";

    // --- Waves ---
    pub const WAVE_SHIPS: u32 = 20;
    pub const WAVE_PAUSE_MS: u64 = 3000;
    pub const WAVE_BANNER_ANIM_MS: u64 = 500;
    /// Add a ship at least this often
    pub const WAVE_ADD_INTERVAL_MS: u64 = 5000;
    /// Ships spawned when the field is empty
    pub const WAVE_REFILL_BATCH: u32 = 5;
    /// Start delay between ships of one batch
    pub const SHIP_STAGGER_MS: u64 = 1000;
    /// Path rotation between ships of one batch (radians)
    pub const SHIP_ANGLE_STEP: f64 = 0.2;
    /// Wait after the last wave before the summary
    pub const WIN_WAIT_MS: u64 = 10_000;
    /// Words listed on the summary screen
    pub const SUMMARY_TOP_WORDS: usize = 20;
}

/// Normalize angle to (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Signed shortest turn from `from` to `to`
#[inline]
pub fn delta_angle(to: f64, from: f64) -> f64 {
    normalize_angle(to - from)
}

/// Z component of the 3D cross product of two plane vectors
#[inline]
pub fn cross_z(a: DVec2, b: DVec2) -> f64 {
    a.perp_dot(b)
}

/// Rotate `point` about `pivot` by `theta` radians
#[inline]
pub fn rotate_about(point: DVec2, theta: f64, pivot: DVec2) -> DVec2 {
    pivot + DVec2::from_angle(theta).rotate(point - pivot)
}

/// Heading of a vector
#[inline]
pub fn heading(v: DVec2) -> f64 {
    v.y.atan2(v.x)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f64, theta: f64) -> DVec2 {
    DVec2::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_angle_bounds() {
        assert!((normalize_angle(PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-9);
        assert!((normalize_angle(0.25) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_delta_angle_wraps() {
        let d = delta_angle(-3.0, 3.0);
        assert!((d - (TAU - 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_cross_z_sign() {
        assert!(cross_z(DVec2::X, DVec2::Y) > 0.0);
        assert!(cross_z(DVec2::Y, DVec2::X) < 0.0);
    }

    #[test]
    fn test_rotate_about_pivot() {
        let p = rotate_about(DVec2::new(2.0, 1.0), PI / 2.0, DVec2::new(1.0, 1.0));
        assert!((p - DVec2::new(1.0, 2.0)).length() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_normalize_angle_in_range(a in -100.0f64..100.0) {
            let n = normalize_angle(a);
            prop_assert!(n > -PI - 1e-12 && n <= PI + 1e-12);
            let turns = (a - n) / TAU;
            prop_assert!((turns - turns.round()).abs() < 1e-6);
        }
    }
}
