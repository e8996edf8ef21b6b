//! Simulation errors
//!
//! Raised when a tick finds the world in a state it can never legally reach.

use std::fmt;

use super::world::{GroupId, ShipId};

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Flight path with fewer than two vertices or zero length
    DegeneratePath { points: usize },
    NonFiniteShip { ship: ShipId },
    ShipOverspeed { ship: ShipId, speed: f64, max: f64 },
    NonFiniteTorpedo { group: GroupId },
    MatchCountOutOfRange { group: GroupId, match_ct: usize, len: usize },
    NonFiniteHome,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::DegeneratePath { points } => {
                write!(f, "flight path with {points} points has no length")
            }
            SimError::NonFiniteShip { ship } => write!(f, "ship {ship} has a non-finite position or velocity"),
            SimError::ShipOverspeed { ship, speed, max } => {
                write!(f, "ship {ship} moving at {speed:.4} exceeds its cap of {max:.4}")
            }
            SimError::NonFiniteTorpedo { group } => {
                write!(f, "group {group} holds a torpedo with a non-finite position")
            }
            SimError::MatchCountOutOfRange { group, match_ct, len } => {
                write!(f, "group {group} match count {match_ct} exceeds its sequence length {len}")
            }
            SimError::NonFiniteHome => write!(f, "home ship heading is not finite"),
        }
    }
}

impl std::error::Error for SimError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_entity() {
        let err = SimError::ShipOverspeed { ship: 7, speed: 0.61, max: 0.5 };
        let msg = err.to_string();
        assert!(msg.contains("ship 7"));
        assert!(msg.contains("0.6100"));
    }
}
