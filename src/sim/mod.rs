//! Game core
//!
//! Ships, torpedo chains, pulses and waves. Kept free of wall-clock reads and
//! drawing so a game replays exactly:
//! - Time arrives as `now_ms` on every call
//! - One seeded generator per game, owned by the `World`
//! - Entities live in ordered maps keyed by ID or sequence

pub mod enemy;
pub mod error;
pub mod flight_path;
pub mod group;
pub mod home;
pub mod pulse;
pub mod state;
pub mod stats;
pub mod tick;
pub mod torpedo;
pub mod view;
pub mod wave;
pub mod world;

pub use enemy::{EnemyShip, ShipStep};
pub use error::SimError;
pub use flight_path::{FlightPath, FlightPoint, PathAction};
pub use group::{MatchEffect, TorpedoGroup, TorpedoGroups};
pub use home::{HomeShip, is_pulse_char};
pub use pulse::{Pulse, PulseId, PulseKind};
pub use state::{GamePhase, GameState};
pub use stats::{GameStat, GameStatus, Summary};
pub use tick::{TickInput, tick};
pub use torpedo::{TorpedoId, TorpedoState, TxTorpedo};
pub use view::BattleView;
pub use wave::{AttackWave, tag_track};
pub use world::{Battle, GroupId, MoveReport, ShipId, World};
