//! Per-frame read-only view of the game
//!
//! Built at the end of a tick and handed to whatever draws the frame, so a
//! renderer on another thread never sees state mid-update.

use glam::DVec2;
use serde::Serialize;

use crate::sim::{GamePhase, GameState, PulseKind, Summary, TorpedoState};

#[derive(Debug, Clone, Serialize)]
pub struct HomePose {
    pub pos: DVec2,
    pub angle: f64,
    pub health: u32,
    pub shaking: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PulseView {
    pub center: DVec2,
    pub radius: f64,
    pub age_ms: u64,
    pub kind: PulseKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct TorpedoView {
    pub ch: char,
    pub pos: DVec2,
    pub angle: f64,
    pub state: TorpedoState,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShipView {
    pub pos: DVec2,
    pub heading: f64,
    pub exploded: bool,
    /// Time since the ship was destroyed
    pub explode_age_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub seq: String,
    pub match_ct: usize,
    pub locked: bool,
    pub parent: Option<ShipView>,
    pub torpedoes: Vec<TorpedoView>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct WaveBanner {
    pub wave_number: u32,
    pub age_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    /// Seed of the game this frame belongs to
    pub seed: u64,
    pub time_ms: u64,
    pub phase: GamePhase,
    pub wave_number: u32,
    pub home: HomePose,
    pub pulses: Vec<PulseView>,
    pub groups: Vec<GroupView>,
    pub wave_banner: Option<WaveBanner>,
    pub combo: String,
    pub points: u64,
    /// Characters of the live pulses
    pub active_input: String,
    pub summary: Option<Summary>,
    pub halt_reason: Option<String>,
}

impl FrameSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let now = state.time_ms;
        let home = &state.home;

        let pulses = home
            .pulses
            .iter()
            .map(|p| PulseView { center: p.center, radius: p.rad, age_ms: p.age_ms(now), kind: p.kind })
            .collect();

        let groups = state
            .world
            .groups
            .iter()
            .map(|g| GroupView {
                seq: g.seq.clone(),
                match_ct: g.match_ct,
                locked: g.locked.is_some(),
                parent: g.parent.and_then(|id| state.world.ships.get(&id)).map(|s| ShipView {
                    pos: s.pos,
                    heading: s.heading(),
                    exploded: s.exploded,
                    explode_age_ms: s.explode_ms.map(|t| now.saturating_sub(t)),
                }),
                torpedoes: g
                    .torps
                    .iter()
                    .map(|t| TorpedoView { ch: t.ch, pos: t.pos, angle: t.angle, state: t.state })
                    .collect(),
            })
            .collect();

        let wave_banner = state.wave.as_ref().and_then(|w| {
            w.banner_age(now).map(|age_ms| WaveBanner { wave_number: w.wave_number, age_ms })
        });

        Self {
            seed: state.seed(),
            time_ms: now,
            phase: state.phase,
            wave_number: state.wave_count,
            home: HomePose {
                pos: home.pos,
                angle: home.angle,
                health: home.health,
                shaking: home.is_shaking(now),
            },
            pulses,
            groups,
            wave_banner,
            combo: state.stats.combo.clone(),
            points: state.stats.points,
            active_input: home.active.clone(),
            summary: state.summary.clone(),
            halt_reason: state.halt_reason.clone(),
        }
    }
}
