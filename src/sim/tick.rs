//! Fixed-step simulation tick
//!
//! Order within a tick: queued keystrokes, wave pacing, group advance,
//! focus selection, home ship aim and pulse advance.

use super::error::SimError;
use super::state::{GamePhase, GameState};
use super::stats::GameStatus;
use crate::consts::WIN_WAIT_MS;

/// Input commands gathered for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Typed characters, oldest first
    pub keys: Vec<char>,
    /// Leave the game for the title screen
    pub quit: bool,
}

/// Advance the game to `now_ms`.
///
/// On a broken invariant the offending entity is culled, the game moves to
/// `Halted` and the error is returned.
pub fn tick(state: &mut GameState, input: &TickInput, now_ms: u64) -> Result<(), SimError> {
    if input.quit {
        if state.phase == GamePhase::Playing {
            log::info!("Player quit during wave {}", state.wave_count);
            state.phase = GamePhase::Title;
        }
        return Ok(());
    }
    if state.phase != GamePhase::Playing {
        return Ok(());
    }

    let delta_ms = now_ms.saturating_sub(state.time_ms);
    state.time_ms = now_ms;
    state.tick_count += 1;

    for &ch in &input.keys {
        state.type_char(ch, now_ms);
    }

    if let Err(err) = step(state, now_ms, delta_ms).and_then(|()| state.validate()) {
        state.world.cull(&err);
        state.halt(&err);
        return Err(err);
    }
    Ok(())
}

fn step(state: &mut GameState, now_ms: u64, delta_ms: u64) -> Result<(), SimError> {
    // 1. Wave pacing
    let home_pos = state.home.pos;
    let complete = match state.wave.as_mut() {
        Some(wave) => wave.update(&mut state.world, home_pos, now_ms)?,
        None => true,
    };
    if complete && !state.advance_phrase(now_ms) {
        match state.win_ms {
            None => {
                log::info!("Last wave complete");
                state.win_ms = Some(now_ms);
            }
            Some(t) if now_ms.saturating_sub(t) > WIN_WAIT_MS => {
                state.finish(GameStatus::Win);
                return Ok(());
            }
            Some(_) => {}
        }
    }

    // 2. Groups and their ships
    let report = state.world.move_all(home_pos, &state.view, now_ms, delta_ms);
    for torp in report.hits {
        state.home.cause_damage(torp, now_ms, state.wave.as_mut());
    }
    if let Some(wave) = state.wave.as_mut() {
        for ship in report.fills {
            let word = wave.get_word(&state.world.groups);
            state.world.refill(ship, &word, now_ms);
        }
    }

    // 3. Focus
    let focus = state.world.focused_target(home_pos);

    // 4. Home ship and pulses
    let (home, mut battle, view) = state.split();
    home.move_fwd(focus, &mut battle, view, now_ms, delta_ms);

    if state.home.ship_status(now_ms) == 0 {
        state.finish(GameStatus::Loss);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;

    fn new_state(lines: &[&str], seed: u64) -> GameState {
        GameState::new(lines.iter().map(|s| s.to_string()).collect(), seed, 0)
    }

    fn run(state: &mut GameState, from: u64, to: u64) {
        let mut t = from;
        while t < to && state.phase == GamePhase::Playing {
            t += 16;
            tick(state, &TickInput::default(), t).unwrap();
        }
    }

    #[test]
    fn test_quiet_during_wave_pause() {
        let mut state = new_state(&["alpha beta"], 1);
        run(&mut state, 0, WAVE_PAUSE_MS - 20);
        assert!(state.world.ships.is_empty());
        run(&mut state, WAVE_PAUSE_MS - 20, WAVE_PAUSE_MS + 40);
        assert_eq!(state.world.ships.len(), WAVE_REFILL_BATCH as usize);
    }

    #[test]
    fn test_quit_returns_to_title() {
        let mut state = new_state(&["alpha"], 1);
        let input = TickInput { quit: true, ..Default::default() };
        tick(&mut state, &input, 16).unwrap();
        assert_eq!(state.phase, GamePhase::Title);
        let before = state.tick_count;
        tick(&mut state, &TickInput::default(), 32).unwrap();
        assert_eq!(state.tick_count, before);
    }

    #[test]
    fn test_keys_applied_before_step() {
        let mut state = new_state(&["alpha"], 1);
        let input = TickInput { keys: vec!['a', ' ', 'l'], ..Default::default() };
        tick(&mut state, &input, 16).unwrap();
        assert_eq!(state.home.active, "al");
        assert_eq!(state.home.pulses.len(), 2);
        assert!(state.home.pulses.iter().all(|p| p.rad > 0.0));
    }

    #[test]
    fn test_invariant_violation_halts() {
        let mut state = new_state(&["alpha"], 1);
        let ship = state.world.spawn_hovering("ab", glam::DVec2::new(0.5, 0.0), 0).unwrap();
        state.world.ships.get_mut(&ship).unwrap().pos.x = f64::NAN;
        let err = tick(&mut state, &TickInput::default(), 16).unwrap_err();
        assert_eq!(err, SimError::NonFiniteShip { ship });
        assert_eq!(state.phase, GamePhase::Halted);
        assert!(state.world.ships.is_empty());
        assert!(state.halt_reason.is_some());
    }

    #[test]
    fn test_determinism() {
        let mut a = new_state(&["go home", "alpha beta"], 99);
        let mut b = new_state(&["go home", "alpha beta"], 99);
        let mut t = 0;
        for i in 0..900u64 {
            t += 16;
            let keys = if i % 37 == 0 { vec!['g', 'o'] } else { Vec::new() };
            let input = TickInput { keys, ..Default::default() };
            tick(&mut a, &input, t).unwrap();
            tick(&mut b, &input, t).unwrap();
        }
        assert_eq!(a.stats.points, b.stats.points);
        assert_eq!(a.world.ships.len(), b.world.ships.len());
        for (sa, sb) in a.world.ships.values().zip(b.world.ships.values()) {
            assert_eq!(sa.pos, sb.pos);
            assert_eq!(sa.seq, sb.seq);
        }
        assert_eq!(a.home.angle, b.home.angle);
    }

    #[test]
    fn test_invariants_hold_over_long_run() {
        let mut state = new_state(&["the quick brown fox"], 5);
        let mut t = 0;
        for _ in 0..3000 {
            t += 16;
            tick(&mut state, &TickInput::default(), t).unwrap();
            for group in state.world.groups.iter() {
                assert!(group.match_ct <= group.seq_len());
            }
            for ship in state.world.ships.values() {
                assert!(ship.vel.length() <= ship.max_speed + 1e-9);
            }
            if state.phase != GamePhase::Playing {
                break;
            }
        }
    }
}
