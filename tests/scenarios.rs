use battle_keys::consts::*;
use battle_keys::sim::*;
use glam::DVec2;

const STEP_MS: u64 = 16;

fn new_game(phrase: &str) -> GameState {
    GameState::new(vec![phrase.to_string()], 21, 0)
}

fn type_keys(state: &mut GameState, keys: &str, now_ms: u64) {
    let input = TickInput { keys: keys.chars().collect(), ..Default::default() };
    tick(state, &input, now_ms).unwrap();
}

/// Tick quietly from `from` until `until` holds or `to` is reached.
/// Returns the time of the last tick.
fn run_until(state: &mut GameState, from: u64, to: u64, until: impl Fn(&GameState) -> bool) -> u64 {
    let mut t = from;
    while t < to && state.phase == GamePhase::Playing && !until(state) {
        t += STEP_MS;
        tick(state, &TickInput::default(), t).unwrap();
    }
    t
}

fn group<'a>(state: &'a GameState, seq: &str) -> Option<&'a TorpedoGroup> {
    state.world.groups.iter().find(|g| g.seq == seq)
}

// --- Destruction ---

#[test]
fn single_letter_destroys_ship() {
    let mut state = new_game("a");
    state.world.spawn_hovering("a", DVec2::new(0.5, 0.0), 0).unwrap();

    type_keys(&mut state, "a", STEP_MS);
    assert_eq!(state.stats.points, 1);

    let t = run_until(&mut state, STEP_MS, 2000, |s| group(s, "a").is_some_and(|g| g.locked.is_some()));
    assert!(group(&state, "a").unwrap().locked.is_some());
    assert_eq!(state.stats.combo, "a ");
    assert_eq!(state.stats.points, 1);
    assert!(state.world.ships.values().all(|s| s.exploded));

    let t = run_until(&mut state, t, 12_000, |s| group(s, "a").is_none());
    assert!(t < 12_000, "group lingered until {t}");
    assert!(state.world.ships.is_empty());
}

#[test]
fn full_phrase_clears_wave_then_wins() {
    let mut state = new_game("go home");
    state.world.spawn_hovering("go", DVec2::new(0.5, 0.0), 0).unwrap();
    state.world.spawn_hovering("home", DVec2::new(-0.5, 0.0), 0).unwrap();

    type_keys(&mut state, "gohome", STEP_MS);
    assert_eq!(state.stats.points, 3 + 1 + 1 + 1 + 4);
    let last = state.home.pulses.last().unwrap();
    assert_eq!(last.kind, PulseKind::ClearAll);
    assert!(!state.wave.as_ref().unwrap().can_add);

    let t = run_until(&mut state, STEP_MS, 8000, |s| s.wave.as_ref().is_some_and(|w| w.ships_left == 0));
    assert_eq!(state.wave.as_ref().unwrap().ships_left, 0);
    assert!(state.world.groups.is_empty());
    assert!(state.stats.seen_words.contains_key("go"));
    assert!(state.stats.seen_words.contains_key("home"));

    let t = run_until(&mut state, t, 30_000, |s| s.win_ms.is_some());
    let win_ms = state.win_ms.unwrap();
    run_until(&mut state, t, 30_000, |_| false);
    assert_eq!(state.phase, GamePhase::Summary);
    assert!(state.time_ms > win_ms + WIN_WAIT_MS);
    let summary = state.summary.as_ref().unwrap();
    assert_eq!(summary.status, GameStatus::Win);
    assert!(summary.points >= 10);
}

// --- Combo ---

#[test]
fn stray_key_breaks_combo() {
    let mut state = new_game("x y");
    state.world.spawn_hovering("xx", DVec2::new(0.5, 0.0), 0).unwrap();
    state.world.spawn_hovering("yy", DVec2::new(-0.5, 0.0), 0).unwrap();
    state.stats.add_combo("yy", None);

    type_keys(&mut state, "x", STEP_MS);
    assert_eq!(group(&state, "xx").unwrap().match_ct, 1);
    assert_eq!(state.stats.points, 1);
    assert_eq!(state.stats.combo, "yy ");

    type_keys(&mut state, "z", 2 * STEP_MS);
    assert!(state.world.groups.iter().all(|g| g.match_ct == 0));
    assert!(state.stats.combo.is_empty());
    // The broken combo is banked
    assert_eq!(state.stats.points, 1 + 3);
}

// --- Launch and refill ---

/// A straight run from left of home, heading right through it
fn approach_path() -> FlightPath {
    FlightPath::new(vec![
        FlightPoint::new(-0.5, 0.0, PathAction::None),
        FlightPoint::new(10.0, 0.0, PathAction::None),
        FlightPoint::new(10.0, 1.0, PathAction::None),
    ])
    .unwrap()
}

fn ship_at_launch(world: &mut World, speed: f64) -> ShipId {
    let id = world.spawn_ship("go", approach_path(), 0, 0);
    let ship = world.ships.get_mut(&id).unwrap();
    ship.vel = DVec2::new(speed, 0.0);
    ship.path.force_action(PathAction::Launch);
    id
}

#[test]
fn slow_ship_holds_its_torpedoes() {
    let mut world = World::new(3);
    let view = BattleView::default();
    let ship = ship_at_launch(&mut world, 0.1);
    let now = SHIP_MIN_LAUNCH_DELAY_MS as u64 + 1000;

    world.move_all(DVec2::ZERO, &view, now, STEP_MS);

    let ship = &world.ships[&ship];
    assert!(ship.has_torps);
    assert_eq!(ship.path.action(), PathAction::None);
    let group = world.groups.get(ship.group).unwrap();
    assert_eq!(group.parent, Some(ship.id));
    assert!(group.torps.iter().all(|t| t.state != TorpedoState::Released));
    assert_eq!(world.groups.len(), 1);
}

#[test]
fn fast_ship_launches_and_keeps_flying() {
    let mut world = World::new(3);
    let view = BattleView::default();
    let ship_id = ship_at_launch(&mut world, SHIP_PREFERRED_SPEED);
    let first_group = world.ships[&ship_id].group;
    let now = SHIP_MIN_LAUNCH_DELAY_MS as u64 + 1000;

    world.move_all(DVec2::ZERO, &view, now, STEP_MS);

    let ship = &world.ships[&ship_id];
    assert!(!ship.has_torps);
    assert_ne!(ship.group, first_group);
    let launched = world.groups.get(first_group).unwrap();
    assert_eq!(launched.parent, None);
    assert!(launched.torps.iter().all(|t| t.state == TorpedoState::Released));
    let empty = world.groups.get(ship.group).unwrap();
    assert!(empty.seq.is_empty());
    assert_eq!(empty.parent, Some(ship_id));
}

#[test]
fn empty_ship_refills_at_fill_marker() {
    let mut state = new_game("go home");
    let ship_id = state.world.spawn_hovering("", DVec2::new(0.5, 0.0), 0).unwrap();
    let empty_group = state.world.ships[&ship_id].group;
    assert!(!state.world.ships[&ship_id].has_torps);
    state.world.ships.get_mut(&ship_id).unwrap().path.force_action(PathAction::Fill);

    let expected = state.wave.clone().unwrap().get_word(&state.world.groups);
    tick(&mut state, &TickInput::default(), STEP_MS).unwrap();

    let ship = &state.world.ships[&ship_id];
    assert!(ship.has_torps);
    assert_eq!(ship.seq, expected);
    assert!(state.world.groups.get(empty_group).is_none());
    let group = state.world.groups.get(ship.group).unwrap();
    assert_eq!(group.seq, expected);
    assert_eq!(group.torps.len(), expected.chars().count());
    assert_eq!(group.parent, Some(ship_id));
}

// --- Health ---

/// Park released torpedoes on top of the home ship
fn torpedoes_on_home(state: &mut GameState, seq: &str, x: f64) {
    let ship = state.world.spawn_hovering(seq, DVec2::new(x, 0.5), 0).unwrap();
    let group_id = state.world.ships[&ship].group;
    let group = state.world.groups.get_mut(group_id).unwrap();
    for (i, torp) in group.torps.iter_mut().enumerate() {
        torp.state = TorpedoState::Released;
        torp.pos = DVec2::new(0.005 * i as f64, 0.0);
        torp.vel = DVec2::ZERO;
    }
}

#[test]
fn five_hits_end_the_game() {
    let mut state = new_game("a");
    torpedoes_on_home(&mut state, "abcd", 0.5);
    tick(&mut state, &TickInput::default(), STEP_MS).unwrap();
    assert_eq!(state.home.health, 1);
    assert!(state.home.is_shaking(STEP_MS));

    // Same torpedoes again do no further damage
    tick(&mut state, &TickInput::default(), 2 * STEP_MS).unwrap();
    assert_eq!(state.home.health, 1);

    torpedoes_on_home(&mut state, "e", -0.5);
    let hit_ms = 3 * STEP_MS;
    tick(&mut state, &TickInput::default(), hit_ms).unwrap();
    assert_eq!(state.home.health, 0);
    assert_eq!(state.home.explode_ms, Some(hit_ms));
    assert_eq!(state.home.ship_status(hit_ms), -1);

    run_until(&mut state, hit_ms, 10_000, |_| false);
    assert_eq!(state.phase, GamePhase::Summary);
    assert!(state.time_ms > hit_ms + EXPLODE_ANIM_MS + GAME_OVER_FADE_MS);
    assert_eq!(state.summary.as_ref().unwrap().status, GameStatus::Loss);
}
