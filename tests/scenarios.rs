//! End-to-end sessions driven through the public API

use glam::Vec2;

use neon_runner::consts::{FRAME_MS, LEVEL_COMPLETE_BONUS, STARTING_LIVES};
use neon_runner::sim::{Enemy, GameEvent, PerturbationTag, TickInput, Viewport};
use neon_runner::{Difficulty, Phase, Session, Settings};

const VIEW: Viewport = Viewport::new(1280.0, 720.0);
const IDLE: TickInput = TickInput {
    left: false,
    right: false,
    jump: false,
};

fn session_at(settings: Settings, level: u32) -> Session {
    let mut session = Session::new(settings, 2024);
    session.resize(VIEW);
    session.select_level(level).unwrap();
    session
}

/// Run idle frames covering `ms` of host time
fn run_ms(session: &mut Session, ms: f64) -> Vec<GameEvent> {
    let frames = (ms / FRAME_MS).ceil() as u32;
    (0..frames)
        .flat_map(|_| session.frame(FRAME_MS, &IDLE))
        .collect()
}

fn fall_off(session: &mut Session) -> Vec<GameEvent> {
    let world = session.world_mut().unwrap();
    world.player.pos.y = world.viewport.height + 10.0;
    session.frame(FRAME_MS, &IDLE)
}

#[test]
fn collect_everything_and_exit() {
    let mut session = session_at(Settings::default(), 1);
    let total = session.world().unwrap().total_dots();
    assert_eq!(total, 3);

    for i in 0..total as usize {
        let world = session.world_mut().unwrap();
        world.player.pos = world.pickups[i].pos - world.player.size / 2.0;
        world.player.vel = Vec2::ZERO;
        let events = session.frame(FRAME_MS, &IDLE);
        assert!(events.contains(&GameEvent::ScoreChanged {
            score: 10 * (i as u64 + 1)
        }));
        assert_eq!(session.phase(), Phase::Playing);
    }

    let world = session.world_mut().unwrap();
    assert!(world.exit_active());
    world.player.pos = Vec2::new(world.exit.x, world.exit.y);
    let events = session.frame(FRAME_MS, &IDLE);

    assert_eq!(session.phase(), Phase::LevelComplete);
    assert_eq!(session.state().score, 3 * 10 + LEVEL_COMPLETE_BONUS);
    assert!(events.contains(&GameEvent::LevelCompleted {
        level: 1,
        score: 130
    }));
    assert_eq!(session.state().unlocked_levels, 2);
}

#[test]
fn walking_right_collects_pickup() {
    let mut session = session_at(Settings::default(), 1);
    run_ms(&mut session, 600.0);

    let world = session.world_mut().unwrap();
    assert!(world.player.grounded);
    let ahead = world.player.center() + Vec2::new(3.0 * world.tile_size, 0.0);
    world.pickups[0].pos = ahead;

    let right = TickInput {
        right: true,
        ..IDLE
    };
    let mut frames = 0;
    while !session.world().unwrap().pickups[0].collected {
        assert!(frames < 120, "never reached the pickup");
        let events = session.frame(FRAME_MS, &right);
        frames += 1;
        if events.contains(&GameEvent::ScoreChanged { score: 10 }) {
            break;
        }
    }

    assert!(frames > 1);
    assert!(session.world().unwrap().pickups[0].collected);
    assert_eq!(session.state().score, 10);
    assert!(session.world().unwrap().player.pos.x > 2.0 * 36.0);
}

#[test]
fn falling_reloads_level_and_keeps_score() {
    let mut session = session_at(Settings::default(), 1);

    let world = session.world_mut().unwrap();
    world.player.pos = world.pickups[0].pos - world.player.size / 2.0;
    world.player.vel = Vec2::ZERO;
    session.frame(FRAME_MS, &IDLE);
    assert_eq!(session.state().score, 10);

    let events = fall_off(&mut session);
    assert_eq!(events[0], GameEvent::LifeLost { lives: 2 });
    assert!(events.contains(&GameEvent::LevelLoaded {
        level: 1,
        total_dots: 3
    }));
    assert_eq!(session.phase(), Phase::Playing);
    assert_eq!(session.state().lives, 2);
    assert_eq!(session.state().score, 10);

    let world = session.world().unwrap();
    assert_eq!(world.collected_count(), 0);
    assert_eq!(world.player.vel, Vec2::ZERO);
}

#[test]
fn last_life_on_enemy_is_game_over() {
    let mut session = session_at(Settings::default(), 1);
    fall_off(&mut session);
    fall_off(&mut session);
    assert_eq!(session.state().lives, 1);

    let world = session.world_mut().unwrap();
    let rect = world.player.rect();
    world.enemies.push(Enemy {
        rect,
        vx: 0.0,
        direction: 1.0,
    });
    let events = session.frame(FRAME_MS, &IDLE);

    assert_eq!(session.phase(), Phase::GameOver);
    assert_eq!(session.state().lives, 0);
    assert!(events.contains(&GameEvent::GameOver { score: 0 }));
    assert!(session.frame(FRAME_MS, &IDLE).is_empty());

    session.restart().unwrap();
    assert_eq!(session.phase(), Phase::Playing);
    assert_eq!(session.state().lives, STARTING_LIVES);
}

#[test]
fn invisible_platform_stays_solid_then_returns() {
    let mut settings = Settings::with_difficulty(Difficulty::Medium);
    settings.unlock_all_levels = true;
    let mut session = session_at(settings, 11);
    session.world_mut().unwrap().enemies.clear();

    let events = run_ms(&mut session, 3600.0);
    assert!(events.contains(&GameEvent::TrollActivated {
        tag: PerturbationTag::Speed,
        message: "⚡ Speed Boost!",
        toast_ms: 2800.0
    }));
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::TrollActivated {
            tag: PerturbationTag::Invisible,
            ..
        }
    )));

    let world = session.world_mut().unwrap();
    assert_eq!(world.perturbation.speed_multiplier, 1.8);
    assert_eq!(world.invisible_platforms.len(), 1);
    let hidden = *world.invisible_platforms.iter().next().unwrap();
    assert!(world.is_platform_hidden(hidden));

    // Stand on the hidden platform
    let top = world.platforms[hidden].rect;
    world.player.pos = Vec2::new(top.x + 1.0, top.y - world.player.size.y);
    world.player.vel = Vec2::ZERO;
    run_ms(&mut session, 500.0);
    let world = session.world().unwrap();
    assert!(world.player.grounded);
    assert_eq!(world.player.rect().bottom(), top.y);

    // Speed reverts at 6000 ms, invisibility at 9000 ms
    let events = run_ms(&mut session, 5100.0);
    assert!(events.contains(&GameEvent::TrollReverted {
        tag: PerturbationTag::Speed
    }));
    assert!(events.contains(&GameEvent::TrollReverted {
        tag: PerturbationTag::Invisible
    }));
    let world = session.world().unwrap();
    assert!(world.perturbation.is_neutral());
    assert!(world.invisible_platforms.is_empty());
    assert!(!world.is_platform_hidden(hidden));
    assert_eq!(session.phase(), Phase::Playing);
}

#[test]
fn reload_discards_pending_trolls() {
    let mut settings = Settings::with_difficulty(Difficulty::Medium);
    settings.unlock_all_levels = true;
    let mut session = session_at(settings, 16);
    session.world_mut().unwrap().enemies.clear();

    run_ms(&mut session, 2500.0);
    assert_eq!(session.world().unwrap().perturbation.speed_multiplier, 1.8);

    fall_off(&mut session);
    let world = session.world_mut().unwrap();
    world.enemies.clear();
    assert!(world.perturbation.is_neutral());
    assert!(world.decoy_exits.is_empty());

    // The first load's reverse timer would have fired 500 ms into this one
    let events = run_ms(&mut session, 1500.0);
    assert!(!events.iter().any(|e| matches!(
        e,
        GameEvent::TrollActivated {
            tag: PerturbationTag::Reverse | PerturbationTag::Speed,
            ..
        }
    )));
    assert!(!session.world().unwrap().perturbation.controls_reversed);
}

#[test]
fn decoy_exit_does_not_complete_level() {
    let mut settings = Settings::with_difficulty(Difficulty::Medium);
    settings.unlock_all_levels = true;
    let mut session = session_at(settings, 16);
    session.world_mut().unwrap().enemies.clear();

    run_ms(&mut session, 600.0);
    let world = session.world_mut().unwrap();
    assert_eq!(world.decoy_exits.len(), 1);
    for pickup in &mut world.pickups {
        pickup.collected = true;
    }
    let decoy = world.decoy_exits[0];
    world.player.pos = Vec2::new(decoy.x, decoy.y);
    world.player.vel = Vec2::ZERO;
    session.frame(FRAME_MS, &IDLE);
    assert_eq!(session.phase(), Phase::Playing);

    let world = session.world_mut().unwrap();
    world.player.pos = Vec2::new(world.exit.x, world.exit.y);
    session.frame(FRAME_MS, &IDLE);
    assert_eq!(session.phase(), Phase::LevelComplete);
}

#[test]
fn menu_round_trip_keeps_progress() {
    let mut session = session_at(Settings::default(), 1);
    let world = session.world_mut().unwrap();
    for pickup in &mut world.pickups {
        pickup.collected = true;
    }
    world.player.pos = Vec2::new(world.exit.x, world.exit.y);
    session.frame(FRAME_MS, &IDLE);

    session.return_to_menu();
    assert_eq!(session.phase(), Phase::MainMenu);
    assert_eq!(session.state().score, LEVEL_COMPLETE_BONUS);
    assert!(session.is_level_unlocked(2));

    session.select_level(2).unwrap();
    assert_eq!(session.world().unwrap().level, 2);
}
