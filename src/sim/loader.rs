//! Level loading
//!
//! Turns a tile-space `LevelSpec` into a pixel-space `World`. The tile size
//! is computed exactly once per load and every entity is placed with it.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::Rng;

use super::collision::{Rect, circle_overlaps_rect};
use super::level::LevelSpec;
use super::state::{Enemy, PerturbationState, Pickup, Platform, Player, Viewport, World};
use super::troll::TrollScheduler;
use crate::consts::*;
use crate::error::GameError;

/// Tile size for a viewport: `max(MIN_TILE, floor(height / rows))`, further
/// limited so `width_tiles` (at least the logical column count) fit across.
pub fn tile_size_for(viewport: Viewport, width_tiles: u32) -> Result<f32, GameError> {
    if !viewport.is_usable() {
        return Err(GameError::ViewportUnavailable {
            width: viewport.width,
            height: viewport.height,
        });
    }

    let columns = (width_tiles as f32).max(LOGICAL_COLUMNS);
    let by_rows = (viewport.height / LOGICAL_ROWS).floor();
    let by_columns = (viewport.width / columns).floor();
    Ok(by_rows.min(by_columns).max(MIN_TILE))
}

/// Build the world for `spec` and arm its troll effects on `scheduler`.
///
/// Arming cancels whatever the scheduler still held for the previous load,
/// so no timer from an older world can reach this one.
pub fn load_level<R: Rng + ?Sized>(
    spec: &LevelSpec,
    level: u32,
    viewport: Viewport,
    scheduler: &mut TrollScheduler,
    rng: &mut R,
) -> Result<World, GameError> {
    let tile = tile_size_for(viewport, spec.width_tiles)?;

    let platforms: Vec<Platform> = spec
        .platforms
        .iter()
        .map(|p| Platform {
            rect: Rect::new(p.x as f32, p.y as f32, p.w as f32, p.h as f32).scaled(tile),
        })
        .collect();

    let size = World::player_size(tile);
    let player = Player::new(
        Vec2::new(
            spec.start.x as f32 * tile,
            spec.start.y as f32 * tile - size.y,
        ),
        size,
    );

    let enemies = spec
        .enemies
        .iter()
        .map(|e| Enemy {
            rect: Rect::new(e.x as f32 * tile, e.y as f32 * tile, size.x, size.y),
            vx: e.base_speed,
            direction: 1.0,
        })
        .collect();

    let limit = World::reach_limit_x(viewport, tile);
    let exit = Rect::new(
        (spec.exit.x as f32 * tile).min(limit),
        spec.exit.y as f32 * tile,
        tile,
        tile,
    );

    let pickups = place_pickups(spec.dots, &platforms, tile, viewport, rng);

    let mut world = World {
        level,
        generation: 0,
        viewport,
        tile_size: tile,
        player,
        platforms,
        enemies,
        pickups,
        exit,
        decoy_exits: Vec::new(),
        invisible_platforms: BTreeSet::new(),
        perturbation: PerturbationState::default(),
        time_ticks: 0,
        particles: Vec::new(),
    };

    world.generation = scheduler.arm(&spec.tags);

    log::info!(
        "Level {} loaded: tile={} platforms={} enemies={} dots={} tags={:?}",
        level,
        tile,
        world.platforms.len(),
        world.enemies.len(),
        world.pickups.len(),
        spec.tags
    );

    Ok(world)
}

/// Scatter `count` pickups above the thin platforms, cycling through them.
/// Surfaces are cut off at the reach limit so no pickup lands off screen.
fn place_pickups<R: Rng + ?Sized>(
    count: u32,
    platforms: &[Platform],
    tile: f32,
    viewport: Viewport,
    rng: &mut R,
) -> Vec<Pickup> {
    let radius = World::pickup_radius(tile);
    let limit = World::reach_limit_x(viewport, tile);

    // Standing area above each thin platform, inset from its edges
    let surfaces: Vec<Rect> = platforms
        .iter()
        .filter(|p| p.rect.h <= tile)
        .filter_map(|p| {
            let x = p.rect.x + PICKUP_SURFACE_INSET;
            let right = (p.rect.right() - PICKUP_SURFACE_INSET).min(limit);
            (right > x).then(|| Rect::new(x, p.rect.y - radius * 2.0, right - x, 0.0))
        })
        .collect();

    (0..count)
        .map(|i| {
            let pos = if surfaces.is_empty() {
                // No surfaces: spread across the middle of the canvas
                Vec2::new(
                    viewport.width * (i + 1) as f32 / (count + 1) as f32,
                    viewport.height / 2.0,
                )
            } else {
                let surface = &surfaces[i as usize % surfaces.len()];
                let pos = sample_above(surface, radius, tile, platforms, rng);
                Vec2::new(pos.x.min(limit), pos.y)
            };
            Pickup {
                pos,
                radius,
                collected: false,
            }
        })
        .collect()
}

/// Jittered position above `surface` that is not inside any platform
fn sample_above<R: Rng + ?Sized>(
    surface: &Rect,
    radius: f32,
    tile: f32,
    platforms: &[Platform],
    rng: &mut R,
) -> Vec2 {
    let span = (surface.w - radius * 2.0).max(5.0);
    let lift = PICKUP_MAX_LIFT.min(tile * 1.5);

    for _ in 0..MAX_PICKUP_ATTEMPTS {
        let pos = Vec2::new(
            surface.x + rng.random::<f32>() * span,
            surface.y - rng.random::<f32>() * lift,
        );
        if !platforms
            .iter()
            .any(|p| circle_overlaps_rect(pos, radius, &p.rect))
        {
            return pos;
        }
    }

    log::debug!("Pickup placement exhausted, using surface midpoint");
    Vec2::new(surface.x + surface.w / 2.0, surface.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Difficulty, TrollTuning};
    use crate::sim::level::{PerturbationTag, TilePoint, TileRect, generate_level, generate_levels};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const VIEW: Viewport = Viewport::new(1280.0, 720.0);

    fn load(spec: &LevelSpec, seed: u64) -> (World, TrollScheduler) {
        let mut scheduler = TrollScheduler::new(TrollTuning::default());
        let mut rng = Pcg32::seed_from_u64(seed);
        let world = load_level(spec, 1, VIEW, &mut scheduler, &mut rng).unwrap();
        (world, scheduler)
    }

    #[test]
    fn test_tile_size() {
        assert_eq!(tile_size_for(VIEW, 28).unwrap(), 36.0);
        // Width-limited: 40 columns on 1280px
        assert_eq!(tile_size_for(VIEW, 40).unwrap(), 32.0);
        // Floor at the minimum tile
        assert_eq!(tile_size_for(Viewport::new(300.0, 200.0), 28).unwrap(), 24.0);
    }

    #[test]
    fn test_zero_viewport_is_unavailable() {
        assert_eq!(
            tile_size_for(Viewport::new(0.0, 0.0), 28),
            Err(GameError::ViewportUnavailable {
                width: 0.0,
                height: 0.0
            })
        );
        assert!(tile_size_for(Viewport::new(800.0, f32::NAN), 28).is_err());
    }

    #[test]
    fn test_load_places_everything_with_one_tile_size() {
        let spec = generate_level(1, Difficulty::Easy);
        let (world, _) = load(&spec, 7);
        let t = world.tile_size;
        assert_eq!(t, 36.0);

        assert_eq!(world.platforms[1].rect, Rect::new(4.0 * t, 13.0 * t, 3.0 * t, t));
        assert_eq!(world.player.pos, Vec2::new(2.0 * t, 14.0 * t - t));
        assert_eq!(world.player.size, Vec2::new(27.0, 36.0));
        assert_eq!(world.player.vel, Vec2::ZERO);
        assert!(!world.player.grounded);
        assert_eq!(world.exit, Rect::new(24.0 * t, 10.0 * t, t, t));
        assert_eq!(world.pickups.len() as u32, spec.dots);
        assert!(world.pickups.iter().all(|p| p.radius == 7.0 && !p.collected));
        assert!(world.perturbation.is_neutral());
        assert!(world.invisible_platforms.is_empty());
        assert!(world.decoy_exits.is_empty());
    }

    #[test]
    fn test_enemies_start_moving_right() {
        let spec = generate_level(9, Difficulty::Medium);
        let (world, _) = load(&spec, 1);
        assert_eq!(world.enemies.len(), 3);
        let t = world.tile_size;
        for (enemy, es) in world.enemies.iter().zip(&spec.enemies) {
            assert_eq!(enemy.direction, 1.0);
            assert_eq!(enemy.vx, es.base_speed);
            assert_eq!(enemy.rect.x, es.x as f32 * t);
            assert_eq!(enemy.rect.w, world.player.size.x);
        }
    }

    #[test]
    fn test_no_thin_platforms_falls_back_to_canvas() {
        let spec = LevelSpec {
            width_tiles: 28,
            platforms: vec![TileRect { x: 0, y: 18, w: 28, h: 2 }],
            enemies: Vec::new(),
            dots: 3,
            start: TilePoint { x: 2, y: 14 },
            exit: TilePoint { x: 24, y: 10 },
            tags: Default::default(),
        };
        let (world, _) = load(&spec, 3);
        assert_eq!(world.pickups.len(), 3);
        assert_eq!(world.pickups[0].pos, Vec2::new(320.0, 360.0));
        assert_eq!(world.pickups[2].pos, Vec2::new(960.0, 360.0));
    }

    fn assert_goals_reachable(world: &World) {
        let view = world.viewport;
        // The player's right edge can go all the way to the viewport edge
        assert!(
            world.exit.right() <= view.width,
            "level {}: exit at {} past {}",
            world.level,
            world.exit.x,
            view.width
        );
        for pickup in &world.pickups {
            assert!(
                pickup.pos.x <= view.width - world.tile_size,
                "level {}: pickup at {} off screen",
                world.level,
                pickup.pos.x
            );
        }
    }

    #[test]
    fn test_narrow_viewport_keeps_goals_reachable() {
        let view = Viewport::new(800.0, 600.0);
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            for (i, spec) in generate_levels(19, difficulty).iter().enumerate() {
                let level = i as u32 + 1;
                let mut scheduler = TrollScheduler::new(TrollTuning::default());
                let mut rng = Pcg32::seed_from_u64(level as u64);
                let world = load_level(spec, level, view, &mut scheduler, &mut rng).unwrap();
                assert!(world.tile_size >= MIN_TILE);
                assert_goals_reachable(&world);
            }
        }
    }

    #[test]
    fn test_shrinking_resize_pulls_exit_in() {
        let spec = generate_level(19, Difficulty::Medium);
        let (mut world, _) = load(&spec, 9);
        world.level = 19;
        assert_eq!(world.tile_size, 32.0);
        assert_eq!(world.exit.x, 36.0 * 32.0);

        world.rescale(Viewport::new(800.0, 600.0), MIN_TILE);
        assert_eq!(world.exit.x, 800.0 - MIN_TILE);
        assert_goals_reachable(&world);
    }

    #[test]
    fn test_tags_arm_scheduler() {
        let spec = generate_level(16, Difficulty::Medium);
        assert!(spec.tags.contains(&PerturbationTag::Reverse));
        let (world, scheduler) = load(&spec, 5);
        assert_eq!(world.generation, scheduler.generation());
        assert_eq!(scheduler.pending(), spec.tags.len());
    }

    proptest! {
        #[test]
        fn prop_pickup_count_matches_spec(level in 1u32..=22, seed in any::<u64>()) {
            let spec = generate_level(level, Difficulty::Medium);
            let (world, _) = load(&spec, seed);
            prop_assert_eq!(world.pickups.len() as u32, spec.dots);
            prop_assert_eq!(world.collected_count(), 0);
        }

        #[test]
        fn prop_pickups_not_embedded(level in 1u32..=22, seed in any::<u64>()) {
            let spec = generate_level(level, Difficulty::Hard);
            let (world, _) = load(&spec, seed);
            for pickup in &world.pickups {
                for platform in &world.platforms {
                    prop_assert!(!circle_overlaps_rect(pickup.pos, pickup.radius, &platform.rect));
                }
            }
        }
    }
}
