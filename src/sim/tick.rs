//! Fixed timestep simulation tick
//!
//! One call advances the world by one 60 Hz frame. Order matters and is
//! fixed: input, gravity and integration, platform resolution, bounds,
//! enemies, pickups, exit. Life loss and exit detection end the tick early;
//! the session decides what happens next.

use glam::Vec2;

use super::collision::{Contact, resolve_platform};
use super::state::{GameEvent, Particle, World};
use crate::consts::*;
use crate::settings::Settings;

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    /// Held, not edge-triggered: holding jump re-jumps on every landing
    pub jump: bool,
}

/// How a tick ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    Running,
    /// Fell off the bottom or touched an enemy
    LifeLost,
    /// Touched the active exit
    ExitReached,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub status: TickStatus,
    pub events: Vec<GameEvent>,
}

impl TickOutcome {
    fn new(status: TickStatus, events: Vec<GameEvent>) -> Self {
        Self { status, events }
    }
}

/// Advance the world by one tick
pub fn tick(world: &mut World, input: &TickInput, settings: &Settings) -> TickOutcome {
    let physics = &settings.physics;
    let mut events = Vec::new();
    world.time_ticks += 1;

    // --- Input ---
    let (mut left, mut right) = (input.left, input.right);
    if world.perturbation.controls_reversed {
        std::mem::swap(&mut left, &mut right);
    }

    let run_speed = physics.move_speed * world.perturbation.speed_multiplier;
    let player = &mut world.player;
    match (left, right) {
        (true, false) => player.vel.x = -run_speed,
        (false, true) => player.vel.x = run_speed,
        _ => player.vel.x *= physics.friction,
    }

    if input.jump && player.grounded {
        player.vel.y = -physics.jump_power(world.tile_size);
        player.grounded = false;
    }

    // --- Integrate ---
    player.vel.y += physics.gravity;
    player.pos += player.vel;

    // --- Platforms ---
    player.grounded = false;
    let mut body = player.rect();
    for (i, platform) in world.platforms.iter().enumerate() {
        if world.invisible_platforms.contains(&i) && !settings.trolls.invisible_solid {
            continue;
        }
        if resolve_platform(&mut body, &mut player.vel, &platform.rect, physics.landing_tolerance)
            == Contact::Landed
        {
            player.grounded = true;
        }
    }
    player.set_rect(&body);

    // --- Bounds ---
    let max_x = (world.viewport.width - player.size.x).max(0.0);
    player.pos.x = player.pos.x.clamp(0.0, max_x);
    if player.pos.y > world.viewport.height {
        return TickOutcome::new(TickStatus::LifeLost, events);
    }

    // Leg swing while running on the ground
    if player.grounded && player.vel.x.abs() > 0.1 {
        player.run_phase += player.vel.x.abs() * 0.15;
    } else {
        player.run_phase *= 0.8;
    }

    update_particles(&mut world.particles);

    // --- Enemies ---
    let level_scale = 1.0 + world.level as f32 / 40.0;
    let player_rect = world.player.rect();
    for enemy in &mut world.enemies {
        enemy.rect.x += enemy.vx * enemy.direction * level_scale;
        let max_x = world.viewport.width - enemy.rect.w;
        if enemy.rect.x < 0.0 || enemy.rect.x > max_x {
            enemy.direction = -enemy.direction;
            enemy.rect.x = enemy.rect.x.clamp(0.0, max_x.max(0.0));
        }
        if enemy.rect.overlaps(&player_rect) {
            return TickOutcome::new(TickStatus::LifeLost, events);
        }
    }

    // --- Pickups ---
    let center = world.player.center();
    let reach = world.player.size.x / 2.0;
    let total = world.total_dots();
    let mut collected = world.collected_count();
    let mut bursts = Vec::new();
    for (index, pickup) in world.pickups.iter_mut().enumerate() {
        if pickup.collected || center.distance(pickup.pos) >= pickup.radius + reach {
            continue;
        }
        pickup.collected = true;
        collected += 1;
        events.push(GameEvent::PickupCollected {
            index,
            collected,
            total,
            points: settings.difficulty.pickup_score(),
        });
        bursts.push(pickup.pos);
    }
    if settings.particles {
        for (i, pos) in bursts.into_iter().enumerate() {
            spawn_burst(world, pos, i as u32);
        }
    }

    // --- Exit ---
    if world.exit_active() && world.player.rect().overlaps(&world.exit) {
        return TickOutcome::new(TickStatus::ExitReached, events);
    }

    TickOutcome::new(TickStatus::Running, events)
}

fn update_particles(particles: &mut Vec<Particle>) {
    for particle in particles.iter_mut() {
        particle.pos += particle.vel;
        particle.vel.y += 0.15; // light gravity
        particle.vel *= 0.96;
        particle.life -= 1.0 / 40.0;
        particle.size *= 0.98;
    }
    particles.retain(|p| p.life > 0.0);
}

/// Ring of sparks where a pickup was collected
fn spawn_burst(world: &mut World, pos: Vec2, salt: u32) {
    for j in 0..PICKUP_PARTICLES {
        if world.particles.len() >= MAX_PARTICLES {
            world.particles.remove(0);
        }
        let hash = (world.time_ticks as u32)
            .wrapping_mul(2654435761)
            .wrapping_add(salt.wrapping_mul(104729))
            .wrapping_add(j * 7919);
        let jitter = (hash % 1000) as f32 / 1000.0 - 0.5;
        let angle = (j as f32 + jitter) / PICKUP_PARTICLES as f32 * std::f32::consts::TAU;
        let speed = 1.5 + ((hash >> 10) % 1000) as f32 / 1000.0 * 2.0;
        world.particles.push(Particle {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            life: 1.0,
            size: 2.0 + ((hash >> 20) % 100) as f32 / 50.0,
        });
    }
}
