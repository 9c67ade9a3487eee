//! Draw list generation for world entities

use glam::Vec2;

use super::DrawCommand;
use super::colors::{self, Color, with_alpha};
use crate::sim::{Player, Rect, World};

/// Whole frame, back to front: background, platforms, exits, pickups,
/// enemies, player, particles
pub fn build_scene(world: &World) -> Vec<DrawCommand> {
    let mut commands = Vec::with_capacity(
        8 + world.platforms.len() + world.pickups.len() + world.enemies.len() + world.particles.len(),
    );
    commands.push(DrawCommand::Clear {
        color: colors::BACKGROUND,
    });

    for (i, platform) in world.platforms.iter().enumerate() {
        let color = if world.is_platform_hidden(i) {
            with_alpha(colors::PLATFORM, colors::GHOST_ALPHA)
        } else {
            colors::PLATFORM
        };
        commands.push(DrawCommand::Rect {
            rect: platform.rect,
            color,
        });
    }

    // Decoys look exactly like the real exit
    let exit_color = if world.exit_active() {
        colors::EXIT
    } else {
        with_alpha(colors::EXIT, colors::LOCKED_EXIT_ALPHA)
    };
    commands.extend(exit_door(&world.exit, exit_color));
    for decoy in &world.decoy_exits {
        commands.extend(exit_door(decoy, exit_color));
    }

    for pickup in world.pickups.iter().filter(|p| !p.collected) {
        // Slow pulse so dots read as collectible
        let pulse = 1.0 + 0.1 * (world.time_ticks as f32 * 0.1).sin();
        commands.push(DrawCommand::Circle {
            center: pickup.pos,
            radius: pickup.radius * pulse,
            color: colors::PICKUP,
        });
    }

    for enemy in &world.enemies {
        commands.push(DrawCommand::Rect {
            rect: enemy.rect,
            color: colors::ENEMY,
        });
    }

    commands.extend(player(&world.player, colors::PLAYER));

    for particle in &world.particles {
        commands.push(DrawCommand::Circle {
            center: particle.pos,
            radius: particle.size,
            color: with_alpha(colors::PARTICLE, particle.life),
        });
    }

    commands
}

/// Door frame with a lighter inner panel
fn exit_door(rect: &Rect, color: Color) -> [DrawCommand; 2] {
    let inset = rect.w * 0.2;
    [
        DrawCommand::Rect { rect: *rect, color },
        DrawCommand::Rect {
            rect: Rect::new(rect.x + inset, rect.y + inset, rect.w - inset * 2.0, rect.h - inset),
            color: with_alpha(color, 0.5),
        },
    ]
}

/// Body plus two legs swinging with the run phase
fn player(player: &Player, color: Color) -> Vec<DrawCommand> {
    let body = player.rect();
    let leg_len = body.h * 0.3;
    let torso = Rect::new(body.x, body.y, body.w, body.h - leg_len);
    let hip = Vec2::new(body.center().x, torso.bottom());
    let swing = player.run_phase.sin() * body.w * 0.35;
    let leg_width = (body.w * 0.15).max(1.0);

    vec![
        DrawCommand::Rect { rect: torso, color },
        DrawCommand::Line {
            from: hip,
            to: Vec2::new(hip.x + swing, body.bottom()),
            width: leg_width,
            color,
        },
        DrawCommand::Line {
            from: hip,
            to: Vec2::new(hip.x - swing, body.bottom()),
            width: leg_width,
            color,
        },
    ]
}
