//! Player and tether physics
//!
//! Symplectic Euler: forces update velocity first, then position moves by
//! the new velocity, then the rope constraint is enforced on the result.

use glam::Vec2;

use super::state::{DamageResult, Entity, EntityKind, Player};
use crate::consts::*;
use crate::damping;
use crate::save::Upgrades;
use crate::tuning::{RopeSlip, Tuning};

/// Below this the radius direction is undefined
const MIN_RADIUS: f32 = 1e-4;

/// Held movement keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveInput {
    pub left: bool,
    pub right: bool,
    pub down: bool,
}

/// External influences on one step
#[derive(Debug, Clone, Copy)]
pub struct Environment {
    /// Horizontal push (px/s²)
    pub wind: f32,
    /// Extra per-frame drag on top of air drag (1.0 = none)
    pub extra_drag_per_frame: f32,
    /// Whether rope integrity counts down
    pub rope_decays: bool,
    /// Slow-motion factor applied to movement only
    pub time_scale: f32,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            wind: 0.0,
            extra_drag_per_frame: 1.0,
            rope_decays: true,
            time_scale: 1.0,
        }
    }
}

/// What happened to the player during a step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub snapped: bool,
    pub safety_net: bool,
    /// First step below the void line
    pub entered_void: bool,
    /// Void budget exhausted
    pub void_death: bool,
}

/// Advance the player by `dt` real seconds
///
/// Timers (cooldowns, rope integrity, the void budget) run on `dt`; movement
/// runs on `dt * env.time_scale`.
pub fn step_player(
    player: &mut Player,
    input: MoveInput,
    env: &Environment,
    tuning: &Tuning,
    upgrades: &Upgrades,
    dt: f32,
) -> StepReport {
    let mut report = StepReport::default();
    player.prev_pos = player.pos;
    let move_dt = dt * env.time_scale;

    player.jump_cooldown = (player.jump_cooldown - dt).max(0.0);
    player.invulnerable_time = (player.invulnerable_time - dt).max(0.0);
    if player.is_fever {
        player.fever_time -= dt;
        if player.fever_time <= 0.0 {
            player.fever_time = 0.0;
            player.is_fever = false;
        }
    }

    // 1. Gravity and ambient push
    player.vel.y += tuning.gravity * move_dt;
    player.vel.x += env.wind * move_dt;

    // 2. Drag
    let drag =
        damping(tuning.air_drag_per_frame, move_dt) * damping(env.extra_drag_per_frame, move_dt);
    player.vel *= drag;

    // 3. Input
    match (player.is_swinging, player.tether_point) {
        (true, Some(anchor)) => {
            let radius = player.pos - anchor;
            let dist = radius.length();
            if dist > MIN_RADIUS {
                let n = radius / dist;
                // Forward points along +x at the bottom of the arc
                let tangent = Vec2::new(n.y, -n.x);
                let force =
                    tuning.swing_force(upgrades.swing_force, player.run_force_bonus) * move_dt;
                if input.right {
                    player.vel += tangent * force;
                }
                if input.left && player.vel.x > tuning.reverse_speed_limit {
                    player.vel -= tangent * force;
                }
            }

            if env.rope_decays && !upgrades.rope_is_max_tier() {
                player.rope_timer -= dt;
                if let RopeSlip::Loosen { window, rate } = tuning.rope_slip {
                    if player.rope_timer < window {
                        player.rope_length += rate * dt;
                    }
                }
                if player.rope_timer <= 0.0 {
                    player.detach();
                    report.snapped = true;
                    log::debug!("Rope snapped at x={:.0}", player.pos.x);
                }
            }
        }
        _ => {
            let air = tuning.air_control(upgrades.air_control) * move_dt;
            if input.right {
                player.vel.x += air;
            }
            if input.left {
                player.vel.x -= air;
            }
            if input.down {
                player.vel.y += tuning.fast_fall * move_dt;
            }
        }
    }
    player.vel = player.vel.clamp_length_max(tuning.max_speed);

    // 4. Integrate
    player.pos += player.vel * move_dt;

    // 5. Rope constraint
    if let (true, Some(anchor)) = (player.is_swinging, player.tether_point) {
        let (pos, vel) = enforce_tether(player.pos, player.vel, anchor, player.rope_length);
        player.pos = pos;
        player.vel = vel;
        let n = player.pos - anchor;
        player.rotation = (-n.x).atan2(n.y);
    } else {
        player.rotation = player.vel.x / tuning.max_speed * 0.5;
    }

    // 6. World bounds
    if player.pos.y < CEILING_LIMIT {
        player.pos.y = CEILING_LIMIT;
        player.vel.y *= tuning.ceiling_restitution;
    }

    if player.pos.y > VOID_LIMIT {
        if !player.has_used_net && upgrades.safety_net > 0 {
            player.vel.y = tuning.safety_net_impulse;
            player.has_used_net = true;
            report.safety_net = true;
        } else {
            report.entered_void = player.fall_timer == 0.0;
            player.fall_timer += dt;
            if player.fall_timer > VOID_TIMER_MAX_SECONDS {
                report.void_death = true;
            }
        }
    } else {
        player.fall_timer = 0.0;
    }

    player.max_speed = player.max_speed.max(player.speed());
    report
}

/// Project a point back onto the rope circle and cancel outward velocity
///
/// The tangential part of the velocity is preserved so the constraint
/// itself never damps the swing.
pub fn enforce_tether(pos: Vec2, vel: Vec2, anchor: Vec2, rope_length: f32) -> (Vec2, Vec2) {
    let radius = pos - anchor;
    let dist = radius.length();
    if dist < rope_length || dist <= MIN_RADIUS {
        return (pos, vel);
    }
    let n = radius / dist;
    let clamped = anchor + n * rope_length;
    let outward = vel.dot(n);
    let vel = if outward > 0.0 { vel - n * outward } else { vel };
    (clamped, vel)
}

/// Nearest tether target to `pointer` within `radius`
///
/// Returns the anchor id and the attach point. Vines and stalactites attach
/// along their length at the pointer height; everything else at its center.
pub fn find_anchor(entities: &[Entity], pointer: Vec2, radius: f32) -> Option<(u32, Vec2)> {
    let mut best: Option<(&Entity, f32)> = None;
    for entity in entities.iter().filter(|e| e.is_anchor()) {
        let dist = entity.center().distance(pointer);
        if dist < radius && best.is_none_or(|(_, d)| dist < d) {
            best = Some((entity, dist));
        }
    }
    best.map(|(entity, _)| {
        let point = match entity.kind {
            EntityKind::Vine | EntityKind::Stalactite => Vec2::new(
                entity.center().x,
                pointer.y.clamp(entity.pos.y, entity.pos.y + entity.size.y),
            ),
            _ => entity.center(),
        };
        (entity.id, point)
    })
}

/// Hook onto `point`
pub fn attach(
    player: &mut Player,
    anchor_id: u32,
    point: Vec2,
    tuning: &Tuning,
    upgrades: &Upgrades,
) {
    player.is_swinging = true;
    player.tether_point = Some(point);
    player.anchor_id = Some(anchor_id);
    player.rope_length = player.pos.distance(point).max(tuning.min_rope_length);
    player.rope_timer = tuning.rope_time(upgrades.rope_length, player.run_rope_bonus);
    player.standing_on = None;
}

/// Let go voluntarily; the launch boost scales the outgoing velocity
pub fn release(player: &mut Player, tuning: &Tuning, upgrades: &Upgrades) -> bool {
    if !player.is_swinging {
        return false;
    }
    player.detach();
    player.vel *= tuning.launch_boost(upgrades.launch_boost);
    true
}

/// Jump when untethered and off cooldown
pub fn try_jump(player: &mut Player, tuning: &Tuning) -> bool {
    if player.is_swinging || player.jump_cooldown > 0.0 {
        return false;
    }
    player.vel.y = tuning.jump_impulse;
    player.jump_cooldown = tuning.jump_cooldown;
    player.standing_on = None;
    true
}

/// Apply `amount` damage: armor first, then lives
pub fn take_damage(player: &mut Player, amount: u8, tuning: &Tuning) -> DamageResult {
    if amount == 0 || !player.is_alive() || player.is_invulnerable() {
        return DamageResult::Ignored;
    }
    player.invulnerable_time = tuning.invulnerability_time;
    if player.armor_stack > 0 {
        player.armor_stack -= 1;
        return DamageResult::ArmorAbsorbed;
    }
    player.lives = player.lives.saturating_sub(amount);
    if player.lives == 0 {
        DamageResult::Killed
    } else {
        DamageResult::LifeLost
    }
}

/// Unconditional death (void budget exhausted)
pub fn kill(player: &mut Player) {
    player.lives = 0;
    player.detach();
}
