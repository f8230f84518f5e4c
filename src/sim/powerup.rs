//! Power-up spawning, pickup and effects

use glam::Vec2;
use rand::Rng;

use super::geometry::{Rect, clamp_circle_into, distance};
use super::map::Obstacles;
use super::placement::random_interior_point;
use super::state::{GameEvent, MatchState, Player, PlayerSlot, PowerUp, PowerUpKind, split_pair};
use crate::consts::*;
use crate::settings::Rules;

/// Try to place one power-up of a random kind clear of every obstacle
///
/// Returns the spawned kind, or `None` when the attempt budget ran out; the
/// list is left untouched in that case.
pub fn spawn_power_up<R: Rng>(
    rng: &mut R,
    power_ups: &mut Vec<PowerUp>,
    obstacles: &Obstacles,
    arena: &Rect,
    attempts: u32,
) -> Option<PowerUpKind> {
    for _ in 0..attempts {
        let pos = random_interior_point(rng, arena, POWER_UP_EDGE_MARGIN);
        if obstacles.blocks_circle(pos, PowerUp::RADIUS) {
            continue;
        }
        let kind = PowerUpKind::ALL[rng.random_range(0..PowerUpKind::ALL.len())];
        power_ups.push(PowerUp::new(kind, pos));
        return Some(kind);
    }
    log::debug!("Power-up spawn gave up after {} attempts", attempts);
    None
}

/// Apply `kind` to `who`; `other` is the opponent
pub fn apply_power_up<R: Rng>(
    rng: &mut R,
    who: &mut Player,
    other: &mut Player,
    kind: PowerUpKind,
    now: f64,
    rules: &Rules,
    arena: &Rect,
) {
    match kind {
        PowerUpKind::Speed => {
            who.speed_multiplier = rules.speed_boost_multiplier;
            who.speed_until = now + rules.speed_boost_ms as f64;
        }
        PowerUpKind::Shield => {
            who.shield = 1;
        }
        PowerUpKind::Freeze => {
            // A tagger picking this up just loses it
            if !who.is_tagger {
                other.frozen_until = now + rules.freeze_ms as f64;
            }
        }
        PowerUpKind::Teleport => {
            // Destination is not checked against obstacles
            let target = if who.is_tagger {
                random_interior_point(rng, arena, POWER_UP_EDGE_MARGIN)
            } else {
                let angle = rng.random_range(0.0..std::f32::consts::TAU);
                other.pos + Vec2::from_angle(angle) * rules.teleport_distance
            };
            who.pos = clamp_circle_into(target, who.radius, arena);
        }
    }
}

/// Hand every touched power-up to the first player touching it
///
/// Player one is checked before player two, so a simultaneous touch goes to
/// player one.
pub fn collect_power_ups(state: &mut MatchState) {
    let MatchState {
        rng,
        rules,
        arena,
        now_ms,
        players,
        power_ups,
        events,
        ..
    } = state;

    let mut i = 0;
    while i < power_ups.len() {
        let pos = power_ups[i].pos;
        let picker = PlayerSlot::BOTH.into_iter().find(|&slot| {
            let p = &players[slot.index()];
            distance(p.pos, pos) <= p.radius + PowerUp::RADIUS
        });

        let Some(slot) = picker else {
            i += 1;
            continue;
        };

        let kind = power_ups.remove(i).kind;
        let (who, other) = split_pair(players, slot);
        apply_power_up(rng, who, other, kind, *now_ms, rules, arena);
        log::debug!("{} picked up {}", who.name, kind.as_str());
        events.push(GameEvent::PowerUpCollected { slot, kind });
    }
}
