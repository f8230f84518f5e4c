//! Fixed timestep simulation tick
//!
//! Per-frame round/match state machine: map rotation, power-up cadence,
//! movement, scoring, pickups, tagging and round transitions.

use rand::Rng;

use super::geometry::{circles_overlap, distance};
use super::map::{Obstacles, get_map};
use super::placement::{find_nearby_safe_point, find_safe_spawn};
use super::powerup::{collect_power_ups, spawn_power_up};
use super::state::{
    GameEvent, Key, MatchOutcome, MatchPhase, MatchState, MoveIntent, MoveOutcome, PlayerSlot,
};
use crate::consts::*;
use crate::settings::MsRange;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held directions, indexed by player slot
    pub intents: [MoveIntent; 2],
}

impl TickInput {
    /// Sample held keys through each player's bindings
    pub fn from_held(state: &MatchState, held: impl Fn(Key) -> bool) -> Self {
        Self {
            intents: [
                state.players[0].keys.intent(&held),
                state.players[1].keys.intent(&held),
            ],
        }
    }

    pub fn with(mut self, slot: PlayerSlot, intent: MoveIntent) -> Self {
        self.intents[slot.index()] = intent;
        self
    }
}

fn sample_ms<R: Rng>(rng: &mut R, range: MsRange) -> f64 {
    if range.max > range.min {
        rng.random_range(range.min..=range.max) as f64
    } else {
        range.min as f64
    }
}

/// Advance the match by one timestep of `dt` seconds
pub fn tick(state: &mut MatchState, input: &TickInput, dt: f32) {
    state.events.clear();

    if state.phase == MatchPhase::MatchOver {
        return;
    }

    state.now_ms += dt as f64 * 1000.0;
    for slot in PlayerSlot::BOTH {
        state.players[slot.index()].intent = input.intents[slot.index()];
    }

    // 1-2. Obstacles follow the clock; rotate the map when due
    maybe_swap_map(state);
    let obstacles = state.obstacles();

    // 3. Power-up cadence
    maybe_spawn_power_up(state, &obstacles);

    // 4. Movement
    move_players(state, &obstacles, dt);

    // 5. Expired boosts
    let now = state.now_ms;
    for player in &mut state.players {
        player.expire_boosts(now);
    }

    // 6. Runner survives another frame
    for player in &mut state.players {
        if !player.is_tagger {
            player.score += dt;
        }
    }

    // 7. Pickups
    collect_power_ups(state);

    // 8. Tag
    resolve_tag(state, &obstacles);

    // 9. Round clock
    if state.now_ms - state.round_started_at >= state.rules.round_ms as f64 {
        end_round(state);
    }
}

fn move_players(state: &mut MatchState, obstacles: &Obstacles, dt: f32) {
    let now = state.now_ms;
    let invincible = state.is_invincible();
    let stuck_threshold = state.rules.stuck_threshold_ms as f64;
    let mut hit = false;

    for slot in PlayerSlot::BOTH {
        let arena = state.arena;
        let player = &mut state.players[slot.index()];
        let delta = player.input_vector(now) * dt;

        if invincible {
            player.move_free(delta, &arena);
            player.stuck_since = None;
            continue;
        }

        match player.move_and_collide(delta, &arena, obstacles, now, stuck_threshold) {
            MoveOutcome::Clear => {}
            MoveOutcome::Blocked => hit = true,
            MoveOutcome::Stuck => {
                hit = true;
                unstick(state, slot, obstacles);
            }
        }
    }

    if hit && !invincible {
        state.events.push(GameEvent::ObstacleHit);
    }
}

/// Move a stuck player to a clear spot nearby and protect them briefly
fn unstick(state: &mut MatchState, slot: PlayerSlot, obstacles: &Obstacles) {
    let now = state.now_ms;
    let (from, radius) = {
        let p = state.player(slot);
        (p.pos, p.radius)
    };
    let pos = find_nearby_safe_point(&mut state.rng, from, &state.arena, obstacles, radius, &state.placement);

    let protection = state.rules.stuck_protection_ms as f64;
    let player = state.player_mut(slot);
    player.pos = pos;
    player.stuck_since = None;
    player.protected_until = now + protection;
    log::debug!("{} was stuck, moved to ({:.0}, {:.0})", player.name, pos.x, pos.y);
    state.events.push(GameEvent::PlayerUnstuck { slot });
}

/// At the cap the timer stays due, so a freed slot refills on the next frame
fn maybe_spawn_power_up(state: &mut MatchState, obstacles: &Obstacles) {
    if state.now_ms < state.next_power_up_at || state.power_ups.len() >= state.rules.power_up_cap {
        return;
    }

    let spawned = spawn_power_up(
        &mut state.rng,
        &mut state.power_ups,
        obstacles,
        &state.arena,
        state.placement.power_up_attempts,
    );
    if let Some(kind) = spawned {
        log::debug!("Spawned {} power-up", kind.as_str());
        state.events.push(GameEvent::PowerUpSpawned { kind });
    }

    state.next_power_up_at = state.now_ms + sample_ms(&mut state.rng, state.rules.spawn_interval_ms);
}

fn maybe_swap_map(state: &mut MatchState) {
    let Some(left) = state.time_until_map_swap() else {
        return;
    };
    if left > 0.0 {
        return;
    }

    let now = state.now_ms;
    let order = &state.rules.map_rotation.order;
    state.map_cursor = (state.map_cursor + 1) % order.len();
    let kind = order[state.map_cursor];
    state.map = get_map(kind, state.arena.w, state.arena.h, &mut state.rng);

    let obstacles = state.obstacles();
    for slot in PlayerSlot::BOTH {
        let radius = state.player(slot).radius;
        let pos = find_safe_spawn(
            &mut state.rng,
            slot,
            &state.arena,
            &obstacles,
            radius,
            state.placement.spawn_attempts,
        );
        let player = state.player_mut(slot);
        player.pos = pos;
        player.stuck_since = None;
    }

    state.map_swapped_at = now;
    state.invincible_until = now + state.rules.map_rotation.invincibility_ms as f64;
    log::info!("Map swapped to {}", kind.as_str());
    state.events.push(GameEvent::MapSwapped { map: kind });
}

fn resolve_tag(state: &mut MatchState, obstacles: &Obstacles) {
    let now = state.now_ms;
    if now < state.tag_cooldown_until || state.is_invincible() {
        return;
    }
    let Some(tagger_slot) = state.tagger() else {
        return;
    };

    let arena = state.arena;
    let (tagger, runner) = state.pair_mut(tagger_slot);
    if !circles_overlap(tagger.pos, tagger.radius, runner.pos, runner.radius) {
        return;
    }

    let event = if runner.has_shield() {
        runner.shield = 0;
        log::debug!("{}'s shield absorbed the tag", runner.name);
        GameEvent::ShieldAbsorbed { runner: runner.slot }
    } else {
        tagger.is_tagger = false;
        runner.is_tagger = true;

        let d = distance(tagger.pos, runner.pos);
        let normal = if d > 0.0 {
            (runner.pos - tagger.pos) / d
        } else {
            glam::Vec2::X
        };
        let half = ((tagger.radius + runner.radius) - d + TAG_SEPARATION) / 2.0;
        tagger.nudge(-normal * half, &arena, obstacles);
        runner.nudge(normal * half, &arena, obstacles);

        log::debug!("{} tagged {}", tagger.name, runner.name);
        GameEvent::Tagged {
            new_tagger: runner.slot,
        }
    };

    state.tag_cooldown_until = now + state.rules.tag_cooldown_ms as f64;
    state.events.push(event);
}

fn end_round(state: &mut MatchState) {
    let [one, two] = [state.players[0].score, state.players[1].score];
    let winner = if one > two {
        Some(PlayerSlot::One)
    } else if two > one {
        Some(PlayerSlot::Two)
    } else {
        None
    };

    match winner {
        Some(slot) => {
            state.wins[slot.index()] += 1;
            log::info!(
                "Round {} to {} ({:.1} - {:.1})",
                state.round_index,
                state.player(slot).name,
                one,
                two
            );
        }
        None => log::info!("Round {} tied at {:.1}", state.round_index, one),
    }
    state.events.push(GameEvent::RoundEnded {
        round: state.round_index,
        winner,
    });

    state.round_index += 1;
    let target = state.rules.wins_to_take_match;
    if state.wins.iter().any(|&w| w >= target) || state.round_index > state.rules.rounds_per_match {
        finish_match(state);
    } else {
        reset_round(state);
    }
}

fn finish_match(state: &mut MatchState) {
    let [one, two] = state.wins;
    let outcome = if one > two {
        MatchOutcome::Winner(PlayerSlot::One)
    } else if two > one {
        MatchOutcome::Winner(PlayerSlot::Two)
    } else {
        MatchOutcome::Tie
    };

    state.winner_message = match outcome {
        MatchOutcome::Winner(slot) => format!("Winner: {}", state.player(slot).name),
        MatchOutcome::Tie => "It's a tie!".to_string(),
    };
    state.outcome = Some(outcome);
    state.phase = MatchPhase::MatchOver;
    log::info!("Match over ({}-{}): {}", one, two, state.winner_message);
    state.events.push(GameEvent::MatchEnded { outcome });
}

/// Start a fresh round on the current map
///
/// Spawns both players in their home halves under spawn protection, picks a
/// random tagger, restarts the round and map clocks and clears pickups.
pub(crate) fn reset_round(state: &mut MatchState) {
    let now = state.now_ms;
    let obstacles = state.obstacles();
    let protection = state.rules.spawn_protection_ms as f64;

    for slot in PlayerSlot::BOTH {
        let radius = state.player(slot).radius;
        let pos = find_safe_spawn(
            &mut state.rng,
            slot,
            &state.arena,
            &obstacles,
            radius,
            state.placement.spawn_attempts,
        );
        let player = state.player_mut(slot);
        player.reset_for_round();
        player.pos = pos;
        player.protected_until = now + protection;
    }

    let tagger = PlayerSlot::BOTH[state.rng.random_range(0..PlayerSlot::BOTH.len())];
    state.player_mut(tagger).is_tagger = true;

    state.round_started_at = now;
    state.tag_cooldown_until = now;
    state.power_ups.clear();
    state.next_power_up_at = now + sample_ms(&mut state.rng, state.rules.first_spawn_delay_ms);
    state.map_swapped_at = now;
    state.invincible_until = now;

    log::info!(
        "Round {} started on {}, {} is it",
        state.round_index,
        state.map.kind.as_str(),
        state.player(tagger).name
    );
    state.events.push(GameEvent::RoundStarted {
        round: state.round_index,
        tagger,
    });
}
