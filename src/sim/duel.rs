//! Duel mode: a walled arena where fighters collect ammo, shoot and dash-attack
//!
//! Shares the clock and timer conventions of the tag match. Fighters are
//! 40 px squares anchored at their top-left corner; one hit ends the game.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::geometry::Rect;
use super::state::{MoveIntent, PlayerSetup, PlayerSlot};
use crate::consts::*;

/// Fighter hitbox side
pub const FIGHTER_SIZE: f32 = 40.0;
/// Base speed in units per second
pub const FIGHTER_SPEED: f32 = 240.0;
/// Slowdown per carried round of ammo
pub const AMMO_SLOWDOWN: f32 = 0.06;
pub const MIN_SPEED_FACTOR: f32 = 0.45;

pub const WALL_THICKNESS: f32 = 20.0;
pub const INTERIOR_WALLS: usize = 8;
const WALL_EDGE_MARGIN: f32 = 60.0;

pub const WEAPON_SIZE: f32 = 20.0;
pub const WEAPON_INTERVAL_MS: f64 = 12_000.0;
/// Faster cadence while the instructions screen is up
pub const DEMO_WEAPON_INTERVAL_MS: f64 = 2_500.0;
pub const MAX_WEAPONS: usize = 3;
const WEAPON_EDGE_MARGIN: f32 = 50.0;

pub const BULLET_SIZE: f32 = 8.0;
pub const BULLET_SPEED: f32 = 420.0;
const MUZZLE_OFFSET: f32 = 20.0;

pub const MELEE_RANGE: f32 = 50.0;
pub const MELEE_COOLDOWN_MS: f64 = 5_000.0;
pub const MELEE_DASH_DISTANCE: f32 = 60.0;
pub const MELEE_DURATION_MS: f64 = 280.0;
/// Height of the hop drawn during a dash
const MELEE_ARC_HEIGHT: f32 = 18.0;
/// Missed dashes stop this far from the arena edge
const MELEE_EDGE_MARGIN: f32 = 10.0;

/// Cardinal facing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

impl Facing {
    pub fn unit(self) -> Vec2 {
        match self {
            Facing::Up => Vec2::NEG_Y,
            Facing::Down => Vec2::Y,
            Facing::Left => Vec2::NEG_X,
            Facing::Right => Vec2::X,
        }
    }
}

/// Dash animation in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeleeDash {
    pub start: Vec2,
    pub end: Vec2,
    pub started_at: f64,
    /// Target was in range when the dash began
    pub hit: bool,
}

impl MeleeDash {
    /// Animation progress in `0.0..=1.0`
    pub fn progress(&self, now: f64) -> f32 {
        ((now - self.started_at) / MELEE_DURATION_MS).clamp(0.0, 1.0) as f32
    }

    /// Drawn position along the dash, with a small hop at the midpoint
    pub fn current_pos(&self, now: f64) -> Vec2 {
        let t = self.progress(now);
        let arc = (4.0 * (t - 0.5) * (t - 0.5) - 1.0) * -MELEE_ARC_HEIGHT;
        self.start.lerp(self.end, t) + Vec2::new(0.0, arc)
    }
}

#[derive(Debug, Clone)]
pub struct Fighter {
    pub slot: PlayerSlot,
    pub name: String,
    pub color: [u8; 3],
    /// Top-left corner
    pub pos: Vec2,
    pub facing: Facing,
    pub ammo: u32,
    pub melee_ready_at: f64,
    pub melee: Option<MeleeDash>,
}

impl Fighter {
    pub fn new(slot: PlayerSlot, setup: PlayerSetup, pos: Vec2, facing: Facing) -> Self {
        Self {
            slot,
            name: setup.name,
            color: setup.color,
            pos,
            facing,
            ammo: 0,
            melee_ready_at: 0.0,
            melee: None,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, FIGHTER_SIZE, FIGHTER_SIZE)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(FIGHTER_SIZE / 2.0)
    }

    /// Carrying ammo slows a fighter down, never below the floor factor
    pub fn speed(&self) -> f32 {
        FIGHTER_SPEED * (1.0 - self.ammo as f32 * AMMO_SLOWDOWN).max(MIN_SPEED_FACTOR)
    }

    pub fn can_melee(&self, now: f64) -> bool {
        now >= self.melee_ready_at && self.melee.is_none()
    }

    /// Seconds until melee is available again
    pub fn melee_cooldown_left(&self, now: f64) -> f32 {
        ((self.melee_ready_at - now).max(0.0) / 1000.0) as f32
    }

    /// Where the fighter should be drawn this frame
    pub fn draw_pos(&self, now: f64) -> Vec2 {
        self.melee.map_or(self.pos, |dash| dash.current_pos(now))
    }

    /// Move per axis, reverting an axis whose result touches a wall
    pub fn move_by(&mut self, delta: Vec2, walls: &[Rect]) {
        let blocked = |pos: Vec2| {
            let r = Rect::new(pos.x, pos.y, FIGHTER_SIZE, FIGHTER_SIZE);
            walls.iter().any(|w| r.intersects(w))
        };

        if delta.x != 0.0 {
            let next = Vec2::new(self.pos.x + delta.x, self.pos.y);
            if !blocked(next) {
                self.pos = next;
            }
        }
        if delta.y != 0.0 {
            let next = Vec2::new(self.pos.x, self.pos.y + delta.y);
            if !blocked(next) {
                self.pos = next;
            }
        }
    }
}

/// An ammo pickup; `pos` is the top-left of its box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weapon {
    pub pos: Vec2,
    pub ammo: u32,
}

impl Weapon {
    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, WEAPON_SIZE, WEAPON_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bullet {
    pub pos: Vec2,
    pub dir: Vec2,
    pub shooter: PlayerSlot,
}

impl Bullet {
    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, BULLET_SIZE, BULLET_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuelPhase {
    /// Controls screen; weapons trickle in as a demo
    Instructions,
    Playing,
    GameOver,
}

/// Things that happened during a duel tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DuelEvent {
    Started,
    WeaponSpawned,
    WeaponCollected { slot: PlayerSlot, ammo: u32 },
    Shot { slot: PlayerSlot },
    BulletBlocked,
    MeleeStarted { slot: PlayerSlot, hit: bool },
    MeleeMissed { slot: PlayerSlot },
    Won { slot: PlayerSlot },
}

/// Per-tick duel commands; `melee`/`shoot`/`start` are key presses, not holds
#[derive(Debug, Clone, Default)]
pub struct DuelInput {
    pub intents: [MoveIntent; 2],
    pub melee: [bool; 2],
    pub shoot: [bool; 2],
    pub start: bool,
}

#[derive(Debug, Clone)]
pub struct DuelState {
    pub seed: u64,
    pub rng: Pcg32,
    pub now_ms: f64,
    pub phase: DuelPhase,
    pub arena: Rect,
    pub walls: Vec<Rect>,
    pub fighters: [Fighter; 2],
    pub weapons: Vec<Weapon>,
    pub bullets: Vec<Bullet>,
    pub next_weapon_at: f64,
    pub winner: Option<PlayerSlot>,
    pub events: Vec<DuelEvent>,
}

impl DuelState {
    pub fn new(seed: u64, one: PlayerSetup, two: PlayerSetup) -> Self {
        let arena = Rect::new(0.0, 0.0, ARENA_WIDTH, ARENA_HEIGHT);
        let mut rng = Pcg32::seed_from_u64(seed);
        let fighters = [
            Fighter::new(PlayerSlot::One, one, Vec2::new(100.0, 100.0), Facing::Right),
            Fighter::new(
                PlayerSlot::Two,
                two,
                Vec2::new(arena.right() - 140.0, arena.bottom() - 140.0),
                Facing::Left,
            ),
        ];
        let keep_clear = [fighters[0].rect(), fighters[1].rect()];
        let walls = generate_walls(&mut rng, &arena, &keep_clear);

        let mut state = Self {
            seed,
            rng,
            now_ms: 0.0,
            phase: DuelPhase::Instructions,
            arena,
            walls,
            fighters,
            weapons: Vec::new(),
            bullets: Vec::new(),
            next_weapon_at: DEMO_WEAPON_INTERVAL_MS,
            winner: None,
            events: Vec::new(),
        };
        state.spawn_weapon();
        log::info!(
            "Duel ready (seed {}): {} vs {}",
            seed,
            state.fighters[0].name,
            state.fighters[1].name
        );
        state
    }

    pub fn fighter(&self, slot: PlayerSlot) -> &Fighter {
        &self.fighters[slot.index()]
    }

    pub fn winner_name(&self) -> Option<&str> {
        self.winner.map(|slot| self.fighter(slot).name.as_str())
    }

    /// Drop a weapon somewhere inside the arena, unless the cap is reached
    pub fn spawn_weapon(&mut self) -> bool {
        if self.weapons.len() >= MAX_WEAPONS {
            return false;
        }
        let x = self.rng.random_range(
            (self.arena.left() + WEAPON_EDGE_MARGIN)..=(self.arena.right() - WEAPON_EDGE_MARGIN),
        );
        let y = self.rng.random_range(
            (self.arena.top() + WEAPON_EDGE_MARGIN)..=(self.arena.bottom() - WEAPON_EDGE_MARGIN),
        );
        let ammo = self.rng.random_range(1..=4);
        self.weapons.push(Weapon {
            pos: Vec2::new(x.round(), y.round()),
            ammo,
        });
        self.events.push(DuelEvent::WeaponSpawned);
        true
    }

    fn start_melee(&mut self, slot: PlayerSlot) {
        let now = self.now_ms;
        let target = self.fighter(slot.other()).pos;
        let arena = self.arena;
        let attacker = &mut self.fighters[slot.index()];
        let start = attacker.pos;

        let (end, hit) = if start.distance(target) <= MELEE_RANGE {
            (target, true)
        } else {
            let end = start + attacker.facing.unit() * MELEE_DASH_DISTANCE;
            let end = Vec2::new(
                end.x.clamp(
                    arena.left() + MELEE_EDGE_MARGIN,
                    arena.right() - FIGHTER_SIZE - MELEE_EDGE_MARGIN,
                ),
                end.y.clamp(
                    arena.top() + MELEE_EDGE_MARGIN,
                    arena.bottom() - FIGHTER_SIZE - MELEE_EDGE_MARGIN,
                ),
            );
            (end, false)
        };

        attacker.melee = Some(MeleeDash {
            start,
            end,
            started_at: now,
            hit,
        });
        log::debug!("{} dashes ({})", attacker.name, if hit { "in range" } else { "miss" });
        self.events.push(DuelEvent::MeleeStarted { slot, hit });
    }

    fn shoot(&mut self, slot: PlayerSlot) {
        let shooter = &mut self.fighters[slot.index()];
        let dir = shooter.facing.unit();
        self.bullets.push(Bullet {
            pos: shooter.center() + dir * MUZZLE_OFFSET,
            dir,
            shooter: slot,
        });
        shooter.ammo = shooter.ammo.saturating_sub(1);
        self.events.push(DuelEvent::Shot { slot });
    }

    fn finish(&mut self, slot: PlayerSlot) {
        self.phase = DuelPhase::GameOver;
        self.winner = Some(slot);
        log::info!("Duel won by {}", self.fighter(slot).name);
        self.events.push(DuelEvent::Won { slot });
    }
}

/// Border walls plus randomly placed interior walls
///
/// Interior walls that would cover a fighter's start are redrawn a bounded
/// number of times, then dropped.
pub fn generate_walls<R: Rng>(rng: &mut R, arena: &Rect, keep_clear: &[Rect]) -> Vec<Rect> {
    let t = WALL_THICKNESS;
    let mut walls = vec![
        Rect::new(arena.left(), arena.top(), arena.w, t),
        Rect::new(arena.left(), arena.bottom() - t, arena.w, t),
        Rect::new(arena.left(), arena.top(), t, arena.h),
        Rect::new(arena.right() - t, arena.top(), t, arena.h),
    ];

    for _ in 0..INTERIOR_WALLS {
        for _ in 0..20 {
            let (w, h) = if rng.random::<f32>() < 0.6 {
                (rng.random_range(120..=260) as f32, t)
            } else {
                (t, rng.random_range(120..=260) as f32)
            };
            let x_hi = (arena.right() - w - WALL_EDGE_MARGIN).max(arena.left() + WALL_EDGE_MARGIN);
            let y_hi = (arena.bottom() - h - WALL_EDGE_MARGIN).max(arena.top() + WALL_EDGE_MARGIN);
            let x = rng.random_range((arena.left() + WALL_EDGE_MARGIN)..=x_hi).round();
            let y = rng.random_range((arena.top() + WALL_EDGE_MARGIN)..=y_hi).round();
            let wall = Rect::new(x, y, w, h);
            if !keep_clear.iter().any(|r| r.intersects(&wall)) {
                walls.push(wall);
                break;
            }
        }
    }
    walls
}

/// Advance the duel by one timestep of `dt` seconds
pub fn tick_duel(state: &mut DuelState, input: &DuelInput, dt: f32) {
    state.events.clear();

    match state.phase {
        DuelPhase::GameOver => return,
        DuelPhase::Instructions => {
            state.now_ms += dt as f64 * 1000.0;
            if input.start {
                state.phase = DuelPhase::Playing;
                state.next_weapon_at = state.now_ms + WEAPON_INTERVAL_MS;
                log::info!("Duel started");
                state.events.push(DuelEvent::Started);
            } else if state.now_ms >= state.next_weapon_at {
                state.next_weapon_at = state.now_ms + DEMO_WEAPON_INTERVAL_MS;
                if state.weapons.len() < 2 {
                    state.spawn_weapon();
                }
            }
            return;
        }
        DuelPhase::Playing => {}
    }

    state.now_ms += dt as f64 * 1000.0;
    let now = state.now_ms;

    // Actions
    for slot in PlayerSlot::BOTH {
        let i = slot.index();
        if input.melee[i] && state.fighters[i].can_melee(now) {
            state.start_melee(slot);
        }
        if input.shoot[i] && state.fighters[i].ammo > 0 {
            state.shoot(slot);
        }
    }

    // Movement
    for slot in PlayerSlot::BOTH {
        let intent = input.intents[slot.index()];
        let fighter = &mut state.fighters[slot.index()];
        let step = fighter.speed() * dt;
        let mut delta = Vec2::ZERO;
        if intent.left {
            delta.x -= step;
            fighter.facing = Facing::Left;
        }
        if intent.right {
            delta.x += step;
            fighter.facing = Facing::Right;
        }
        if intent.up {
            delta.y -= step;
            fighter.facing = Facing::Up;
        }
        if intent.down {
            delta.y += step;
            fighter.facing = Facing::Down;
        }
        if delta != Vec2::ZERO {
            fighter.move_by(delta, &state.walls);
        }
    }

    // Weapon cadence
    if now >= state.next_weapon_at {
        state.next_weapon_at = now + WEAPON_INTERVAL_MS;
        state.spawn_weapon();
    }

    // Bullets
    let mut i = 0;
    while i < state.bullets.len() {
        let bullet = &mut state.bullets[i];
        bullet.pos += bullet.dir * BULLET_SPEED * dt;
        let rect = bullet.rect();
        let shooter = bullet.shooter;

        if state.walls.iter().any(|w| w.intersects(&rect)) {
            state.bullets.remove(i);
            state.events.push(DuelEvent::BulletBlocked);
            continue;
        }
        if state.fighter(shooter.other()).rect().intersects(&rect) {
            state.finish(shooter);
            return;
        }
        i += 1;
    }

    // Pickups, fighter one first
    let mut i = 0;
    while i < state.weapons.len() {
        let rect = state.weapons[i].rect();
        let picker = PlayerSlot::BOTH
            .into_iter()
            .find(|&slot| state.fighter(slot).rect().intersects(&rect));
        match picker {
            Some(slot) => {
                let weapon = state.weapons.remove(i);
                state.fighters[slot.index()].ammo += weapon.ammo;
                state.events.push(DuelEvent::WeaponCollected {
                    slot,
                    ammo: weapon.ammo,
                });
            }
            None => i += 1,
        }
    }

    // Dashes
    for slot in PlayerSlot::BOTH {
        let Some(dash) = state.fighters[slot.index()].melee else {
            continue;
        };
        if dash.progress(now) < 1.0 {
            continue;
        }
        if dash.hit {
            state.finish(slot);
            return;
        }
        let fighter = &mut state.fighters[slot.index()];
        fighter.move_by(dash.end - dash.start, &state.walls);
        fighter.melee_ready_at = now + MELEE_COOLDOWN_MS;
        fighter.melee = None;
        state.events.push(DuelEvent::MeleeMissed { slot });
    }
}
