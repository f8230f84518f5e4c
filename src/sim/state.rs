//! Game state and core simulation types
//!
//! Every timer here is an absolute "until" timestamp on the match clock
//! (milliseconds), compared with `now >= until`. Nothing counts down.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::{Rect, clamp_circle_into};
use super::map::{MapData, MapKind, Obstacles, get_map};
use crate::consts::*;
use crate::settings::{Placement, Rules, Settings};

/// Which of the two players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSlot {
    One,
    Two,
}

impl PlayerSlot {
    pub const BOTH: [PlayerSlot; 2] = [PlayerSlot::One, PlayerSlot::Two];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            PlayerSlot::One => 0,
            PlayerSlot::Two => 1,
        }
    }

    #[inline]
    pub fn other(self) -> Self {
        match self {
            PlayerSlot::One => PlayerSlot::Two,
            PlayerSlot::Two => PlayerSlot::One,
        }
    }
}

/// Physical keys the game binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    F,
    G,
    R,
    Up,
    Down,
    Left,
    Right,
    RightShift,
    Enter,
    Escape,
    Space,
    Backspace,
    F11,
}

/// Four-direction movement bindings for one player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    pub up: Key,
    pub down: Key,
    pub left: Key,
    pub right: Key,
}

impl KeyBindings {
    pub const fn wasd() -> Self {
        Self {
            up: Key::W,
            down: Key::S,
            left: Key::A,
            right: Key::D,
        }
    }

    pub const fn arrows() -> Self {
        Self {
            up: Key::Up,
            down: Key::Down,
            left: Key::Left,
            right: Key::Right,
        }
    }

    /// Sample held-key state through these bindings
    pub fn intent(&self, held: impl Fn(Key) -> bool) -> MoveIntent {
        MoveIntent {
            up: held(self.up),
            down: held(self.down),
            left: held(self.left),
            right: held(self.right),
        }
    }
}

/// Directions held this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveIntent {
    /// Raw direction with opposing keys cancelled, diagonals normalized
    pub fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        if self.up {
            dir.y -= 1.0;
        }
        if self.down {
            dir.y += 1.0;
        }
        if dir.x != 0.0 && dir.y != 0.0 {
            dir *= std::f32::consts::FRAC_1_SQRT_2;
        }
        dir
    }
}

/// Identity chosen on the menu; survives every round of a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSetup {
    pub name: String,
    pub color: [u8; 3],
}

impl PlayerSetup {
    pub fn new(name: impl Into<String>, color: [u8; 3]) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }

    pub fn default_for(slot: PlayerSlot) -> Self {
        match slot {
            PlayerSlot::One => Self::new("Player 1", [255, 109, 106]),
            PlayerSlot::Two => Self::new("Player 2", [92, 225, 230]),
        }
    }
}

/// Result of one movement resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Moved without touching anything
    Clear,
    /// At least one axis was reverted
    Blocked,
    /// Still overlapping an obstacle while trying to move, past the threshold
    Stuck,
}

impl MoveOutcome {
    pub fn collided(self) -> bool {
        !matches!(self, MoveOutcome::Clear)
    }
}

/// A player entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub slot: PlayerSlot,
    pub name: String,
    pub color: [u8; 3],
    pub keys: KeyBindings,
    pub pos: Vec2,
    pub radius: f32,
    /// Base speed in units per second
    pub speed: f32,
    /// Seconds survived as runner this round
    pub score: f32,
    pub is_tagger: bool,
    pub speed_multiplier: f32,
    pub speed_until: f64,
    /// 0 or 1; absorbs exactly one tag
    pub shield: u8,
    pub frozen_until: f64,
    /// Spawn/stuck protection: collisions are skipped until then
    pub protected_until: f64,
    /// When the current continuous stuck spell began
    #[serde(default)]
    pub stuck_since: Option<f64>,
    /// Directions held this frame
    #[serde(skip)]
    pub intent: MoveIntent,
}

impl Player {
    pub fn new(slot: PlayerSlot, setup: PlayerSetup, keys: KeyBindings, rules: &Rules) -> Self {
        Self {
            slot,
            name: setup.name,
            color: setup.color,
            keys,
            pos: Vec2::ZERO,
            radius: rules.player_radius,
            speed: rules.player_speed,
            score: 0.0,
            is_tagger: false,
            speed_multiplier: 1.0,
            speed_until: 0.0,
            shield: 0,
            frozen_until: 0.0,
            protected_until: 0.0,
            stuck_since: None,
            intent: MoveIntent::default(),
        }
    }

    #[inline]
    pub fn is_frozen(&self, now: f64) -> bool {
        now < self.frozen_until
    }

    #[inline]
    pub fn is_protected(&self, now: f64) -> bool {
        now < self.protected_until
    }

    #[inline]
    pub fn has_shield(&self) -> bool {
        self.shield > 0
    }

    /// Velocity requested this frame, in units per second
    ///
    /// Zero while frozen. Reads state only.
    pub fn input_vector(&self, now: f64) -> Vec2 {
        if self.is_frozen(now) {
            return Vec2::ZERO;
        }
        self.intent.direction() * self.speed * self.speed_multiplier
    }

    /// Move ignoring obstacles, staying inside the arena
    pub fn move_free(&mut self, delta: Vec2, arena: &Rect) {
        self.pos = clamp_circle_into(self.pos + delta, self.radius, arena);
    }

    /// Move by `delta`, resolving each axis against the obstacles separately
    ///
    /// While protected the move is free. A blocked axis reverts on its own,
    /// so contact on a diagonal slides along the wall. If the resolved
    /// position still overlaps something while the player is trying to move,
    /// a stuck spell starts; once it lasts longer than `stuck_threshold_ms`
    /// the outcome is `Stuck`.
    pub fn move_and_collide(
        &mut self,
        delta: Vec2,
        arena: &Rect,
        obstacles: &Obstacles,
        now: f64,
        stuck_threshold_ms: f64,
    ) -> MoveOutcome {
        if self.is_protected(now) {
            self.move_free(delta, arena);
            self.stuck_since = None;
            return MoveOutcome::Clear;
        }

        let mut blocked = false;

        let old_x = self.pos.x;
        self.pos.x = clamp_circle_into(Vec2::new(self.pos.x + delta.x, self.pos.y), self.radius, arena).x;
        if obstacles.blocks_circle(self.pos, self.radius) {
            self.pos.x = old_x;
            blocked = true;
        }

        let old_y = self.pos.y;
        self.pos.y = clamp_circle_into(Vec2::new(self.pos.x, self.pos.y + delta.y), self.radius, arena).y;
        if obstacles.blocks_circle(self.pos, self.radius) {
            self.pos.y = old_y;
            blocked = true;
        }

        let trying = delta != Vec2::ZERO;
        if trying && obstacles.blocks_circle(self.pos, self.radius) {
            let since = *self.stuck_since.get_or_insert(now);
            if now - since > stuck_threshold_ms {
                return MoveOutcome::Stuck;
            }
        } else {
            self.stuck_since = None;
        }

        if blocked {
            MoveOutcome::Blocked
        } else {
            MoveOutcome::Clear
        }
    }

    /// Displace without stuck tracking, reverting any axis that would end
    /// inside an obstacle
    pub fn nudge(&mut self, delta: Vec2, arena: &Rect, obstacles: &Obstacles) {
        let old = self.pos;
        let x = clamp_circle_into(Vec2::new(old.x + delta.x, old.y), self.radius, arena).x;
        if !obstacles.blocks_circle(Vec2::new(x, old.y), self.radius) {
            self.pos.x = x;
        }
        let y = clamp_circle_into(Vec2::new(self.pos.x, old.y + delta.y), self.radius, arena).y;
        if !obstacles.blocks_circle(Vec2::new(self.pos.x, y), self.radius) {
            self.pos.y = y;
        }
    }

    /// Drop an expired speed boost
    pub fn expire_boosts(&mut self, now: f64) {
        if now >= self.speed_until {
            self.speed_multiplier = 1.0;
        }
    }

    /// Clear per-round state; identity and bindings survive
    pub fn reset_for_round(&mut self) {
        self.score = 0.0;
        self.is_tagger = false;
        self.speed_multiplier = 1.0;
        self.speed_until = 0.0;
        self.shield = 0;
        self.frozen_until = 0.0;
        self.protected_until = 0.0;
        self.stuck_since = None;
        self.intent = MoveIntent::default();
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    Speed,
    Shield,
    Freeze,
    Teleport,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Speed,
        PowerUpKind::Shield,
        PowerUpKind::Freeze,
        PowerUpKind::Teleport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::Speed => "speed",
            PowerUpKind::Shield => "shield",
            PowerUpKind::Freeze => "freeze",
            PowerUpKind::Teleport => "teleport",
        }
    }

    /// Unrecognized names yield `None`; callers treat that as a no-op
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "speed" => Some(PowerUpKind::Speed),
            "shield" => Some(PowerUpKind::Shield),
            "freeze" => Some(PowerUpKind::Freeze),
            "teleport" => Some(PowerUpKind::Teleport),
            _ => None,
        }
    }
}

/// A pickup entity; lives until someone touches it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub pos: Vec2,
}

impl PowerUp {
    pub const RADIUS: f32 = POWER_UP_RADIUS;

    pub fn new(kind: PowerUpKind, pos: Vec2) -> Self {
        Self { kind, pos }
    }
}

/// Current phase of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Round in progress
    Playing,
    /// Match decided; terminal
    MatchOver,
}

/// How a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Winner(PlayerSlot),
    Tie,
}

/// Things that happened during a tick, for sound cues and feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RoundStarted { round: u32, tagger: PlayerSlot },
    ObstacleHit,
    Tagged { new_tagger: PlayerSlot },
    ShieldAbsorbed { runner: PlayerSlot },
    PowerUpSpawned { kind: PowerUpKind },
    PowerUpCollected { slot: PlayerSlot, kind: PowerUpKind },
    MapSwapped { map: MapKind },
    PlayerUnstuck { slot: PlayerSlot },
    RoundEnded { round: u32, winner: Option<PlayerSlot> },
    MatchEnded { outcome: MatchOutcome },
}

/// Split the player array into `slot` and its opponent
pub fn split_pair(players: &mut [Player; 2], slot: PlayerSlot) -> (&mut Player, &mut Player) {
    let [one, two] = players;
    match slot {
        PlayerSlot::One => (one, two),
        PlayerSlot::Two => (two, one),
    }
}

/// Complete match state, owned by the game loop
///
/// Serializes as a snapshot for debugging and replays. It is never read
/// back: leaving a match discards it.
#[derive(Debug, Clone, Serialize)]
pub struct MatchState {
    /// Match seed for reproducibility
    pub seed: u64,
    #[serde(skip)]
    pub rng: Pcg32,
    pub rules: Rules,
    pub placement: Placement,
    pub arena: Rect,
    /// Monotonic match clock (ms)
    pub now_ms: f64,
    pub phase: MatchPhase,
    /// 1-based round number
    pub round_index: u32,
    pub wins: [u32; 2],
    pub round_started_at: f64,
    pub tag_cooldown_until: f64,
    pub players: [Player; 2],
    pub power_ups: Vec<PowerUp>,
    pub next_power_up_at: f64,
    pub map: MapData,
    /// Position in `rules.map_rotation.order`
    pub map_cursor: usize,
    pub map_swapped_at: f64,
    /// Map-transition invincibility for both players
    pub invincible_until: f64,
    pub outcome: Option<MatchOutcome>,
    pub winner_message: String,
    /// Events from the latest tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl MatchState {
    /// Start a match and play the first round reset
    pub fn new(seed: u64, settings: &Settings, one: PlayerSetup, two: PlayerSetup) -> Self {
        let arena = Rect::new(0.0, 0.0, ARENA_WIDTH, ARENA_HEIGHT);
        let rules = settings.rules.clone();
        let mut rng = Pcg32::seed_from_u64(seed);
        let first_map = rules.map_rotation.order.first().copied().unwrap_or_default();
        let map = get_map(first_map, arena.w, arena.h, &mut rng);
        let players = [
            Player::new(PlayerSlot::One, one, KeyBindings::wasd(), &rules),
            Player::new(PlayerSlot::Two, two, KeyBindings::arrows(), &rules),
        ];

        let mut state = Self {
            seed,
            rng,
            rules,
            placement: settings.placement.clone(),
            arena,
            now_ms: 0.0,
            phase: MatchPhase::Playing,
            round_index: 1,
            wins: [0, 0],
            round_started_at: 0.0,
            tag_cooldown_until: 0.0,
            players,
            power_ups: Vec::new(),
            next_power_up_at: 0.0,
            map,
            map_cursor: 0,
            map_swapped_at: 0.0,
            invincible_until: 0.0,
            outcome: None,
            winner_message: String::new(),
            events: Vec::new(),
        };

        super::tick::reset_round(&mut state);
        log::info!(
            "Match started (seed {}): {} vs {}",
            seed,
            state.players[0].name,
            state.players[1].name
        );
        state
    }

    #[inline]
    pub fn player(&self, slot: PlayerSlot) -> &Player {
        &self.players[slot.index()]
    }

    #[inline]
    pub fn player_mut(&mut self, slot: PlayerSlot) -> &mut Player {
        &mut self.players[slot.index()]
    }

    /// Mutable access to `slot` and its opponent at once
    pub fn pair_mut(&mut self, slot: PlayerSlot) -> (&mut Player, &mut Player) {
        split_pair(&mut self.players, slot)
    }

    /// The current tagger, if the round has one
    pub fn tagger(&self) -> Option<PlayerSlot> {
        self.players.iter().find(|p| p.is_tagger).map(|p| p.slot)
    }

    /// Obstacle shapes at the current clock
    pub fn obstacles(&self) -> Obstacles {
        self.map.obstacles_at(self.now_ms)
    }

    pub fn remaining_ms(&self) -> i64 {
        (self.rules.round_ms as f64 - (self.now_ms - self.round_started_at)).ceil() as i64
    }

    #[inline]
    pub fn is_invincible(&self) -> bool {
        self.now_ms < self.invincible_until
    }

    /// Milliseconds until the next map swap, if rotation is on
    pub fn time_until_map_swap(&self) -> Option<f64> {
        let rotation = &self.rules.map_rotation;
        if !rotation.enabled || rotation.order.len() < 2 {
            return None;
        }
        Some(rotation.interval_ms as f64 - (self.now_ms - self.map_swapped_at))
    }

    /// Whether the pre-swap warning should be showing
    pub fn map_warning_active(&self) -> bool {
        self.time_until_map_swap()
            .is_some_and(|left| left <= self.rules.map_rotation.warning_ms as f64)
    }

    pub fn is_over(&self) -> bool {
        self.phase == MatchPhase::MatchOver
    }
}
