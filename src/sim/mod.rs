//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Clock advanced only by `tick`
//! - Seeded RNG only
//! - Stable iteration order (player 1 before player 2)
//! - No rendering or platform dependencies

pub mod duel;
pub mod geometry;
pub mod map;
pub mod placement;
pub mod powerup;
pub mod state;
pub mod tick;

pub use geometry::{Circle, Rect, circle_overlaps_rect, circles_overlap, distance};
pub use map::{MapData, MapKind, MovingRect, Obstacles, get_map};
pub use powerup::{apply_power_up, collect_power_ups, spawn_power_up};
pub use state::{
    GameEvent, KeyBindings, MatchOutcome, MatchPhase, MatchState, MoveIntent, MoveOutcome,
    Player, PlayerSetup, PlayerSlot, PowerUp, PowerUpKind,
};
pub use tick::{TickInput, tick};
