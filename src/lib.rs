//! Tag Arena - a two-player local tag arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, collisions, power-ups, rounds)
//! - `app`: Intro/menu/game screen flow around the simulation
//! - `renderer`: Renderer-agnostic scene, HUD and vertex generation
//! - `settings`: Data-driven rules and preferences

pub mod app;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::{Rules, Settings, SettingsError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Arena dimensions
    pub const ARENA_WIDTH: f32 = 900.0;
    pub const ARENA_HEIGHT: f32 = 520.0;
    /// Top band reserved for the HUD; pickups never spawn under it
    pub const HUD_HEIGHT: f32 = 110.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 22.0;
    /// Base player speed in units per second (5 px per 60 Hz frame)
    pub const PLAYER_SPEED: f32 = 300.0;

    /// Power-up defaults
    pub const POWER_UP_RADIUS: f32 = 14.0;
    pub const POWER_UP_CAP: usize = 3;
    pub const POWER_UP_EDGE_MARGIN: f32 = 60.0;

    /// Extra gap left between players after a tag push-apart
    pub const TAG_SEPARATION: f32 = 2.0;
}

/// Format remaining milliseconds as `m:ss` (negative clamps to zero)
pub fn fmt_time(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Shorten a display name to at most `max` characters, marking the cut with `…`
pub fn abbreviate(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    let mut out: String = name.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_time() {
        assert_eq!(fmt_time(60_000), "1:00");
        assert_eq!(fmt_time(59_999), "0:59");
        assert_eq!(fmt_time(5_000), "0:05");
        assert_eq!(fmt_time(-300), "0:00");
    }

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate("Ana", 12), "Ana");
        assert_eq!(abbreviate("Bartholomew Jr.", 12), "Bartholomew…");
        assert_eq!(abbreviate("Bartholomew Jr.", 12).chars().count(), 12);
    }
}
