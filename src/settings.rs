//! Game rules and preferences
//!
//! Loaded from a JSON file named by `TAG_ARENA_SETTINGS` when set; every
//! field falls back to its default when missing.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::map::MapKind;

/// Environment variable naming the settings file
pub const SETTINGS_ENV: &str = "TAG_ARENA_SETTINGS";

/// Settings loading/validation failures
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl SettingsError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SettingsError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Inclusive millisecond range a timer is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsRange {
    pub min: u64,
    pub max: u64,
}

impl MsRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }
}

/// Periodic map swapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapRotation {
    pub enabled: bool,
    pub interval_ms: u64,
    /// Warning flicker lead before a swap
    pub warning_ms: u64,
    /// Both players ignore collisions and tags this long after a swap
    pub invincibility_ms: u64,
    /// Catalog maps visited in order, wrapping around
    pub order: Vec<MapKind>,
}

impl Default for MapRotation {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 15_000,
            warning_ms: 5_000,
            invincibility_ms: 2_000,
            order: vec![MapKind::Original, MapKind::Alternate],
        }
    }
}

/// Gameplay rules for the tag mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub round_ms: u64,
    pub tag_cooldown_ms: u64,
    pub rounds_per_match: u32,
    pub wins_to_take_match: u32,
    pub power_up_cap: usize,
    /// Delay of the first spawn after a round starts
    pub first_spawn_delay_ms: MsRange,
    /// Delay between later spawn attempts
    pub spawn_interval_ms: MsRange,
    pub speed_boost_multiplier: f32,
    pub speed_boost_ms: u64,
    pub freeze_ms: u64,
    /// Distance from the tagger a teleporting runner lands at
    pub teleport_distance: f32,
    pub spawn_protection_ms: u64,
    /// Continuous overlap longer than this counts as stuck
    pub stuck_threshold_ms: u64,
    pub stuck_protection_ms: u64,
    pub map_rotation: MapRotation,
    pub player_radius: f32,
    /// Units per second
    pub player_speed: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            round_ms: 60_000,
            tag_cooldown_ms: 500,
            rounds_per_match: 3,
            wins_to_take_match: 2,
            power_up_cap: POWER_UP_CAP,
            first_spawn_delay_ms: MsRange::new(1_500, 3_000),
            spawn_interval_ms: MsRange::new(3_000, 6_000),
            speed_boost_multiplier: 1.6,
            speed_boost_ms: 3_000,
            freeze_ms: 2_000,
            teleport_distance: 250.0,
            spawn_protection_ms: 2_500,
            stuck_threshold_ms: 1_000,
            stuck_protection_ms: 2_000,
            map_rotation: MapRotation::default(),
            player_radius: PLAYER_RADIUS,
            player_speed: PLAYER_SPEED,
        }
    }
}

/// Retry budgets for the placement searches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    pub power_up_attempts: u32,
    pub spawn_attempts: u32,
    pub unstick_attempts: u32,
    pub unstick_min_distance: f32,
    pub unstick_max_distance: f32,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            power_up_attempts: 200,
            spawn_attempts: 100,
            unstick_attempts: 20,
            unstick_min_distance: 30.0,
            unstick_max_distance: 100.0,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rules: Rules,
    pub placement: Placement,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    // === Accessibility ===
    /// Reduced motion (no warning flicker or pulsing rings)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rules: Rules::default(),
            placement: Placement::default(),
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Parse and validate settings JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from the file named by `TAG_ARENA_SETTINGS`, or use defaults
    pub fn load() -> Self {
        match std::env::var(SETTINGS_ENV) {
            Ok(path) => Self::load_from(path),
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Read `path`, falling back to defaults with a warning on any error
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write settings to `path` as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let rules = &self.rules;
        if rules.round_ms == 0 {
            return Err(SettingsError::invalid("rules.round_ms", "must be positive"));
        }
        if rules.rounds_per_match == 0 {
            return Err(SettingsError::invalid("rules.rounds_per_match", "must be positive"));
        }
        if rules.wins_to_take_match == 0 || rules.wins_to_take_match > rules.rounds_per_match {
            return Err(SettingsError::invalid(
                "rules.wins_to_take_match",
                format!("must be between 1 and {}", rules.rounds_per_match),
            ));
        }
        for (field, range) in [
            ("rules.first_spawn_delay_ms", rules.first_spawn_delay_ms),
            ("rules.spawn_interval_ms", rules.spawn_interval_ms),
        ] {
            if range.min > range.max {
                return Err(SettingsError::invalid(
                    field,
                    format!("min {} exceeds max {}", range.min, range.max),
                ));
            }
        }
        if rules.player_radius <= 0.0 || rules.player_speed < 0.0 {
            return Err(SettingsError::invalid(
                "rules.player_radius",
                "radius must be positive and speed non-negative",
            ));
        }
        if rules.speed_boost_multiplier <= 0.0 {
            return Err(SettingsError::invalid("rules.speed_boost_multiplier", "must be positive"));
        }
        if rules.map_rotation.enabled && rules.map_rotation.interval_ms == 0 {
            return Err(SettingsError::invalid("rules.map_rotation.interval_ms", "must be positive"));
        }

        let placement = &self.placement;
        if placement.unstick_min_distance > placement.unstick_max_distance {
            return Err(SettingsError::invalid(
                "placement.unstick_min_distance",
                "exceeds unstick_max_distance",
            ));
        }

        for (field, v) in [
            ("master_volume", self.master_volume),
            ("sfx_volume", self.sfx_volume),
            ("music_volume", self.music_volume),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(SettingsError::invalid(field, format!("{} is outside 0.0..=1.0", v)));
            }
        }
        Ok(())
    }

    /// Effective sound-effect gain
    pub fn sfx_gain(&self) -> f32 {
        self.master_volume * self.sfx_volume
    }

    /// Effective music gain
    pub fn music_gain(&self) -> f32 {
        self.master_volume * self.music_volume
    }

    /// Whether flicker/pulse effects should animate
    pub fn effective_flicker(&self) -> bool {
        !self.reduced_motion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s = Settings::from_json(r#"{ "rules": { "round_ms": 30000 }, "reduced_motion": true }"#).unwrap();
        assert_eq!(s.rules.round_ms, 30_000);
        assert_eq!(s.rules.tag_cooldown_ms, 500);
        assert_eq!(s.rules.map_rotation.interval_ms, 15_000);
        assert_eq!(s.placement.power_up_attempts, 200);
        assert!(s.reduced_motion);
    }

    #[test]
    fn test_map_order_by_name() {
        let s = Settings::from_json(r#"{ "rules": { "map_rotation": { "order": ["scattered", "original"] } } }"#)
            .unwrap();
        assert_eq!(s.rules.map_rotation.order, vec![MapKind::Scattered, MapKind::Original]);
    }

    #[test]
    fn test_invalid_range_is_rejected() {
        let err = Settings::from_json(r#"{ "rules": { "spawn_interval_ms": { "min": 9000, "max": 10 } } }"#)
            .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "rules.spawn_interval_ms", .. }));
    }

    #[test]
    fn test_zero_rounds_is_rejected() {
        let err = Settings::from_json(r#"{ "rules": { "rounds_per_match": 0 } }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { .. }));
    }

    #[test]
    fn test_bad_json_reports_parse_error() {
        assert!(matches!(Settings::from_json("{ not json"), Err(SettingsError::Json(_))));
    }

    #[test]
    fn test_json_round_trip_keeps_rules() {
        let mut s = Settings::default();
        s.rules.freeze_ms = 1234;
        let back = Settings::from_json(&s.to_json().unwrap()).unwrap();
        assert_eq!(back, s);
    }

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tag-arena-{}-{}.json", std::process::id(), name))
    }

    #[test]
    fn test_save_then_load_from_path() {
        let path = scratch_path("saved");
        let mut s = Settings::default();
        s.rules.round_ms = 45_000;
        s.music_volume = 0.25;
        s.save(&path).unwrap();

        let back = Settings::from_path(&path).unwrap();
        assert_eq!(back, s);
        assert_eq!(Settings::load_from(&path), s);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = scratch_path("missing");
        assert!(matches!(Settings::from_path(&path), Err(SettingsError::Io(_))));
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let path = scratch_path("malformed");
        std::fs::write(&path, "{ \"rules\": [").unwrap();

        assert!(matches!(Settings::from_path(&path), Err(SettingsError::Json(_))));
        assert_eq!(Settings::load_from(&path), Settings::default());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_gains() {
        let s = Settings::default();
        assert!((s.sfx_gain() - 0.8).abs() < 1e-6);
        assert!((s.music_gain() - 0.56).abs() < 1e-6);
    }
}
