//! Renderer-agnostic frame snapshot
//!
//! `Scene` turns a match or duel state into plain shapes plus HUD text. A
//! backend only needs to fill triangles and draw strings.

use glam::Vec2;

use super::shapes;
use super::vertex::{Vertex, colors, lighten, rgb, with_alpha};
use crate::consts::*;
use crate::sim::duel::{DuelPhase, DuelState, FIGHTER_SIZE, WEAPON_SIZE};
use crate::sim::geometry::Rect;
use crate::sim::state::{MatchPhase, MatchState, PowerUp, PowerUpKind};
use crate::{abbreviate, fmt_time};

/// Longest name shown in the HUD
pub const HUD_NAME_CHARS: usize = 12;
/// Half-period of the map warning flicker
const FLICKER_MS: f64 = 500.0;
/// Inset of the highlight drawn on obstacles
const HIGHLIGHT_INSET: f32 = 4.0;
const AIM_DISTANCE: f32 = 44.0;

/// One drawable primitive
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle {
        center: Vec2,
        radius: f32,
        color: [f32; 4],
    },
    Ring {
        center: Vec2,
        inner: f32,
        outer: f32,
        color: [f32; 4],
    },
    Rect {
        rect: Rect,
        color: [f32; 4],
    },
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: [f32; 4],
    },
}

impl Shape {
    pub fn tessellate(&self, out: &mut Vec<Vertex>) {
        match *self {
            Shape::Circle {
                center,
                radius,
                color,
            } => out.extend(shapes::circle(center, radius, color, shapes::segments_for(radius))),
            Shape::Ring {
                center,
                inner,
                outer,
                color,
            } => out.extend(shapes::ring(center, inner, outer, color, shapes::segments_for(outer))),
            Shape::Rect { rect, color } => out.extend(shapes::rect(&rect, color)),
            Shape::Line {
                from,
                to,
                width,
                color,
            } => out.extend(shapes::line(from, to, width, color)),
        }
    }
}

/// HUD contents for a tag match
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub round: u32,
    pub rounds: u32,
    pub wins: [u32; 2],
    pub names: [String; 2],
    pub time_left: String,
    pub scores: [String; 2],
    pub tagger: Option<String>,
    /// Set once the match is decided
    pub message: Option<String>,
}

impl Hud {
    pub fn from_state(state: &MatchState) -> Self {
        let names = [
            abbreviate(&state.players[0].name, HUD_NAME_CHARS),
            abbreviate(&state.players[1].name, HUD_NAME_CHARS),
        ];
        Self {
            round: state.round_index.min(state.rules.rounds_per_match),
            rounds: state.rules.rounds_per_match,
            wins: state.wins,
            time_left: fmt_time(state.remaining_ms()),
            scores: [
                format!("{:.1}", state.players[0].score),
                format!("{:.1}", state.players[1].score),
            ],
            tagger: state.tagger().map(|slot| state.player(slot).name.clone()),
            message: (state.phase == MatchPhase::MatchOver).then(|| state.winner_message.clone()),
            names,
        }
    }

    /// Text lines in display order
    pub fn lines(&self) -> Vec<String> {
        let [n1, n2] = &self.names;
        let mut lines = vec![
            format!(
                "Round {}/{} • Wins: {} {} - {} {}",
                self.round, self.rounds, n1, self.wins[0], self.wins[1], n2
            ),
            format!("Time: {}", self.time_left),
            format!("{}: {}   |   {}: {}", n1, self.scores[0], n2, self.scores[1]),
        ];
        if let Some(tagger) = &self.tagger {
            lines.push(format!("Tagger: {}", tagger));
        }
        if let Some(message) = &self.message {
            lines.push(message.clone());
        }
        lines
    }
}

/// HUD contents for a duel
#[derive(Debug, Clone, PartialEq)]
pub struct DuelHud {
    pub fighters: [String; 2],
    pub message: Option<String>,
}

impl DuelHud {
    pub fn from_state(state: &DuelState) -> Self {
        let line = |i: usize| {
            let f = &state.fighters[i];
            let mut s = format!("{}  •  Ammo: {}", f.name, f.ammo);
            let cooldown = f.melee_cooldown_left(state.now_ms);
            if cooldown > 0.0 {
                s.push_str(&format!("  |  Cooldown: {:.1}s", cooldown));
            }
            s
        };
        Self {
            fighters: [line(0), line(1)],
            message: state.winner_name().map(|name| format!("{} wins!", name)),
        }
    }
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub shapes: Vec<Shape>,
}

impl Scene {
    /// Snapshot a tag match; `reduced_motion` holds pulses and flicker steady
    pub fn capture(state: &MatchState, reduced_motion: bool) -> Self {
        let now = state.now_ms;
        let mut shapes = Vec::new();
        let pulse = if reduced_motion {
            1.0
        } else {
            0.6 + 0.4 * ((now / 150.0).sin() as f32).abs()
        };

        shapes.push(Shape::Rect {
            rect: state.arena,
            color: colors::BACKGROUND,
        });

        // Obstacles: body plus inset highlight; movers drawn lighter
        let obstacles = state.obstacles();
        for (rect, base) in obstacles
            .static_rects
            .iter()
            .map(|r| (r, colors::OBSTACLE))
            .chain(obstacles.mover_rects.iter().map(|r| (r, colors::MOVER)))
        {
            shapes.push(Shape::Rect { rect: *rect, color: base });
            shapes.push(Shape::Rect {
                rect: rect.inflated(-HIGHLIGHT_INSET),
                color: colors::HIGHLIGHT,
            });
        }
        for c in &obstacles.circles {
            shapes.push(Shape::Circle {
                center: c.center,
                radius: c.radius,
                color: colors::OBSTACLE,
            });
            shapes.push(Shape::Circle {
                center: c.center,
                radius: (c.radius - HIGHLIGHT_INSET).max(0.0),
                color: colors::HIGHLIGHT,
            });
        }

        for pu in &state.power_ups {
            shapes.push(Shape::Circle {
                center: pu.pos,
                radius: PowerUp::RADIUS,
                color: power_up_color(pu.kind),
            });
        }

        for p in &state.players {
            if state.is_invincible() {
                shapes.push(Shape::Circle {
                    center: p.pos,
                    radius: p.radius + 10.0,
                    color: with_alpha(colors::INVINCIBLE_AURA, colors::INVINCIBLE_AURA[3] * pulse),
                });
            }
            shapes.push(Shape::Circle {
                center: p.pos,
                radius: p.radius,
                color: rgb(p.color, 1.0),
            });
            if p.is_tagger {
                shapes.push(ring(p.pos, p.radius + 2.0, 3.0, colors::TAGGER_RING));
            }
            if p.has_shield() {
                shapes.push(ring(p.pos, p.radius + 6.0, 2.0, colors::SHIELD_RING));
            }
            if p.is_protected(now) {
                let color = with_alpha(colors::PROTECTION_RING, colors::PROTECTION_RING[3] * pulse);
                shapes.push(ring(p.pos, p.radius + 10.0, 2.0, color));
            }
        }

        shapes.push(Shape::Rect {
            rect: Rect::new(state.arena.x, state.arena.y, state.arena.w, HUD_HEIGHT),
            color: colors::HUD_BAND,
        });

        if warning_visible(state, reduced_motion) {
            shapes.push(Shape::Rect {
                rect: state.arena,
                color: colors::WARNING,
            });
        }

        Self { shapes }
    }

    /// Snapshot a duel
    pub fn capture_duel(state: &DuelState) -> Self {
        let now = state.now_ms;
        let mut shapes = vec![Shape::Rect {
            rect: state.arena,
            color: colors::BACKGROUND,
        }];

        if state.phase == DuelPhase::Instructions {
            return Self { shapes };
        }

        for wall in &state.walls {
            shapes.push(Shape::Rect {
                rect: wall.inflated(3.0),
                color: colors::DUEL_WALL_SHADOW,
            });
            shapes.push(Shape::Rect {
                rect: *wall,
                color: colors::DUEL_WALL,
            });
        }

        for w in &state.weapons {
            shapes.push(Shape::Circle {
                center: w.pos + Vec2::splat(WEAPON_SIZE / 2.0),
                radius: 9.0,
                color: colors::WEAPON,
            });
        }

        for b in &state.bullets {
            shapes.push(Shape::Circle {
                center: b.pos,
                radius: 4.0,
                color: colors::BULLET,
            });
        }

        for f in &state.fighters {
            let center = f.draw_pos(now) + Vec2::splat(FIGHTER_SIZE / 2.0);
            shapes.push(Shape::Circle {
                center,
                radius: 16.0,
                color: rgb(f.color, 1.0),
            });

            let aim = f.center() + f.facing.unit() * AIM_DISTANCE;
            shapes.push(Shape::Line {
                from: f.center(),
                to: aim,
                width: 2.0,
                color: [0.7, 0.7, 0.78, 1.0],
            });
            shapes.push(ring(aim, 9.0, 1.0, lighten(rgb(f.color, 1.0), 0.5)));

            if let Some(dash) = f.melee {
                let (color, length) = if dash.hit {
                    (colors::SLASH_HIT, 30.0)
                } else {
                    (colors::SLASH_MISS, 20.0)
                };
                let dir = (dash.end - dash.start).normalize_or(Vec2::X) * (length / 2.0);
                shapes.push(Shape::Line {
                    from: center - dir,
                    to: center + dir,
                    width: 6.0,
                    color,
                });
            }
        }

        Self { shapes }
    }

    /// Flatten every shape into one triangle list
    pub fn vertices(&self) -> Vec<Vertex> {
        let mut out = Vec::new();
        for shape in &self.shapes {
            shape.tessellate(&mut out);
        }
        out
    }
}

fn ring(center: Vec2, radius: f32, thickness: f32, color: [f32; 4]) -> Shape {
    Shape::Ring {
        center,
        inner: radius,
        outer: radius + thickness,
        color,
    }
}

pub fn power_up_color(kind: PowerUpKind) -> [f32; 4] {
    match kind {
        PowerUpKind::Speed => colors::POWER_SPEED,
        PowerUpKind::Shield => colors::POWER_SHIELD,
        PowerUpKind::Freeze => colors::POWER_FREEZE,
        PowerUpKind::Teleport => colors::POWER_TELEPORT,
    }
}

/// The warning overlay shows on even half-seconds while a swap is near
pub fn warning_visible(state: &MatchState, reduced_motion: bool) -> bool {
    if !state.map_warning_active() {
        return false;
    }
    reduced_motion || ((state.now_ms / FLICKER_MS) as i64) % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::{PlayerSetup, PlayerSlot};

    fn new_match() -> MatchState {
        MatchState::new(
            42,
            &Settings::default(),
            PlayerSetup::new("Bartholomew the Great", [10, 20, 30]),
            PlayerSetup::new("Bia", [40, 50, 60]),
        )
    }

    #[test]
    fn test_hud_from_fresh_match() {
        let state = new_match();
        let hud = Hud::from_state(&state);
        assert_eq!(hud.round, 1);
        assert_eq!(hud.rounds, 3);
        assert_eq!(hud.time_left, "1:00");
        assert_eq!(hud.scores, ["0.0".to_string(), "0.0".to_string()]);
        assert_eq!(hud.names[0], "Bartholomew…");
        assert!(hud.tagger.is_some());
        assert!(hud.message.is_none());
        assert!(hud.lines()[0].starts_with("Round 1/3"));
    }

    #[test]
    fn test_scene_marks_tagger_and_shield() {
        let mut state = new_match();
        let runner = state.tagger().map(PlayerSlot::other).unwrap();
        state.player_mut(runner).shield = 1;

        let scene = Scene::capture(&state, false);
        let tagger_rings = scene
            .shapes
            .iter()
            .filter(|s| matches!(s, Shape::Ring { color, .. } if *color == colors::TAGGER_RING))
            .count();
        let shield_rings = scene
            .shapes
            .iter()
            .filter(|s| matches!(s, Shape::Ring { color, .. } if *color == colors::SHIELD_RING))
            .count();
        assert_eq!(tagger_rings, 1);
        assert_eq!(shield_rings, 1);
        assert!(!scene.vertices().is_empty());
    }

    #[test]
    fn test_warning_flickers_unless_reduced_motion() {
        let mut state = new_match();
        state.now_ms = 10_000.0;
        assert!(state.map_warning_active());
        assert!(warning_visible(&state, false));

        state.now_ms = 10_600.0;
        assert!(!warning_visible(&state, false));
        assert!(warning_visible(&state, true));

        state.now_ms = 4_000.0;
        assert!(!warning_visible(&state, true));
    }

    #[test]
    fn test_duel_scene_and_hud() {
        let mut duel = DuelState::new(
            3,
            PlayerSetup::default_for(PlayerSlot::One),
            PlayerSetup::default_for(PlayerSlot::Two),
        );
        assert_eq!(Scene::capture_duel(&duel).shapes.len(), 1);

        duel.phase = DuelPhase::Playing;
        duel.fighters[0].ammo = 2;
        duel.fighters[0].melee_ready_at = 1_500.0;
        let scene = Scene::capture_duel(&duel);
        assert!(scene.shapes.len() > duel.walls.len() * 2);

        let hud = DuelHud::from_state(&duel);
        assert_eq!(hud.fighters[0], "Player 1  •  Ammo: 2  |  Cooldown: 1.5s");
        assert_eq!(hud.fighters[1], "Player 2  •  Ammo: 0");
        assert!(hud.message.is_none());
    }
}
