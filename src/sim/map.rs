//! Obstacle map catalog
//!
//! A map is a handful of static rectangles, static circles and oscillating
//! ("moving") rectangles. Positions are fractions of the arena size so a map
//! scales with the arena; obstacle sizes are absolute.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{Circle, Rect, circle_overlaps_rect, circles_overlap};

/// Axis a moving rectangle oscillates along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn unit(self) -> Vec2 {
        match self {
            Axis::X => Vec2::X,
            Axis::Y => Vec2::Y,
        }
    }
}

/// A rectangle sliding back and forth on a sine wave
///
/// Its position is a pure function of the clock; nothing is stored between
/// frames besides the per-instance phase offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovingRect {
    pub base: Rect,
    pub axis: Axis,
    /// Peak displacement from `base` in units
    pub amplitude: f32,
    /// Angular speed in radians per second
    pub angular_speed: f32,
    /// Phase offset in milliseconds, randomized per instance
    pub phase_ms: f64,
}

impl MovingRect {
    pub fn new(base: Rect, axis: Axis, amplitude: f32, angular_speed: f32, phase_ms: f64) -> Self {
        Self {
            base,
            axis,
            amplitude,
            angular_speed,
            phase_ms,
        }
    }

    /// Current rectangle at simulation time `now_ms`
    pub fn rect_at(&self, now_ms: f64) -> Rect {
        let t = ((now_ms + self.phase_ms) / 1000.0) as f32;
        let offset = (t * self.angular_speed).sin() * self.amplitude;
        self.base.translated(self.axis.unit() * offset)
    }
}

/// Named layouts in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKind {
    #[default]
    Original,
    Alternate,
    Scattered,
}

impl MapKind {
    pub const ALL: [MapKind; 3] = [MapKind::Original, MapKind::Alternate, MapKind::Scattered];

    pub fn as_str(&self) -> &'static str {
        match self {
            MapKind::Original => "original",
            MapKind::Alternate => "alternate",
            MapKind::Scattered => "scattered",
        }
    }

    /// Look up a map by name; unknown names fall back to the original layout
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "alternate" => MapKind::Alternate,
            "scattered" => MapKind::Scattered,
            _ => MapKind::Original,
        }
    }
}

/// A concrete, arena-sized map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapData {
    pub kind: MapKind,
    pub static_rects: Vec<Rect>,
    pub circles: Vec<Circle>,
    pub movers: Vec<MovingRect>,
}

impl MapData {
    /// Freeze the map at `now_ms` into plain shapes for collision tests
    pub fn obstacles_at(&self, now_ms: f64) -> Obstacles {
        Obstacles {
            static_rects: self.static_rects.clone(),
            mover_rects: self.movers.iter().map(|m| m.rect_at(now_ms)).collect(),
            circles: self.circles.clone(),
        }
    }
}

/// Obstacle shapes at one instant
#[derive(Debug, Clone, Default)]
pub struct Obstacles {
    pub static_rects: Vec<Rect>,
    pub mover_rects: Vec<Rect>,
    pub circles: Vec<Circle>,
}

impl Obstacles {
    /// Whether a circle at `center` touches any rectangle or circle obstacle
    pub fn blocks_circle(&self, center: Vec2, radius: f32) -> bool {
        self.static_rects
            .iter()
            .chain(self.mover_rects.iter())
            .any(|r| circle_overlaps_rect(center, radius, r))
            || self
                .circles
                .iter()
                .any(|c| circles_overlap(center, radius, c.center, c.radius))
    }
}

/// Build a catalog map scaled to a `width` x `height` arena
///
/// Each moving rectangle draws its phase offset from `rng` so movers never
/// share a cycle.
pub fn get_map<R: Rng>(kind: MapKind, width: f32, height: f32, rng: &mut R) -> MapData {
    let w = width;
    let h = height;
    let mut mover = |x: f32, y: f32, mw: f32, mh: f32, axis: Axis, amp: f32, speed: f32| {
        MovingRect::new(
            Rect::new(x, y, mw, mh),
            axis,
            amp,
            speed,
            rng.random_range(0.0..1000.0),
        )
    };

    match kind {
        MapKind::Original => MapData {
            kind,
            static_rects: vec![
                Rect::new(w * 0.10, h * 0.20, 200.0, 24.0),
                Rect::new(w * 0.68, h * 0.60, 180.0, 24.0),
                Rect::new(w * 0.08, h * 0.78, 240.0, 20.0),
            ],
            circles: vec![
                Circle::new(w * 0.25, h * 0.62, 36.0),
                Circle::new(w * 0.80, h * 0.25, 28.0),
            ],
            movers: vec![
                mover(w * 0.40, h * 0.38, 24.0, 140.0, Axis::X, 40.0, 1.3),
                mover(w * 0.55, h * 0.18, 160.0, 20.0, Axis::Y, 40.0, 1.7),
            ],
        },
        MapKind::Alternate => MapData {
            kind,
            static_rects: vec![
                Rect::new(w * 0.30, h * 0.30, 150.0, 24.0),
                Rect::new(w * 0.50, h * 0.60, 24.0, 120.0),
                Rect::new(w * 0.70, h * 0.20, 180.0, 20.0),
            ],
            circles: vec![
                Circle::new(w * 0.60, h * 0.40, 32.0),
                Circle::new(w * 0.25, h * 0.70, 28.0),
            ],
            movers: vec![
                mover(w * 0.20, h * 0.50, 120.0, 24.0, Axis::X, 60.0, 1.1),
                mover(w * 0.60, h * 0.70, 24.0, 100.0, Axis::Y, 50.0, 1.5),
            ],
        },
        MapKind::Scattered => MapData {
            kind,
            static_rects: vec![
                Rect::new(w * 0.15, h * 0.30, 150.0, 24.0),
                Rect::new(w * 0.70, h * 0.40, 100.0, 24.0),
                Rect::new(w * 0.20, h * 0.70, 300.0, 20.0),
            ],
            circles: vec![
                Circle::new(w * 0.40, h * 0.30, 40.0),
                Circle::new(w * 0.60, h * 0.60, 32.0),
            ],
            movers: vec![
                mover(w * 0.50, h * 0.50, 30.0, 120.0, Axis::X, 60.0, 1.0),
                mover(w * 0.30, h * 0.20, 120.0, 20.0, Axis::Y, 50.0, 1.5),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_mover_is_pure_function_of_time() {
        let m = MovingRect::new(Rect::new(100.0, 50.0, 24.0, 140.0), Axis::X, 40.0, 1.3, 250.0);
        assert_eq!(m.rect_at(1234.0), m.rect_at(1234.0));

        // Only the oscillation axis moves
        let r = m.rect_at(5000.0);
        assert_eq!(r.y, 50.0);
        assert_eq!(r.w, 24.0);
        assert!((r.x - 100.0).abs() <= 40.0 + 1e-3);
    }

    #[test]
    fn test_mover_matches_sine_formula() {
        let m = MovingRect::new(Rect::new(0.0, 200.0, 160.0, 20.0), Axis::Y, 40.0, 1.7, 500.0);
        let now = 2500.0;
        let expected = 200.0 + ((3.0f32) * 1.7).sin() * 40.0;
        assert!((m.rect_at(now).y - expected).abs() < 1e-3);
    }

    #[test]
    fn test_catalog_shapes_and_scaling() {
        let mut rng = Pcg32::seed_from_u64(7);
        for kind in MapKind::ALL {
            let map = get_map(kind, 900.0, 520.0, &mut rng);
            assert_eq!(map.kind, kind);
            assert!((2..=3).contains(&map.static_rects.len()));
            assert_eq!(map.circles.len(), 2);
            assert_eq!(map.movers.len(), 2);
        }

        let small = get_map(MapKind::Original, 450.0, 260.0, &mut rng);
        let big = get_map(MapKind::Original, 900.0, 520.0, &mut rng);
        assert!((big.static_rects[0].x - small.static_rects[0].x * 2.0).abs() < 1e-3);
        assert_eq!(big.static_rects[0].w, small.static_rects[0].w);
    }

    #[test]
    fn test_movers_get_distinct_phases() {
        let mut rng = Pcg32::seed_from_u64(99);
        let map = get_map(MapKind::Original, 900.0, 520.0, &mut rng);
        assert_ne!(map.movers[0].phase_ms, map.movers[1].phase_ms);
    }

    #[test]
    fn test_unknown_name_falls_back_to_original() {
        assert_eq!(MapKind::from_name("alternate"), MapKind::Alternate);
        assert_eq!(MapKind::from_name("does-not-exist"), MapKind::Original);
    }

    #[test]
    fn test_blocks_circle_checks_every_kind() {
        let obstacles = Obstacles {
            static_rects: vec![Rect::new(0.0, 0.0, 10.0, 10.0)],
            mover_rects: vec![Rect::new(100.0, 0.0, 10.0, 10.0)],
            circles: vec![Circle::new(200.0, 200.0, 10.0)],
        };
        assert!(obstacles.blocks_circle(Vec2::new(15.0, 5.0), 6.0));
        assert!(obstacles.blocks_circle(Vec2::new(95.0, 5.0), 6.0));
        assert!(obstacles.blocks_circle(Vec2::new(215.0, 200.0), 6.0));
        assert!(!obstacles.blocks_circle(Vec2::new(50.0, 100.0), 6.0));
    }
}
