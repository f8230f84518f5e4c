//! Obstacle-free placement searches
//!
//! Every search here is bounded and always returns a position: curated
//! points first, then rejection sampling, then a fixed fallback.

use glam::Vec2;
use rand::Rng;

use super::geometry::{Rect, clamp_circle_into};
use super::map::Obstacles;
use super::state::PlayerSlot;
use crate::consts::*;
use crate::settings::Placement;

/// Margin kept from the side and bottom edges by round spawns
const SPAWN_EDGE_MARGIN: f32 = 80.0;

/// Preferred spawn points as arena fractions, home half of player one
const PREFERRED_LEFT: [(f32, f32); 4] = [(0.15, 0.50), (0.20, 0.40), (0.12, 0.65), (0.30, 0.55)];

/// Uniform sample in `lo..hi`, collapsing to `lo` for an empty range
pub fn sample_range<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Random point inside the pickup band: `margin` from the sides and bottom,
/// below the HUD at the top
pub fn random_interior_point<R: Rng>(rng: &mut R, arena: &Rect, margin: f32) -> Vec2 {
    let x = sample_range(rng, arena.left() + margin, arena.right() - margin);
    let y = sample_range(rng, arena.top() + HUD_HEIGHT, arena.bottom() - margin);
    Vec2::new(x, y)
}

fn home_fraction(slot: PlayerSlot, fx: f32) -> f32 {
    match slot {
        PlayerSlot::One => fx,
        PlayerSlot::Two => 1.0 - fx,
    }
}

/// Collision-free round spawn in the player's home half
pub fn find_safe_spawn<R: Rng>(
    rng: &mut R,
    slot: PlayerSlot,
    arena: &Rect,
    obstacles: &Obstacles,
    radius: f32,
    attempts: u32,
) -> Vec2 {
    let is_safe = |p: Vec2| !obstacles.blocks_circle(p, radius);

    for (fx, fy) in PREFERRED_LEFT {
        let p = Vec2::new(
            arena.left() + arena.w * home_fraction(slot, fx),
            arena.top() + arena.h * fy,
        );
        let p = clamp_circle_into(p, radius, arena);
        if is_safe(p) {
            return p;
        }
    }

    let (x_lo, x_hi) = match slot {
        PlayerSlot::One => (arena.left() + SPAWN_EDGE_MARGIN, arena.left() + arena.w * 0.40),
        PlayerSlot::Two => (arena.left() + arena.w * 0.60, arena.right() - SPAWN_EDGE_MARGIN),
    };
    let (y_lo, y_hi) = (arena.top() + HUD_HEIGHT, arena.bottom() - SPAWN_EDGE_MARGIN);

    for _ in 0..attempts {
        let p = Vec2::new(sample_range(rng, x_lo, x_hi), sample_range(rng, y_lo, y_hi));
        if is_safe(p) {
            return p;
        }
    }

    log::debug!("No safe spawn for {:?} after {} attempts, using fallback", slot, attempts);
    Vec2::new(
        arena.left() + arena.w * home_fraction(slot, 0.25),
        arena.top() + arena.h * 0.5,
    )
}

/// Collision-free point near `from`, for recovering a stuck player
///
/// Samples the unstick ring at random angles, then tries the arena corners
/// and center.
pub fn find_nearby_safe_point<R: Rng>(
    rng: &mut R,
    from: Vec2,
    arena: &Rect,
    obstacles: &Obstacles,
    radius: f32,
    budget: &Placement,
) -> Vec2 {
    let is_safe = |p: Vec2| !obstacles.blocks_circle(p, radius);

    for _ in 0..budget.unstick_attempts {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let dist = sample_range(rng, budget.unstick_min_distance, budget.unstick_max_distance);
        let p = clamp_circle_into(from + Vec2::from_angle(angle) * dist, radius, arena);
        if is_safe(p) {
            return p;
        }
    }

    let inset = radius + POWER_UP_EDGE_MARGIN;
    let fallbacks = [
        Vec2::new(arena.left() + inset, arena.top() + HUD_HEIGHT + radius),
        Vec2::new(arena.right() - inset, arena.top() + HUD_HEIGHT + radius),
        Vec2::new(arena.left() + inset, arena.bottom() - inset),
        Vec2::new(arena.right() - inset, arena.bottom() - inset),
        arena.center(),
    ];
    fallbacks
        .into_iter()
        .map(|p| clamp_circle_into(p, radius, arena))
        .find(|&p| is_safe(p))
        .unwrap_or_else(|| arena.center())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geometry::Circle;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn arena() -> Rect {
        Rect::new(0.0, 0.0, ARENA_WIDTH, ARENA_HEIGHT)
    }

    fn wall_to_wall() -> Obstacles {
        Obstacles {
            static_rects: vec![arena()],
            ..Default::default()
        }
    }

    #[test]
    fn test_spawn_prefers_curated_point_on_open_map() {
        let mut rng = Pcg32::seed_from_u64(1);
        let p = find_safe_spawn(&mut rng, PlayerSlot::One, &arena(), &Obstacles::default(), 22.0, 100);
        assert_eq!(p, Vec2::new(ARENA_WIDTH * 0.15, ARENA_HEIGHT * 0.5));

        let q = find_safe_spawn(&mut rng, PlayerSlot::Two, &arena(), &Obstacles::default(), 22.0, 100);
        assert!((q.x - ARENA_WIDTH * 0.85).abs() < 1e-3);
    }

    #[test]
    fn test_spawn_falls_back_when_everything_is_blocked() {
        let mut rng = Pcg32::seed_from_u64(2);
        let p = find_safe_spawn(&mut rng, PlayerSlot::Two, &arena(), &wall_to_wall(), 22.0, 100);
        assert_eq!(p, Vec2::new(ARENA_WIDTH * 0.75, ARENA_HEIGHT * 0.5));
    }

    #[test]
    fn test_spawn_avoids_obstacles_and_stays_home() {
        // Circles over every curated point on the left
        let obstacles = Obstacles {
            circles: PREFERRED_LEFT
                .iter()
                .map(|&(fx, fy)| Circle::new(ARENA_WIDTH * fx, ARENA_HEIGHT * fy, 40.0))
                .collect(),
            ..Default::default()
        };
        for seed in 0..30 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let p = find_safe_spawn(&mut rng, PlayerSlot::One, &arena(), &obstacles, 22.0, 100);
            assert!(!obstacles.blocks_circle(p, 22.0));
            assert!(p.x <= ARENA_WIDTH * 0.40);
        }
    }

    #[test]
    fn test_nearby_point_is_in_ring_and_clear() {
        let obstacles = Obstacles {
            circles: vec![Circle::new(400.0, 300.0, 25.0)],
            ..Default::default()
        };
        let from = Vec2::new(400.0, 300.0);
        for seed in 0..30 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let p = find_nearby_safe_point(&mut rng, from, &arena(), &obstacles, 22.0, &Placement::default());
            assert!(!obstacles.blocks_circle(p, 22.0));
            assert!(p.distance(from) <= 100.0 + 1e-3);
        }
    }

    #[test]
    fn test_nearby_point_always_returns_something() {
        let mut rng = Pcg32::seed_from_u64(5);
        let p = find_nearby_safe_point(
            &mut rng,
            Vec2::new(450.0, 260.0),
            &arena(),
            &wall_to_wall(),
            22.0,
            &Placement::default(),
        );
        assert_eq!(p, arena().center());
    }

    #[test]
    fn test_interior_point_respects_band() {
        let mut rng = Pcg32::seed_from_u64(9);
        for _ in 0..500 {
            let p = random_interior_point(&mut rng, &arena(), POWER_UP_EDGE_MARGIN);
            assert!(p.x >= 60.0 && p.x < ARENA_WIDTH - 60.0);
            assert!(p.y >= HUD_HEIGHT && p.y < ARENA_HEIGHT - 60.0);
        }
    }

    #[test]
    fn test_sample_range_empty_collapses() {
        let mut rng = Pcg32::seed_from_u64(0);
        assert_eq!(sample_range(&mut rng, 5.0, 5.0), 5.0);
        assert_eq!(sample_range(&mut rng, 5.0, 1.0), 5.0);
    }
}
