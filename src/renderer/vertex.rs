//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    /// Byte stride of one vertex in a buffer
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();
    /// Byte offset of `color` within a vertex
    pub const COLOR_OFFSET: usize = std::mem::size_of::<[f32; 2]>();

    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }
}

/// View a vertex list as raw bytes for upload
pub fn as_bytes(vertices: &[Vertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

/// 8-bit RGB plus alpha to normalized RGBA
pub fn rgb(color: [u8; 3], alpha: f32) -> [f32; 4] {
    [
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
        alpha,
    ]
}

/// Mix toward white by `amount` (0 = unchanged, 1 = white)
pub fn lighten(color: [f32; 4], amount: f32) -> [f32; 4] {
    [
        color[0] + (1.0 - color[0]) * amount,
        color[1] + (1.0 - color[1]) * amount,
        color[2] + (1.0 - color[2]) * amount,
        color[3],
    ]
}

pub fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
    [color[0], color[1], color[2], alpha]
}

/// Colors for game elements
pub mod colors {
    pub const BACKGROUND: [f32; 4] = [0.07, 0.07, 0.10, 1.0];
    pub const HUD_BAND: [f32; 4] = [0.0, 0.0, 0.0, 0.59];
    pub const OBSTACLE: [f32; 4] = [0.35, 0.35, 0.42, 1.0];
    pub const MOVER: [f32; 4] = [0.55, 0.55, 0.65, 1.0];
    pub const HIGHLIGHT: [f32; 4] = [1.0, 1.0, 1.0, 0.18];
    pub const TAGGER_RING: [f32; 4] = [1.0, 0.82, 0.0, 1.0];
    pub const SHIELD_RING: [f32; 4] = [0.45, 0.8, 1.0, 0.9];
    pub const PROTECTION_RING: [f32; 4] = [1.0, 1.0, 1.0, 0.8];
    pub const INVINCIBLE_AURA: [f32; 4] = [0.7, 0.5, 1.0, 0.35];
    pub const WARNING: [f32; 4] = [1.0, 0.2, 0.2, 100.0 / 255.0];

    pub const POWER_SPEED: [f32; 4] = [1.0, 0.85, 0.2, 1.0];
    pub const POWER_SHIELD: [f32; 4] = [0.35, 0.75, 1.0, 1.0];
    pub const POWER_FREEZE: [f32; 4] = [0.7, 0.95, 1.0, 1.0];
    pub const POWER_TELEPORT: [f32; 4] = [0.8, 0.4, 1.0, 1.0];

    pub const DUEL_WALL: [f32; 4] = [0.24, 0.24, 0.24, 1.0];
    pub const DUEL_WALL_SHADOW: [f32; 4] = [0.12, 0.12, 0.12, 1.0];
    pub const WEAPON: [f32; 4] = [0.98, 0.86, 0.39, 1.0];
    pub const BULLET: [f32; 4] = [0.94, 0.94, 0.55, 1.0];
    pub const SLASH_HIT: [f32; 4] = [1.0, 0.86, 0.47, 1.0];
    pub const SLASH_MISS: [f32; 4] = [1.0, 0.63, 0.39, 1.0];
}
