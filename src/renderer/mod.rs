//! Rendering module
//!
//! Backend-neutral: the scene is plain shapes and HUD text, tessellated into
//! `bytemuck` vertices that any GPU API can upload as-is.

pub mod scene;
pub mod shapes;
pub mod vertex;

pub use scene::{DuelHud, Hud, Scene, Shape};
pub use vertex::Vertex;
