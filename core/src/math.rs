//! Math type aliases and helper functions.
//!
//! Provides the f32 rendering types used throughout the engine.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// Wrap a value into the unit interval `[0, 1)` using floor.
///
/// Unlike `f32::fract`, which truncates toward zero, this always maps
/// negative inputs into `[0, 1)` (e.g. `-0.25` becomes `0.75`).
pub fn wrap01(x: f32) -> f32 {
    x - x.floor()
}

/// Linear interpolation between `a` and `b` by `t`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}
