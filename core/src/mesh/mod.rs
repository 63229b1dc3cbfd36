//! CPU-side mesh data structures.
//!
//! This module provides the vertex record written into transient,
//! frame-scoped geometry buffers. Transient buffers are indexed with
//! 16-bit indices and rebuilt every frame by the renderer.

use bytemuck::{Pod, Zeroable};

use crate::math::{Vec2, Vec3};

/// A single vertex in a transient geometry buffer.
///
/// The `#[repr(C)]` layout matches the GPU vertex stream: position,
/// normal, and two texture-coordinate sets (diffuse and lightmap).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space.
    pub position: [f32; 3],
    /// Normal vector.
    pub normal: [f32; 3],
    /// First texture-coordinate set (diffuse).
    pub tex_coord: [f32; 2],
    /// Second texture-coordinate set (lightmap).
    pub tex_coord2: [f32; 2],
}

impl Vertex {
    /// Create a new vertex with both UV sets equal.
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
            tex_coord2: tex_coord,
        }
    }

    /// Position as a vector.
    pub fn pos(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Set the position from a vector.
    pub fn set_pos(&mut self, p: Vec3) {
        self.position = p.into();
    }

    /// Set the normal from a vector.
    pub fn set_normal(&mut self, n: Vec3) {
        self.normal = n.into();
    }

    /// Set both texture-coordinate sets to the same value.
    pub fn set_tex_coords(&mut self, uv: Vec2) {
        self.tex_coord = uv.into();
        self.tex_coord2 = uv.into();
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new([0.0; 3], [0.0, 0.0, 1.0], [0.0; 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_size() {
        // 3 + 3 + 2 + 2 floats, tightly packed.
        assert_eq!(std::mem::size_of::<Vertex>(), 40);
    }

    #[test]
    fn vertex_accessors() {
        let mut v = Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.5]);
        assert_eq!(v.pos(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(v.tex_coord2, [0.5, 0.5]);

        v.set_pos(Vec3::new(4.0, 5.0, 6.0));
        v.set_tex_coords(Vec2::new(0.0, 1.0));
        assert_eq!(v.position, [4.0, 5.0, 6.0]);
        assert_eq!(v.tex_coord, [0.0, 1.0]);
        assert_eq!(v.tex_coord2, [0.0, 1.0]);
    }
}
