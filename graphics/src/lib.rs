//! # Vermilion Graphics
//!
//! Procedural material evaluation for the Vermilion renderer.
//!
//! ## Overview
//!
//! This crate computes, once per draw call, everything a material needs
//! before submission to the GPU layer:
//!
//! - [`material::WaveForm`] - table-driven periodic signal evaluation
//! - [`material::TexMod`] - texture-coordinate animation (affine chain + turbulence)
//! - [`material::ColorGen`] / [`material::AlphaGen`] - base/vertex color derivation
//! - [`material::RenderState`] - GPU blend/depth/cull state word
//! - [`material::Deform`] - host-side billboard deforms and GPU deform packing
//! - [`material::StageUniforms`] - the packed per-stage uniform block
//!
//! ## Example
//!
//! ```ignore
//! use vermilion_graphics::material::{DrawContext, Material, UniformFlags};
//!
//! let ctx = DrawContext::new(material.resolve_time(scene_time, None));
//! let state = material.stages[0].render_state(material.cull, ctx.mirror);
//! let mut uniforms = StageUniforms::zeroed();
//! material.stages[0].write_uniforms(&material, &ctx, UniformFlags::all(), &mut uniforms)?;
//! ```

pub mod error;
pub mod material;

// Re-export main types for convenience
pub use error::MaterialError;
pub use material::{
    AlphaGen, BlendFactor, ColorGen, CullMode, DeformUniforms, DrawContext, EntityState, Material,
    RenderState, Stage, StageUniforms, TexMod, TextureBundle, TransientDrawCall, UniformFlags,
    ViewAxes, WaveForm, WaveFunc,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
///
/// This should be called before using any graphics functionality.
pub fn init() {
    log::info!("Vermilion Graphics v{} initialized", VERSION);
}
