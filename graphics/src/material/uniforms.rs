//! Packed per-stage uniform block.
//!
//! The GPU layer uploads one [`StageUniforms`] block per stage per
//! draw call. Generator-dependent sections are only recomputed when
//! the matching [`UniformFlags`] bit is set, so callers can refresh
//! color state without re-composing texture transforms and vice versa.

use bitflags::bitflags;

use bytemuck::{Pod, Zeroable};

use crate::error::MaterialError;

use super::{AlphaGen, DrawContext, Material, Stage, TexCoordGen};

bitflags! {
    /// Selects which generator-dependent uniform sections to fill.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UniformFlags: u32 {
        /// Recompute rgbGen/alphaGen colors (and portal range).
        const COLOR_GEN = 1 << 0;
        /// Recompute the texture transform (and tcGen vectors).
        const TEX_GEN = 1 << 1;
    }
}

/// Per-stage uniform values in GPU upload layout.
///
/// Every field is one `vec4` slot; scalars sit in `.x` with the rest
/// zeroed.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct StageUniforms {
    /// `[alpha test tag, 0, 0, 0]`.
    pub alpha_test: [f32; 4],
    /// `[light mode tag, 0, 0, 0]`.
    pub light_type: [f32; 4],
    /// Normal-map scale.
    pub normal_scale: [f32; 4],
    /// Specular scale.
    pub specular_scale: [f32; 4],
    /// `[tcGen tag, rgbGen tag, alphaGen tag, 0]`.
    pub generators: [f32; 4],
    /// Base color from the color generators.
    pub base_color: [f32; 4],
    /// Vertex-color multiplier from the color generators.
    pub vertex_color: [f32; 4],
    /// `[portal range, 0, 0, 0]` for portal alpha stages.
    pub portal_range: [f32; 4],
    /// 2x2 texture matrix as `[m00, m10, m01, m11]`.
    pub tex_matrix: [f32; 4],
    /// `[offset s, offset t, turbulence amplitude, turbulence phase]`.
    pub tex_offset_turb: [f32; 4],
    /// First tcGen vector for [`TexCoordGen::Vector`].
    pub tc_gen_vector0: [f32; 4],
    /// Second tcGen vector for [`TexCoordGen::Vector`].
    pub tc_gen_vector1: [f32; 4],
}

static_assertions::const_assert_eq!(std::mem::size_of::<StageUniforms>(), 192);

impl Stage {
    /// Fill the uniform block for this stage.
    ///
    /// Generator-dependent values are computed into locals before any
    /// field is written, so a failed evaluation leaves `out` exactly as
    /// it was and the caller can drop the draw call.
    pub fn write_uniforms(
        &self,
        material: &Material,
        ctx: &DrawContext,
        flags: UniformFlags,
        out: &mut StageUniforms,
    ) -> Result<(), MaterialError> {
        let colors = if flags.contains(UniformFlags::COLOR_GEN) {
            Some(self.compute_colors(&material.name, ctx)?)
        } else {
            None
        };

        let tex = if flags.contains(UniformFlags::TEX_GEN) {
            match self.diffuse_bundle() {
                Some(bundle) => Some(bundle.tex_transform(&material.name, ctx)?),
                None => Some(Default::default()),
            }
        } else {
            None
        };

        out.alpha_test = [self.alpha_test as u8 as f32, 0.0, 0.0, 0.0];
        out.light_type = [self.light as u8 as f32, 0.0, 0.0, 0.0];
        out.normal_scale = self.normal_scale.into();
        out.specular_scale = self.specular_scale.into();

        if !flags.is_empty() {
            let tc_gen = self
                .diffuse_bundle()
                .map_or(TexCoordGen::None, |bundle| bundle.tc_gen);
            out.generators = [
                tc_gen as u8 as f32,
                self.rgb_gen as u8 as f32,
                self.alpha_gen as u8 as f32,
                0.0,
            ];
        }

        if let Some((base, vertex)) = colors {
            out.base_color = base.into();
            out.vertex_color = vertex.into();

            if self.alpha_gen == AlphaGen::Portal {
                out.portal_range = [material.portal_range, 0.0, 0.0, 0.0];
            }
        }

        if let Some(tex) = tex {
            out.tex_matrix = tex.matrix;
            out.tex_offset_turb = [
                tex.offset[0],
                tex.offset[1],
                tex.turbulence[0],
                tex.turbulence[1],
            ];

            if let Some(bundle) = self.diffuse_bundle() {
                if bundle.tc_gen == TexCoordGen::Vector {
                    let v0 = bundle.tc_gen_vectors[0];
                    let v1 = bundle.tc_gen_vectors[1];
                    out.tc_gen_vector0 = [v0.x, v0.y, v0.z, 0.0];
                    out.tc_gen_vector1 = [v1.x, v1.y, v1.z, 0.0];
                }
            }
        }

        Ok(())
    }
}
