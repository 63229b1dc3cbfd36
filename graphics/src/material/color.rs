//! Stage color and alpha generation.
//!
//! Each stage derives two 4-vectors per draw call: a base color and a
//! vertex-color multiplier. The GPU combines them with the vertex
//! stream as `base + vertex * attribute`, so "vertex" modes route the
//! attribute through while constant modes zero it out.

use vermilion_core::math::Vec4;

use crate::error::MaterialError;

use super::{BlendFactor, DrawContext, Stage, WaveForm, WaveFunc};

/// RGB generator mode.
///
/// Discriminants are stable tags consumed by the stage uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ColorGen {
    /// Unparseable generator kept as a no-op.
    Bad = 0,
    /// Identity color scaled by the identity-light factor.
    IdentityLighting = 1,
    /// Plain white (default).
    #[default]
    Identity = 2,
    /// Entity shader color.
    Entity = 3,
    /// Inverted entity shader color.
    OneMinusEntity = 4,
    /// Vertex colors, unlit.
    ExactVertex = 5,
    /// Vertex colors, unlit, lightmapped variant.
    ExactVertexLit = 6,
    /// Vertex colors scaled by identity light.
    Vertex = 7,
    /// Vertex colors scaled by identity light, lightmapped variant.
    VertexLit = 8,
    /// Inverted vertex colors.
    OneMinusVertex = 9,
    /// Waveform-driven glow.
    Waveform = 10,
    /// Diffuse lighting, computed in the shader.
    LightingDiffuse = 11,
    /// Fog color. Placeholder: no fog volume plumbing yet, so this
    /// writes nothing.
    Fog = 12,
    /// Constant color from the stage definition.
    Const = 13,
}

/// Alpha generator mode.
///
/// Discriminants are stable tags consumed by the stage uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum AlphaGen {
    /// Leave alpha as the RGB generator produced it.
    #[default]
    Skip = 0,
    /// Opaque alpha, finished in the shader.
    Identity = 1,
    /// Entity shader alpha.
    Entity = 2,
    /// Inverted entity shader alpha.
    OneMinusEntity = 3,
    /// Vertex alpha.
    Vertex = 4,
    /// Inverted vertex alpha.
    OneMinusVertex = 5,
    /// Specular highlight alpha, computed in the shader.
    LightingSpecular = 6,
    /// Waveform-driven alpha.
    Waveform = 7,
    /// Portal-distance alpha, computed in the shader.
    Portal = 8,
    /// Constant alpha from the stage definition.
    Const = 9,
}

/// Waveform-driven glow value for [`ColorGen::Waveform`].
///
/// Noise waveforms bypass the table bank and sample the 4-D noise
/// field; periodic waveforms are scaled by the identity-light factor.
fn wave_color_single(
    wave: &WaveForm,
    material: &str,
    ctx: &DrawContext,
) -> Result<f32, MaterialError> {
    let glow = if wave.func == WaveFunc::Noise {
        wave.noise_glow(ctx.time)
    } else {
        wave.evaluate(material, ctx.time)? * ctx.identity_light
    };
    Ok(glow.clamp(0.0, 1.0))
}

impl Stage {
    /// Compute this stage's base and vertex color vectors.
    ///
    /// Defaults are `base = white`, `vertex = zero`; the rgb and alpha
    /// generators then rewrite their fields independently. A final
    /// overbright multiply compensates global brightness unless the
    /// blend function already reads the destination/source color.
    pub fn compute_colors(
        &self,
        material: &str,
        ctx: &DrawContext,
    ) -> Result<(Vec4, Vec4), MaterialError> {
        let mut base = Vec4::new(1.0, 1.0, 1.0, 1.0);
        let mut vertex = Vec4::zeros();
        let il = ctx.identity_light;

        match self.rgb_gen {
            ColorGen::IdentityLighting => {
                base.x = il;
                base.y = il;
                base.z = il;
            }
            ColorGen::ExactVertex | ColorGen::ExactVertexLit => {
                base = Vec4::zeros();
                vertex = Vec4::new(1.0, 1.0, 1.0, 1.0);
            }
            ColorGen::Const => {
                base.x = self.constant_color[0] as f32 / 255.0;
                base.y = self.constant_color[1] as f32 / 255.0;
                base.z = self.constant_color[2] as f32 / 255.0;
                base.w = self.constant_color[3] as f32 / 255.0;
            }
            ColorGen::Vertex => {
                base = Vec4::zeros();
                vertex = Vec4::new(il, il, il, 1.0);
            }
            ColorGen::VertexLit => {
                base = Vec4::zeros();
                vertex = Vec4::new(il, il, il, il);
            }
            ColorGen::OneMinusVertex => {
                base.x = il;
                base.y = il;
                base.z = il;
                vertex.x = -il;
                vertex.y = -il;
                vertex.z = -il;
            }
            ColorGen::Waveform => {
                let glow = wave_color_single(&self.rgb_wave, material, ctx)?;
                base.x = glow;
                base.y = glow;
                base.z = glow;
            }
            ColorGen::Entity => {
                if let Some(entity) = ctx.entity {
                    base.x = entity.shader_color[0] as f32 / 255.0;
                    base.y = entity.shader_color[1] as f32 / 255.0;
                    base.z = entity.shader_color[2] as f32 / 255.0;
                    base.w = entity.shader_color[3] as f32 / 255.0;
                } else {
                    log::warn!("entity rgb gen in material '{material}' without entity context");
                }
            }
            ColorGen::OneMinusEntity => {
                if let Some(entity) = ctx.entity {
                    base.x = 1.0 - entity.shader_color[0] as f32 / 255.0;
                    base.y = 1.0 - entity.shader_color[1] as f32 / 255.0;
                    base.z = 1.0 - entity.shader_color[2] as f32 / 255.0;
                    base.w = 1.0 - entity.shader_color[3] as f32 / 255.0;
                } else {
                    log::warn!("entity rgb gen in material '{material}' without entity context");
                }
            }
            ColorGen::Fog => {
                // Intentionally disabled pending fog volume plumbing.
            }
            ColorGen::Identity | ColorGen::LightingDiffuse | ColorGen::Bad => {}
        }

        match self.alpha_gen {
            AlphaGen::Skip => {}
            AlphaGen::Const => {
                base.w = self.constant_color[3] as f32 / 255.0;
                vertex.w = 0.0;
            }
            AlphaGen::Waveform => {
                base.w = self.alpha_wave.evaluate_clamped(material, ctx.time)?;
                vertex.w = 0.0;
            }
            AlphaGen::Entity => {
                if let Some(entity) = ctx.entity {
                    base.w = entity.shader_color[3] as f32 / 255.0;
                } else {
                    log::warn!("entity alpha gen in material '{material}' without entity context");
                }
                vertex.w = 0.0;
            }
            AlphaGen::OneMinusEntity => {
                if let Some(entity) = ctx.entity {
                    base.w = 1.0 - entity.shader_color[3] as f32 / 255.0;
                } else {
                    log::warn!("entity alpha gen in material '{material}' without entity context");
                }
                vertex.w = 0.0;
            }
            AlphaGen::Vertex => {
                base.w = 0.0;
                vertex.w = 1.0;
            }
            AlphaGen::OneMinusVertex => {
                base.w = 1.0;
                vertex.w = -1.0;
            }
            AlphaGen::Identity | AlphaGen::LightingSpecular | AlphaGen::Portal => {
                // Finished entirely in the shader.
                base.w = 1.0;
                vertex.w = 0.0;
            }
        }

        // Overbright compensation, skipped when the blend function
        // already reads the framebuffer or source color.
        if ctx.overbright > 1.0
            && !matches!(self.blend_src, BlendFactor::Dst | BlendFactor::OneMinusDst)
            && !matches!(self.blend_dst, BlendFactor::Src | BlendFactor::OneMinusSrc)
        {
            for c in 0..3 {
                base[c] *= ctx.overbright;
                vertex[c] *= ctx.overbright;
            }
        }

        Ok((base, vertex))
    }
}

#[cfg(test)]
mod tests {
    use super::super::EntityState;
    use super::*;

    const MATERIAL: &str = "textures/test/color";

    fn stage() -> Stage {
        Stage {
            active: true,
            ..Stage::new()
        }
    }

    #[test]
    fn defaults_are_white_and_zero() {
        let ctx = DrawContext::new(0.0);
        let (base, vertex) = stage().compute_colors(MATERIAL, &ctx).unwrap();
        assert_eq!(base, Vec4::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(vertex, Vec4::zeros());
    }

    #[test]
    fn const_color_normalizes_bytes() {
        let mut s = stage();
        s.rgb_gen = ColorGen::Const;
        s.constant_color = [255, 128, 0, 255];
        let ctx = DrawContext::new(0.0);
        let (base, _) = s.compute_colors(MATERIAL, &ctx).unwrap();
        assert_eq!(base.x, 1.0);
        assert!((base.y - 0.50196).abs() < 1e-4);
        assert_eq!(base.z, 0.0);
        assert_eq!(base.w, 1.0);
    }

    #[test]
    fn vertex_mode_routes_attribute() {
        let mut s = stage();
        s.rgb_gen = ColorGen::Vertex;
        let ctx = DrawContext::new(0.0).with_identity_light(0.5);
        let (base, vertex) = s.compute_colors(MATERIAL, &ctx).unwrap();
        assert_eq!(base.x, 0.0);
        assert_eq!(vertex, Vec4::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn one_minus_vertex_inverts() {
        let mut s = stage();
        s.rgb_gen = ColorGen::OneMinusVertex;
        let ctx = DrawContext::new(0.0);
        let (base, vertex) = s.compute_colors(MATERIAL, &ctx).unwrap();
        assert_eq!(base.x, 1.0);
        assert_eq!(vertex.x, -1.0);
    }

    #[test]
    fn entity_color_without_entity_is_noop() {
        let mut s = stage();
        s.rgb_gen = ColorGen::Entity;
        let ctx = DrawContext::new(0.0);
        let (base, _) = s.compute_colors(MATERIAL, &ctx).unwrap();
        assert_eq!(base, Vec4::new(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn entity_color_reads_shader_color() {
        let mut s = stage();
        s.rgb_gen = ColorGen::Entity;
        s.alpha_gen = AlphaGen::OneMinusEntity;
        let entity = EntityState {
            shader_color: [255, 0, 255, 51],
            ..Default::default()
        };
        let ctx = DrawContext::new(0.0).with_entity(&entity);
        let (base, vertex) = s.compute_colors(MATERIAL, &ctx).unwrap();
        assert_eq!(base.x, 1.0);
        assert_eq!(base.y, 0.0);
        assert!((base.w - 0.8).abs() < 1e-5);
        assert_eq!(vertex.w, 0.0);
    }

    #[test]
    fn alpha_skip_preserves_rgb_gen_alpha() {
        let mut s = stage();
        s.rgb_gen = ColorGen::Const;
        s.constant_color = [10, 20, 30, 102];
        s.alpha_gen = AlphaGen::Skip;
        let ctx = DrawContext::new(0.0);
        let (base, _) = s.compute_colors(MATERIAL, &ctx).unwrap();
        assert!((base.w - 0.4).abs() < 1e-5);
    }

    #[test]
    fn portal_alpha_is_shader_finished() {
        let mut s = stage();
        s.alpha_gen = AlphaGen::Portal;
        let ctx = DrawContext::new(0.0);
        let (base, vertex) = s.compute_colors(MATERIAL, &ctx).unwrap();
        assert_eq!(base.w, 1.0);
        assert_eq!(vertex.w, 0.0);
    }

    #[test]
    fn waveform_rgb_clamps_and_scales() {
        let mut s = stage();
        s.rgb_gen = ColorGen::Waveform;
        s.rgb_wave = WaveForm::new(WaveFunc::Square, 0.0, 1.0, 0.0, 1.0);
        let ctx = DrawContext::new(0.1).with_identity_light(0.5);
        let (base, _) = s.compute_colors(MATERIAL, &ctx).unwrap();
        assert_eq!(base.x, 0.5);

        // Negative half of the square clamps to zero.
        let ctx = DrawContext::new(0.6).with_identity_light(0.5);
        let (base, _) = s.compute_colors(MATERIAL, &ctx).unwrap();
        assert_eq!(base.x, 0.0);
    }

    #[test]
    fn noise_waveform_uses_glow_path() {
        let mut s = stage();
        s.rgb_gen = ColorGen::Waveform;
        s.rgb_wave = WaveForm::new(WaveFunc::Noise, 0.5, 0.3, 0.0, 1.0);
        let ctx = DrawContext::new(2.0);
        let (base, _) = s.compute_colors(MATERIAL, &ctx).unwrap();
        assert!((0.0..=1.0).contains(&base.x));
        assert_eq!(base.x, base.y);
    }

    #[test]
    fn waveform_with_none_func_fails() {
        let mut s = stage();
        s.rgb_gen = ColorGen::Waveform;
        s.rgb_wave = WaveForm::default();
        let ctx = DrawContext::new(0.0);
        assert!(s.compute_colors(MATERIAL, &ctx).is_err());
    }

    #[test]
    fn overbright_doubles_non_blended_stages() {
        let mut s = stage();
        s.rgb_gen = ColorGen::IdentityLighting;
        let ctx = DrawContext::new(0.0).with_identity_light(0.5).with_overbright(2.0);
        let (base, _) = s.compute_colors(MATERIAL, &ctx).unwrap();
        assert_eq!(base.x, 1.0);
        assert_eq!(base.w, 1.0);
    }

    #[test]
    fn overbright_skips_dest_color_blends() {
        let mut s = stage();
        s.rgb_gen = ColorGen::IdentityLighting;
        s.blend_src = BlendFactor::Dst;
        let ctx = DrawContext::new(0.0).with_identity_light(0.5).with_overbright(2.0);
        let (base, _) = s.compute_colors(MATERIAL, &ctx).unwrap();
        assert_eq!(base.x, 0.5);
    }
}
