//! Texture-coordinate modifiers and transform composition.
//!
//! Each stage's diffuse bundle carries an ordered [`TexMod`] chain.
//! Composition folds the chain into a single 2x3 affine transform plus
//! a turbulence term evaluated in the fragment shader. Order matters:
//! composing `[A, B]` and applying the result equals applying `A` then
//! `B` to a texture coordinate.

use vermilion_core::math::{wrap01, Vec2};

use crate::error::MaterialError;

use super::wave::{FuncTables, FUNC_TABLE_MASK, FUNC_TABLE_SIZE};
use super::{DrawContext, TextureBundle, WaveForm};

/// A texture-coordinate modifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TexMod {
    /// End-of-chain sentinel; remaining modifiers are not evaluated.
    None,
    /// Waveform-driven turbulence, evaluated per fragment on the GPU.
    /// Contributes to the turbulence output, not the matrix.
    Turbulent(WaveForm),
    /// Scroll by the entity's per-entity texture-coordinate vector.
    EntityTranslate,
    /// Scroll at a constant rate in UV units per second.
    Scroll(Vec2),
    /// Scale texture coordinates.
    Scale(Vec2),
    /// Waveform-driven scale about the texture center.
    Stretch(WaveForm),
    /// Explicit affine transform.
    Transform {
        /// 2x2 linear part, `matrix[column][row]`.
        matrix: [[f32; 2]; 2],
        /// Translation.
        translate: Vec2,
    },
    /// Rotate about the texture center at a constant rate in degrees
    /// per second.
    Rotate(f32),
}

/// Composed result of a bundle's modifier chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexTransform {
    /// 2x2 linear part as `[m00, m10, m01, m11]` (column-major).
    pub matrix: [f32; 4],
    /// Translation.
    pub offset: [f32; 2],
    /// Turbulence `(amplitude, phase-at-time)`.
    pub turbulence: [f32; 2],
}

impl TexTransform {
    /// Identity transform with zero turbulence.
    pub const IDENTITY: Self = Self {
        matrix: [1.0, 0.0, 0.0, 1.0],
        offset: [0.0, 0.0],
        turbulence: [0.0, 0.0],
    };

    /// Apply the affine part to a texture coordinate.
    pub fn apply(&self, uv: Vec2) -> Vec2 {
        let [m00, m10, m01, m11] = self.matrix;
        Vec2::new(
            m00 * uv.x + m01 * uv.y + self.offset[0],
            m10 * uv.x + m11 * uv.y + self.offset[1],
        )
    }
}

impl Default for TexTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A 2x3 affine transform in the same packing as [`TexTransform`].
#[derive(Clone, Copy)]
struct Affine2 {
    m: [f32; 4],
    t: [f32; 2],
}

impl Affine2 {
    const IDENTITY: Self = Self {
        m: [1.0, 0.0, 0.0, 1.0],
        t: [0.0, 0.0],
    };

    /// Compose `local` on top of `self`: applying the result equals
    /// applying `self` first, then `local`.
    fn then(&self, local: &Affine2) -> Self {
        let [c00, c10, c01, c11] = self.m;
        let [l00, l10, l01, l11] = local.m;
        Self {
            m: [
                l00 * c00 + l01 * c10,
                l10 * c00 + l11 * c10,
                l00 * c01 + l01 * c11,
                l10 * c01 + l11 * c11,
            ],
            t: [
                l00 * self.t[0] + l01 * self.t[1] + local.t[0],
                l10 * self.t[0] + l11 * self.t[1] + local.t[1],
            ],
        }
    }
}

impl TextureBundle {
    /// Fold this bundle's modifier chain into a single transform plus
    /// turbulence for the given draw call.
    ///
    /// [`TexMod::None`] stops the fold. [`TexMod::EntityTranslate`]
    /// without entity context is reported and skipped. Fails only when
    /// a [`TexMod::Stretch`] waveform has no lookup table.
    pub fn tex_transform(
        &self,
        material: &str,
        ctx: &DrawContext,
    ) -> Result<TexTransform, MaterialError> {
        let mut composite = Affine2::IDENTITY;
        let mut turbulence = [0.0f32; 2];

        for tex_mod in &self.tex_mods {
            let local = match tex_mod {
                TexMod::None => break,
                TexMod::Turbulent(wave) => {
                    turbulence = [wave.amplitude, wave.phase + ctx.time * wave.frequency];
                    continue;
                }
                TexMod::EntityTranslate => match ctx.entity {
                    Some(entity) => scroll_matrix(entity.scroll, ctx.time),
                    None => {
                        log::warn!(
                            "entity translate tex mod in material '{material}' without entity context"
                        );
                        continue;
                    }
                },
                TexMod::Scroll(speed) => scroll_matrix(*speed, ctx.time),
                TexMod::Scale(scale) => Affine2 {
                    m: [scale.x, 0.0, 0.0, scale.y],
                    t: [0.0, 0.0],
                },
                TexMod::Stretch(wave) => {
                    let p = 1.0 / wave.evaluate(material, ctx.time)?;
                    Affine2 {
                        m: [p, 0.0, 0.0, p],
                        t: [0.5 - 0.5 * p, 0.5 - 0.5 * p],
                    }
                }
                TexMod::Transform { matrix, translate } => Affine2 {
                    m: [matrix[0][0], matrix[0][1], matrix[1][0], matrix[1][1]],
                    t: [translate.x, translate.y],
                },
                TexMod::Rotate(degs_per_second) => rotate_matrix(*degs_per_second, ctx.time),
            };

            composite = composite.then(&local);
        }

        Ok(TexTransform {
            matrix: composite.m,
            offset: composite.t,
            turbulence,
        })
    }
}

/// Scroll translation wrapped to `[0, 1)` so coordinates never grow
/// past hardware interpolation limits.
fn scroll_matrix(speed: Vec2, time: f32) -> Affine2 {
    Affine2 {
        m: [1.0, 0.0, 0.0, 1.0],
        t: [wrap01(speed.x * time), wrap01(speed.y * time)],
    }
}

/// Rotation about the texture center, driven through the sine table so
/// rotation stays phase-aligned with waveform effects.
fn rotate_matrix(degs_per_second: f32, time: f32) -> Affine2 {
    let degs = -degs_per_second * time;
    let index = (degs * (FUNC_TABLE_SIZE as f32 / 360.0)) as i64;
    let tables = FuncTables::get();
    let sin = tables.sin[(index & FUNC_TABLE_MASK) as usize];
    let cos = tables.sin[((index + FUNC_TABLE_SIZE as i64 / 4) & FUNC_TABLE_MASK) as usize];
    Affine2 {
        m: [cos, sin, -sin, cos],
        t: [
            0.5 - 0.5 * cos + 0.5 * sin,
            0.5 - 0.5 * sin - 0.5 * cos,
        ],
    }
}
