//! GPU render-state composition.
//!
//! Each stage folds its blend function, depth configuration, and the
//! material's cull mode into a single [`RenderState`] word consumed by
//! the graphics backend. The blend factors live in two packed 4-bit
//! fields in the low byte; everything else is a plain flag bit.

use bitflags::bitflags;

use vermilion_core::math::Vec4;

use super::{CullMode, FogAdjust, Stage};

/// Blend factor for the stage blend function.
///
/// Discriminants are stable values packed into [`RenderState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum BlendFactor {
    /// 0.0
    Zero = 0,
    /// 1.0
    #[default]
    One = 1,
    /// Source color
    Src = 2,
    /// 1 - source color
    OneMinusSrc = 3,
    /// Source alpha
    SrcAlpha = 4,
    /// 1 - source alpha
    OneMinusSrcAlpha = 5,
    /// Destination color
    Dst = 6,
    /// 1 - destination color
    OneMinusDst = 7,
    /// Destination alpha
    DstAlpha = 8,
    /// 1 - destination alpha
    OneMinusDstAlpha = 9,
    /// min(source alpha, 1 - destination alpha)
    SrcAlphaSaturated = 10,
}

impl BlendFactor {
    /// Decode a packed 4-bit field back into a factor.
    pub fn from_bits(bits: u64) -> Option<Self> {
        match bits {
            0 => Some(Self::Zero),
            1 => Some(Self::One),
            2 => Some(Self::Src),
            3 => Some(Self::OneMinusSrc),
            4 => Some(Self::SrcAlpha),
            5 => Some(Self::OneMinusSrcAlpha),
            6 => Some(Self::Dst),
            7 => Some(Self::OneMinusDst),
            8 => Some(Self::DstAlpha),
            9 => Some(Self::OneMinusDstAlpha),
            10 => Some(Self::SrcAlphaSaturated),
            _ => None,
        }
    }
}

/// Depth test mode for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthTest {
    /// Depth test disabled.
    Disabled,
    /// Pass fragments at or in front of the stored depth (default).
    #[default]
    Lequal,
    /// Pass fragments exactly at the stored depth (multi-pass stages).
    Equal,
}

bitflags! {
    /// Packed GPU state word for one stage.
    ///
    /// Bits 0-7 hold the blend function (two 4-bit [`BlendFactor`]
    /// fields); use [`RenderState::blend_func`] to build them and
    /// [`RenderState::blend_src`] / [`RenderState::blend_dst`] to read
    /// them back.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderState: u64 {
        /// Write to the depth buffer.
        const DEPTH_WRITE = 1 << 8;
        /// Depth test with less-or-equal comparison.
        const DEPTH_TEST_LEQUAL = 1 << 9;
        /// Depth test with equal comparison.
        const DEPTH_TEST_EQUAL = 1 << 10;
        /// Cull clockwise faces.
        const CULL_CW = 1 << 11;
        /// Cull counter-clockwise faces.
        const CULL_CCW = 1 << 12;
    }
}

const BLEND_SRC_SHIFT: u64 = 0;
const BLEND_DST_SHIFT: u64 = 4;
const BLEND_FIELD_MASK: u64 = 0xf;

impl RenderState {
    /// Pack a blend function into the low byte.
    pub fn blend_func(src: BlendFactor, dst: BlendFactor) -> Self {
        Self::from_bits_retain(
            ((src as u64) << BLEND_SRC_SHIFT) | ((dst as u64) << BLEND_DST_SHIFT),
        )
    }

    /// Source blend factor packed in this state word.
    pub fn blend_src(&self) -> Option<BlendFactor> {
        BlendFactor::from_bits((self.bits() >> BLEND_SRC_SHIFT) & BLEND_FIELD_MASK)
    }

    /// Destination blend factor packed in this state word.
    pub fn blend_dst(&self) -> Option<BlendFactor> {
        BlendFactor::from_bits((self.bits() >> BLEND_DST_SHIFT) & BLEND_FIELD_MASK)
    }
}

impl DepthTest {
    fn state_bits(self) -> RenderState {
        match self {
            Self::Disabled => RenderState::empty(),
            Self::Lequal => RenderState::DEPTH_TEST_LEQUAL,
            Self::Equal => RenderState::DEPTH_TEST_EQUAL,
        }
    }
}

impl Stage {
    /// Compose the GPU state word for this stage.
    ///
    /// Front-face winding flips under mirror cameras: a mirrored view
    /// inverts the apparent winding of every triangle, so the cull
    /// direction must flip with it. Two-sided materials skip culling
    /// entirely.
    pub fn render_state(&self, cull: CullMode, mirror: bool) -> RenderState {
        let mut state = RenderState::blend_func(self.blend_src, self.blend_dst);
        state |= self.depth_test.state_bits();

        if self.depth_write {
            state |= RenderState::DEPTH_WRITE;
        }

        if cull != CullMode::TwoSided {
            let cull_front = (cull == CullMode::FrontSided) != mirror;
            state |= if cull_front {
                RenderState::CULL_CCW
            } else {
                RenderState::CULL_CW
            };
        }

        state
    }

    /// Color mask applied when fog modulates this stage.
    pub fn fog_color_mask(&self) -> Vec4 {
        match self.adjust_colors_for_fog {
            FogAdjust::ModulateRgb => Vec4::new(1.0, 1.0, 1.0, 0.0),
            FogAdjust::ModulateAlpha => Vec4::new(0.0, 0.0, 0.0, 1.0),
            FogAdjust::ModulateRgba => Vec4::new(1.0, 1.0, 1.0, 1.0),
            FogAdjust::None => Vec4::zeros(),
        }
    }
}
