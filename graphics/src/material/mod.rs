//! Material definitions and per-draw-call evaluation.
//!
//! A [`Material`] is an immutable, load-time description of how a
//! surface renders: an ordered list of [`Stage`]s (blended passes) plus
//! a list of vertex [`Deform`]s. Per draw call the renderer builds a
//! [`DrawContext`] (resolved time, entity state, camera flags) and asks
//! each active stage for its GPU state word, packed uniform block, and
//! texture bindings. Nothing here mutates the material itself, so one
//! material can be evaluated from several draw-call workers at once.
//!
//! Module layout:
//!
//! - [`wave`] - waveform table bank and evaluator
//! - [`noise`] - 4-D value noise for the color glow path
//! - [`texmod`] - texture-coordinate modifier chain composition
//! - [`color`] - rgbGen/alphaGen color derivation
//! - [`state`] - GPU render-state bitmask and fog color mask
//! - [`deform`] - host-side billboard deforms and GPU deform packing
//! - [`uniforms`] - the packed per-stage uniform block

mod color;
mod deform;
mod noise;
mod state;
mod texmod;
mod uniforms;
mod wave;

pub use color::{AlphaGen, ColorGen};
pub use deform::{Deform, DeformUniforms, TransientDrawCall, MAX_DEFORMS};
pub use state::{BlendFactor, DepthTest, RenderState};
pub use texmod::{TexMod, TexTransform};
pub use uniforms::{StageUniforms, UniformFlags};
pub use wave::{WaveForm, WaveFunc, FUNC_TABLE_SIZE};

use vermilion_core::math::{Vec2, Vec3, Vec4};

use wave::FUNC_TABLE_SIZE_LOG2;

/// Opaque handle to a GPU texture owned by the texture cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Face culling mode for a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// Cull back faces (default).
    #[default]
    FrontSided,
    /// Cull front faces.
    BackSided,
    /// No culling.
    TwoSided,
}

/// Per-stage lighting mode tag, forwarded to the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum LightMode {
    /// No dynamic lighting.
    #[default]
    None = 0,
    /// Lightmap-driven lighting.
    Map = 1,
    /// Per-vertex lighting.
    Vertex = 2,
    /// Directional vector lighting.
    Vector = 3,
}

/// Alpha-test mode tag, forwarded to the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum AlphaTest {
    /// Alpha test disabled.
    #[default]
    None = 0,
    /// Pass fragments with alpha > 0.
    Gt0 = 1,
    /// Pass fragments with alpha < 128/255.
    Lt128 = 2,
    /// Pass fragments with alpha >= 128/255.
    Ge128 = 3,
}

/// How fog modulates a stage's output color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FogAdjust {
    /// No fog adjustment.
    #[default]
    None,
    /// Fog modulates RGB only.
    ModulateRgb,
    /// Fog modulates alpha only.
    ModulateAlpha,
    /// Fog modulates RGB and alpha.
    ModulateRgba,
}

/// Texture-coordinate generator for a bundle.
///
/// Discriminants are stable tags consumed by the stage uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TexCoordGen {
    /// No coordinates generated.
    None = 0,
    /// Raw vertex coordinates.
    Identity = 1,
    /// Lightmap coordinate set.
    Lightmap = 2,
    /// Diffuse coordinate set (default).
    #[default]
    Texture = 3,
    /// Environment-mapped (reflection) coordinates.
    EnvironmentMapped = 4,
    /// Fog coordinates.
    Fog = 5,
    /// Projected from two generator vectors.
    Vector = 6,
}

/// Render-relevant state of the entity a draw call belongs to.
///
/// Supplied by scene management; all fields are snapshots taken when
/// the draw call was recorded.
#[derive(Debug, Clone, Copy)]
pub struct EntityState {
    /// Entity-local rotation axes (forward, left, up).
    pub axis: [Vec3; 3],
    /// Whether the axes carry non-uniform scale.
    pub non_normalized_axes: bool,
    /// Entity shader color, 8-bit RGBA.
    pub shader_color: [u8; 4],
    /// Entity-relative time offset in seconds.
    pub shader_time: f32,
    /// Entity-supplied texture scroll vector.
    pub scroll: Vec2,
}

impl Default for EntityState {
    fn default() -> Self {
        Self {
            axis: [Vec3::x(), Vec3::y(), Vec3::z()],
            non_normalized_axes: false,
            shader_color: [255; 4],
            shader_time: 0.0,
            scroll: Vec2::zeros(),
        }
    }
}

/// Camera basis used by the CPU deform engine.
///
/// Rows of the scene rotation matrix: view forward, left, and up
/// directions in world space.
#[derive(Debug, Clone, Copy)]
pub struct ViewAxes {
    /// View forward direction.
    pub forward: Vec3,
    /// View left direction.
    pub left: Vec3,
    /// View up direction.
    pub up: Vec3,
}

impl ViewAxes {
    /// Create a view basis from forward/left/up directions.
    pub fn new(forward: Vec3, left: Vec3, up: Vec3) -> Self {
        Self { forward, left, up }
    }

    /// Project this basis into the entity's local axes.
    ///
    /// Each returned direction is the view direction expressed in the
    /// entity's coordinate frame.
    pub fn in_entity_space(&self, entity: &EntityState) -> Self {
        let project = |dir: &Vec3| {
            Vec3::new(
                dir.dot(&entity.axis[0]),
                dir.dot(&entity.axis[1]),
                dir.dot(&entity.axis[2]),
            )
        };
        Self {
            forward: project(&self.forward),
            left: project(&self.left),
            up: project(&self.up),
        }
    }
}

impl Default for ViewAxes {
    fn default() -> Self {
        Self::new(Vec3::x(), Vec3::y(), Vec3::z())
    }
}

/// Everything a single draw call needs for material evaluation.
///
/// Built once per draw call and passed explicitly through every
/// operation; materials themselves stay immutable, so concurrent draw
/// calls referencing one material each use their own snapshot.
#[derive(Debug, Clone, Copy)]
pub struct DrawContext<'a> {
    /// Evaluation time in seconds (see [`Material::resolve_time`]).
    pub time: f32,
    /// Entity the draw call belongs to, if any.
    pub entity: Option<&'a EntityState>,
    /// Whether the view is a mirror camera (inverts apparent winding).
    pub mirror: bool,
    /// Global identity-light scalar.
    pub identity_light: f32,
    /// Global overbright compensation factor.
    pub overbright: f32,
    /// Whether soft sprites are enabled (writes a depth-fade scalar).
    pub soft_sprites: bool,
}

impl<'a> DrawContext<'a> {
    /// Create a context for the given evaluation time with neutral
    /// global scalars.
    pub fn new(time: f32) -> Self {
        Self {
            time,
            entity: None,
            mirror: false,
            identity_light: 1.0,
            overbright: 1.0,
            soft_sprites: false,
        }
    }

    /// Attach entity state.
    #[must_use]
    pub fn with_entity(mut self, entity: &'a EntityState) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Mark the view as a mirror camera.
    #[must_use]
    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// Set the global identity-light scalar.
    #[must_use]
    pub fn with_identity_light(mut self, identity_light: f32) -> Self {
        self.identity_light = identity_light;
        self
    }

    /// Set the global overbright factor.
    #[must_use]
    pub fn with_overbright(mut self, overbright: f32) -> Self {
        self.overbright = overbright;
        self
    }

    /// Enable soft-sprite depth fading.
    #[must_use]
    pub fn with_soft_sprites(mut self, soft_sprites: bool) -> Self {
        self.soft_sprites = soft_sprites;
        self
    }
}

/// One texture bundle of a stage: modifier chain, coordinate generator,
/// and animation frames.
#[derive(Debug, Clone)]
pub struct TextureBundle {
    /// Ordered texture-coordinate modifiers.
    pub tex_mods: Vec<TexMod>,
    /// Coordinate generator mode.
    pub tc_gen: TexCoordGen,
    /// Generator vectors for [`TexCoordGen::Vector`].
    pub tc_gen_vectors: [Vec3; 2],
    /// Animation frames; a single entry means a static texture.
    pub frames: Vec<TextureHandle>,
    /// Animation frames per second.
    pub animation_speed: f32,
    /// Whether this bundle streams from a video map. Frame upload is
    /// owned by the external cinematic service; when set, the caller
    /// runs the cinematic before binding the selected texture.
    pub is_video_map: bool,
    /// Cinematic handle when `is_video_map` is set.
    pub video_map_handle: u32,
}

impl TextureBundle {
    /// Create an empty bundle (no modifiers, no frames).
    pub fn new() -> Self {
        Self {
            tex_mods: Vec::new(),
            tc_gen: TexCoordGen::default(),
            tc_gen_vectors: [Vec3::zeros(), Vec3::zeros()],
            frames: Vec::new(),
            animation_speed: 0.0,
            is_video_map: false,
            video_map_handle: 0,
        }
    }

    /// Create a bundle with a single static texture.
    pub fn with_texture(texture: TextureHandle) -> Self {
        Self {
            frames: vec![texture],
            ..Self::new()
        }
    }

    /// Select the active animation frame for the given time.
    ///
    /// The index is computed by scaling time into the waveform table
    /// domain and dividing back out, so frame flips stay phase-aligned
    /// with waveform effects driven by the same clock. Negative times
    /// (from material or entity time offsets) clamp to frame 0.
    pub fn select_frame(&self, time: f32) -> usize {
        if self.frames.len() <= 1 {
            return 0;
        }
        let scaled = (time * self.animation_speed * FUNC_TABLE_SIZE as f32) as i64;
        let index = (scaled >> FUNC_TABLE_SIZE_LOG2).max(0) as usize;
        index % self.frames.len()
    }

    /// Resolve the texture to bind for the given time.
    ///
    /// Returns `None` when the bundle has no textures.
    pub fn select_texture(&self, time: f32) -> Option<TextureHandle> {
        self.frames.get(self.select_frame(time)).copied()
    }
}

impl Default for TextureBundle {
    fn default() -> Self {
        Self::new()
    }
}

/// One rendering pass of a material.
#[derive(Debug, Clone)]
pub struct Stage {
    /// Whether this stage is rendered at all.
    pub active: bool,
    /// Source blend factor.
    pub blend_src: BlendFactor,
    /// Destination blend factor.
    pub blend_dst: BlendFactor,
    /// Depth test mode.
    pub depth_test: DepthTest,
    /// Whether this stage writes depth.
    pub depth_write: bool,
    /// RGB generator mode.
    pub rgb_gen: ColorGen,
    /// Waveform for [`ColorGen::Waveform`].
    pub rgb_wave: WaveForm,
    /// Alpha generator mode.
    pub alpha_gen: AlphaGen,
    /// Waveform for [`AlphaGen::Waveform`].
    pub alpha_wave: WaveForm,
    /// Constant color for [`ColorGen::Const`] / [`AlphaGen::Const`],
    /// 8-bit RGBA.
    pub constant_color: [u8; 4],
    /// Lighting mode tag.
    pub light: LightMode,
    /// Alpha-test mode tag.
    pub alpha_test: AlphaTest,
    /// Fog color adjustment mode.
    pub adjust_colors_for_fog: FogAdjust,
    /// Texture bundles; index 0 is the diffuse map, index 1 the lightmap.
    pub bundles: Vec<TextureBundle>,
    /// Normal-map scale forwarded to the shader.
    pub normal_scale: Vec4,
    /// Specular scale forwarded to the shader.
    pub specular_scale: Vec4,
}

impl Stage {
    /// Create an inactive stage with opaque defaults.
    pub fn new() -> Self {
        Self {
            active: false,
            blend_src: BlendFactor::One,
            blend_dst: BlendFactor::Zero,
            depth_test: DepthTest::Lequal,
            depth_write: true,
            rgb_gen: ColorGen::default(),
            rgb_wave: WaveForm::default(),
            alpha_gen: AlphaGen::default(),
            alpha_wave: WaveForm::default(),
            constant_color: [255; 4],
            light: LightMode::default(),
            alpha_test: AlphaTest::default(),
            adjust_colors_for_fog: FogAdjust::default(),
            bundles: Vec::new(),
            normal_scale: Vec4::zeros(),
            specular_scale: Vec4::zeros(),
        }
    }

    /// The diffuse texture bundle, if present.
    pub fn diffuse_bundle(&self) -> Option<&TextureBundle> {
        self.bundles.first()
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable shader-level material definition.
///
/// Created at load time by the material compiler and never mutated
/// afterwards; per-draw-call inputs travel in a [`DrawContext`].
#[derive(Debug, Clone)]
pub struct Material {
    /// Material name, used in diagnostics.
    pub name: String,
    /// Face culling mode.
    pub cull: CullMode,
    /// Material-level time offset in seconds.
    pub time_offset: f32,
    /// Range forwarded to portal shaders.
    pub portal_range: f32,
    /// Ordered rendering stages.
    pub stages: Vec<Stage>,
    /// Vertex deforms applied to this material's geometry.
    pub deforms: Vec<Deform>,
}

impl Material {
    /// Create an empty material with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cull: CullMode::default(),
            time_offset: 0.0,
            portal_range: 0.0,
            stages: Vec::new(),
            deforms: Vec::new(),
        }
    }

    /// Resolve the evaluation time for a draw call from the scene time,
    /// this material's time offset, and the entity's time offset.
    pub fn resolve_time(&self, scene_time: f32, entity: Option<&EntityState>) -> f32 {
        scene_time - self.time_offset - entity.map_or(0.0, |e| e.shader_time)
    }

    /// Whether any deform must be evaluated on the CPU.
    pub fn has_cpu_deforms(&self) -> bool {
        self.deforms.iter().any(Deform::is_cpu)
    }

    /// Whether any deform is evaluated in the vertex shader.
    pub fn has_gpu_deforms(&self) -> bool {
        self.deforms.iter().any(Deform::is_gpu)
    }
}

// Materials are shared across draw-call workers.
static_assertions::assert_impl_all!(Material: Send, Sync);
