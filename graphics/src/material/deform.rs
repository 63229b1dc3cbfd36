//! Vertex deforms.
//!
//! Deforms come in two families. Wave, bulge, and move are evaluated in
//! the vertex shader and only need their parameters packed into a
//! uniform block ([`Material::deform_uniforms`]). Autosprite and
//! autosprite2 rebuild geometry on the host against the current camera,
//! so they run here, rewriting a caller-owned transient vertex/index
//! buffer before submission ([`Material::apply_cpu_deforms`]).
//!
//! Both sprite deforms expect the geometry to be triangulated quads:
//! groups of 6 indices addressing 4 distinct vertices.

use bytemuck::{Pod, Zeroable};

use vermilion_core::math::Vec3;
use vermilion_core::mesh::Vertex;

use super::{DrawContext, Material, ViewAxes, WaveForm};

/// Maximum number of GPU deform slots in the uniform block.
pub const MAX_DEFORMS: usize = 3;

/// A vertex deform attached to a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Deform {
    /// Waveform displacement along the vertex normal, with a spatial
    /// spread de-phasing vertices by position.
    Wave {
        /// Displacement waveform.
        wave: WaveForm,
        /// Spatial phase spread.
        spread: f32,
    },
    /// Sinusoidal normal perturbation. Accepted but not evaluated by
    /// this renderer.
    Normals {
        /// Perturbation amplitude.
        amplitude: f32,
        /// Perturbation frequency.
        frequency: f32,
    },
    /// Sinusoidal bulge travelling along the texture s-axis.
    Bulge {
        /// Bulge width in texture space.
        width: f32,
        /// Bulge height along the normal.
        height: f32,
        /// Travel speed.
        speed: f32,
    },
    /// Waveform-driven translation along a fixed direction.
    Move {
        /// Translation direction.
        dir: Vec3,
        /// Translation waveform.
        wave: WaveForm,
    },
    /// Text replacement slot 0-7. Accepted but not evaluated by this
    /// renderer.
    Text(u8),
    /// Rebuild each quad as a camera-facing billboard.
    Autosprite,
    /// Pivot each elongated quad about its long axis to face the
    /// camera.
    Autosprite2,
}

impl Deform {
    /// Whether this deform rewrites geometry on the host.
    pub fn is_cpu(&self) -> bool {
        matches!(self, Self::Autosprite | Self::Autosprite2)
    }

    /// Whether this deform is evaluated in the vertex shader.
    pub fn is_gpu(&self) -> bool {
        matches!(self, Self::Wave { .. } | Self::Bulge { .. } | Self::Move { .. })
    }

    /// Stable tag identifying the deform kind to the shader.
    pub fn kind_tag(&self) -> u8 {
        match self {
            Self::Wave { .. } => 1,
            Self::Normals { .. } => 2,
            Self::Bulge { .. } => 3,
            Self::Move { .. } => 4,
            Self::Autosprite => 5,
            Self::Autosprite2 => 6,
            Self::Text(slot) => 7 + slot,
        }
    }
}

/// Packed uniform block for GPU-evaluated deforms.
///
/// `count[0]` holds the number of filled slots; a material without GPU
/// deforms still uploads a zeroed count so the shader short-circuits
/// deterministically.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DeformUniforms {
    /// `[slot count, 0, 0, 0]`.
    pub count: [f32; 4],
    /// Per-slot move direction (Move deforms only).
    pub move_dirs: [[f32; 4]; MAX_DEFORMS],
    /// Per-slot `[kind tag, waveform func tag, base, amplitude]`.
    pub gen_wave_base_amplitude: [[f32; 4]; MAX_DEFORMS],
    /// Per-slot `[frequency, phase, spread/width, 0]`.
    pub frequency_phase_spread: [[f32; 4]; MAX_DEFORMS],
}

static_assertions::const_assert_eq!(std::mem::size_of::<DeformUniforms>(), 160);

/// A frame-scoped, CPU-writable draw call the deform engine may
/// rewrite in place.
#[derive(Debug)]
pub struct TransientDrawCall<'a> {
    /// Vertex records for this draw call.
    pub vertices: &'a mut [Vertex],
    /// Triangle indices into `vertices`.
    pub indices: &'a mut [u16],
    /// Depth-fade scalar written by sprite deforms in soft-sprite mode.
    pub soft_sprite_depth: Option<f32>,
}

impl<'a> TransientDrawCall<'a> {
    /// Wrap a transient vertex/index range.
    pub fn new(vertices: &'a mut [Vertex], indices: &'a mut [u16]) -> Self {
        Self {
            vertices,
            indices,
            soft_sprite_depth: None,
        }
    }
}

/// Corner pairs forming the 6 possible edges of a quad.
const EDGE_VERTS: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];

impl Material {
    /// Apply this material's host-evaluated deforms to a transient
    /// draw call.
    ///
    /// GPU-evaluated deforms are ignored here; see
    /// [`Material::deform_uniforms`]. Quads whose indices are
    /// malformed (not 4 distinct in-range vertices) are skipped with a
    /// warning, leaving their geometry untouched.
    pub fn apply_cpu_deforms(
        &self,
        ctx: &DrawContext,
        view: &ViewAxes,
        dc: &mut TransientDrawCall,
    ) {
        if !self.has_cpu_deforms() {
            return;
        }

        if dc.indices.len() % 6 != 0 {
            log::warn!(
                "autosprite material '{}' has odd index count {}",
                self.name,
                dc.indices.len()
            );
        }

        // View directions in the frame the vertices live in.
        let axes = match ctx.entity {
            Some(entity) => view.in_entity_space(entity),
            None => *view,
        };

        for deform in &self.deforms {
            if !deform.is_cpu() {
                continue;
            }

            for quad in 0..dc.indices.len() / 6 {
                let first = quad * 6;

                let Some(corners) =
                    quad_corner_indices(&dc.indices[first..first + 6], dc.vertices.len())
                else {
                    log::warn!(
                        "autosprite material '{}' has a malformed quad at index {first}",
                        self.name
                    );
                    continue;
                };

                let midpoint = corners
                    .iter()
                    .fold(Vec3::zeros(), |acc, &c| acc + dc.vertices[c].pos())
                    * 0.25;
                let radius =
                    (dc.vertices[corners[0]].pos() - midpoint).norm() * std::f32::consts::FRAC_1_SQRT_2;

                if ctx.soft_sprites {
                    // Assumes all quads in this draw call share a radius.
                    dc.soft_sprite_depth = Some(radius / 2.0);
                }

                match deform {
                    Deform::Autosprite => {
                        autosprite_quad(ctx, view, &axes, dc, first, &corners, midpoint, radius);
                    }
                    Deform::Autosprite2 => {
                        autosprite2_quad(&axes, dc, first, &corners);
                    }
                    _ => unreachable!(),
                }
            }
        }
    }
}

/// Extract a quad's 4 distinct corner indices from its 6 triangle
/// indices, ascending. Returns `None` for degenerate or out-of-range
/// quads.
fn quad_corner_indices(window: &[u16], vertex_count: usize) -> Option<[usize; 4]> {
    let mut corners = [0usize; 4];
    let mut n = 0;
    for &index in window {
        let index = index as usize;
        if index >= vertex_count {
            return None;
        }
        if !corners[..n].contains(&index) {
            if n == 4 {
                return None;
            }
            corners[n] = index;
            n += 1;
        }
    }
    if n != 4 {
        return None;
    }
    corners.sort_unstable();
    Some(corners)
}

/// Rebuild one quad as a camera-facing billboard.
#[allow(clippy::too_many_arguments)]
fn autosprite_quad(
    ctx: &DrawContext,
    view: &ViewAxes,
    axes: &ViewAxes,
    dc: &mut TransientDrawCall,
    first: usize,
    corners: &[usize; 4],
    midpoint: Vec3,
    radius: f32,
) {
    let mut left = axes.left * radius;
    let mut up = axes.up * radius;

    if ctx.mirror {
        left = -left;
    }

    // Compensate for scale carried in the entity axes.
    if let Some(entity) = ctx.entity {
        if entity.non_normalized_axes {
            let axis_length = entity.axis[0].norm();
            let inv = if axis_length == 0.0 {
                0.0
            } else {
                1.0 / axis_length
            };
            left *= inv;
            up *= inv;
        }
    }

    let positions = [
        midpoint + left + up,
        midpoint - left + up,
        midpoint - left - up,
        midpoint + left - up,
    ];
    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    for (corner, (position, uv)) in corners.iter().zip(positions.into_iter().zip(uvs)) {
        let vertex = &mut dc.vertices[*corner];
        vertex.set_pos(position);
        // Constant normal all the way around.
        vertex.set_normal(-view.forward);
        vertex.tex_coord = uv;
        vertex.tex_coord2 = uv;
    }

    let vi = corners.map(|c| c as u16);
    dc.indices[first] = vi[0];
    dc.indices[first + 1] = vi[1];
    dc.indices[first + 2] = vi[3];
    dc.indices[first + 3] = vi[3];
    dc.indices[first + 4] = vi[1];
    dc.indices[first + 5] = vi[2];
}

/// Pivot one elongated quad about its long axis to face the camera.
fn autosprite2_quad(
    axes: &ViewAxes,
    dc: &mut TransientDrawCall,
    first: usize,
    corners: &[usize; 4],
) {
    // Identify the two shortest edges.
    let mut shortest = [0usize; 2];
    let mut lengths = [f32::MAX; 2];
    for (edge, &(a, b)) in EDGE_VERTS.iter().enumerate() {
        let delta = dc.vertices[corners[a]].pos() - dc.vertices[corners[b]].pos();
        let length = delta.dot(&delta);
        if length < lengths[0] {
            shortest[1] = shortest[0];
            lengths[1] = lengths[0];
            shortest[0] = edge;
            lengths[0] = length;
        } else if length < lengths[1] {
            shortest[1] = edge;
            lengths[1] = length;
        }
    }

    let midpoints = shortest.map(|edge| {
        let (a, b) = EDGE_VERTS[edge];
        (dc.vertices[corners[a]].pos() + dc.vertices[corners[b]].pos()) * 0.5
    });

    // Major axis between the short-end midpoints; minor axis faces the
    // camera.
    let major = midpoints[1] - midpoints[0];
    let Some(minor) = major.cross(&axes.forward).try_normalize(f32::EPSILON) else {
        return;
    };

    // Re-project each short edge's vertices along the minor axis,
    // keeping the edge's direction as it appears in the index stream.
    for (slot, &edge) in shortest.iter().enumerate() {
        let (a, b) = EDGE_VERTS[edge];
        let va = corners[a];
        let vb = corners[b];
        let half = 0.5 * lengths[slot].sqrt();

        let window = &dc.indices[first..first + 6];
        let forward_order = (0..5)
            .any(|j| window[j] as usize == va && window[j + 1] as usize == vb);

        let (pa, pb) = if forward_order {
            (midpoints[slot] - minor * half, midpoints[slot] + minor * half)
        } else {
            (midpoints[slot] + minor * half, midpoints[slot] - minor * half)
        };

        dc.vertices[va].set_pos(pa);
        dc.vertices[vb].set_pos(pb);
    }
}

impl Material {
    /// Pack this material's GPU-evaluated deforms into a uniform block.
    ///
    /// Materials without GPU deforms still produce a zeroed block so
    /// the shader's deform loop short-circuits deterministically.
    pub fn deform_uniforms(&self) -> DeformUniforms {
        let mut out = DeformUniforms::zeroed();
        let mut slot = 0;

        for deform in &self.deforms {
            if !deform.is_gpu() {
                continue;
            }
            if slot == MAX_DEFORMS {
                log::warn!(
                    "material '{}' has more than {MAX_DEFORMS} gpu deforms, extras dropped",
                    self.name
                );
                break;
            }

            let tag = deform.kind_tag() as f32;
            match deform {
                Deform::Wave { wave, spread } => {
                    out.gen_wave_base_amplitude[slot] =
                        [tag, wave.func as u8 as f32, wave.base, wave.amplitude];
                    out.frequency_phase_spread[slot] = [wave.frequency, wave.phase, *spread, 0.0];
                }
                Deform::Bulge {
                    width,
                    height,
                    speed,
                } => {
                    out.gen_wave_base_amplitude[slot] = [tag, 0.0, 0.0, *height];
                    out.frequency_phase_spread[slot] = [*speed, *width, 0.0, 0.0];
                }
                Deform::Move { dir, wave } => {
                    out.gen_wave_base_amplitude[slot] =
                        [tag, wave.func as u8 as f32, wave.base, wave.amplitude];
                    out.frequency_phase_spread[slot] = [wave.frequency, wave.phase, 0.0, 0.0];
                    out.move_dirs[slot] = [dir.x, dir.y, dir.z, 0.0];
                }
                _ => unreachable!(),
            }

            slot += 1;
        }

        out.count[0] = slot as f32;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::super::WaveFunc;
    use super::*;

    fn unit_quad() -> (Vec<Vertex>, Vec<u16>) {
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let vertices = positions
            .iter()
            .map(|&p| Vertex::new(p, [0.0, 0.0, 1.0], [0.0, 0.0]))
            .collect();
        (vertices, vec![0, 1, 2, 2, 3, 0])
    }

    fn test_view() -> ViewAxes {
        ViewAxes::new(
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
    }

    fn autosprite_material() -> Material {
        let mut material = Material::new("sprites/test");
        material.deforms.push(Deform::Autosprite);
        material
    }

    #[test]
    fn autosprite_rebuilds_billboard() {
        let (mut vertices, mut indices) = unit_quad();
        let centroid = Vec3::new(0.5, 0.5, 0.0);
        let original_corner_distance = (Vec3::new(0.0, 0.0, 0.0) - centroid).norm();

        let view = test_view();
        let ctx = DrawContext::new(0.0);
        let mut dc = TransientDrawCall::new(&mut vertices, &mut indices);
        autosprite_material().apply_cpu_deforms(&ctx, &view, &mut dc);

        for vertex in dc.vertices.iter() {
            let distance = (vertex.pos() - centroid).norm();
            assert!(
                (distance - original_corner_distance).abs() < 1e-5,
                "corner at distance {distance}, expected {original_corner_distance}"
            );
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }

        // Corners face the camera in the view plane (z stays at the
        // centroid plane).
        for vertex in dc.vertices.iter() {
            assert!(vertex.pos().z.abs() < 1e-6);
        }

        assert_eq!(&dc.indices[..], &[0, 1, 3, 3, 1, 2]);

        // Unit-square UVs on both sets.
        assert_eq!(dc.vertices[0].tex_coord, [0.0, 0.0]);
        assert_eq!(dc.vertices[2].tex_coord, [1.0, 1.0]);
        assert_eq!(dc.vertices[2].tex_coord2, [1.0, 1.0]);
    }

    #[test]
    fn autosprite_mirror_flips_left() {
        let (mut vertices, mut indices) = unit_quad();
        let view = test_view();

        let ctx = DrawContext::new(0.0);
        let mut dc = TransientDrawCall::new(&mut vertices, &mut indices);
        autosprite_material().apply_cpu_deforms(&ctx, &view, &mut dc);
        let plain_first = dc.vertices[0].pos();

        let (mut vertices, mut indices) = unit_quad();
        let ctx = DrawContext::new(0.0).with_mirror(true);
        let mut dc = TransientDrawCall::new(&mut vertices, &mut indices);
        autosprite_material().apply_cpu_deforms(&ctx, &view, &mut dc);
        let mirrored_first = dc.vertices[0].pos();

        let centroid = Vec3::new(0.5, 0.5, 0.0);
        let plain_offset = plain_first - centroid;
        let mirrored_offset = mirrored_first - centroid;
        // Left component flips, up component stays.
        assert!((plain_offset.x + mirrored_offset.x).abs() < 1e-6);
        assert!((plain_offset.y - mirrored_offset.y).abs() < 1e-6);
    }

    #[test]
    fn autosprite_soft_sprite_depth() {
        let (mut vertices, mut indices) = unit_quad();
        let view = test_view();
        let ctx = DrawContext::new(0.0).with_soft_sprites(true);
        let mut dc = TransientDrawCall::new(&mut vertices, &mut indices);
        autosprite_material().apply_cpu_deforms(&ctx, &view, &mut dc);

        // radius = corner distance / sqrt(2) = 0.5; depth = radius / 2.
        let depth = dc.soft_sprite_depth.expect("depth fade written");
        assert!((depth - 0.25).abs() < 1e-5);
    }

    #[test]
    fn autosprite_entity_axis_scale_compensation() {
        let (mut vertices, mut indices) = unit_quad();
        let view = test_view();
        let entity = super::super::EntityState {
            axis: [
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
                Vec3::new(0.0, 0.0, 2.0),
            ],
            non_normalized_axes: true,
            ..Default::default()
        };
        let ctx = DrawContext::new(0.0).with_entity(&entity);
        let mut dc = TransientDrawCall::new(&mut vertices, &mut indices);
        autosprite_material().apply_cpu_deforms(&ctx, &view, &mut dc);

        // Axes project to double length, then the inverse axis length
        // halves them back: corners stay at the unscaled distance.
        let centroid = Vec3::new(0.5, 0.5, 0.0);
        let expected = (Vec3::zeros() - centroid).norm();
        for vertex in dc.vertices.iter() {
            let distance = (vertex.pos() - centroid).norm();
            assert!((distance - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn autosprite_skips_degenerate_quads() {
        let (mut vertices, _) = unit_quad();
        let mut indices = vec![0, 0, 0, 0, 0, 0];
        let original = vertices.clone();
        let view = test_view();
        let ctx = DrawContext::new(0.0);
        let mut dc = TransientDrawCall::new(&mut vertices, &mut indices);
        autosprite_material().apply_cpu_deforms(&ctx, &view, &mut dc);
        assert_eq!(&dc.vertices[..], &original[..]);
    }

    #[test]
    fn autosprite2_preserves_silhouette() {
        let positions = [
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [4.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let mut vertices: Vec<Vertex> = positions
            .iter()
            .map(|&p| Vertex::new(p, [0.0, 0.0, 1.0], [0.0, 0.0]))
            .collect();
        let mut indices: Vec<u16> = vec![0, 1, 2, 2, 3, 0];

        let mut material = Material::new("sprites/beam");
        material.deforms.push(Deform::Autosprite2);

        let view = test_view();
        let ctx = DrawContext::new(0.0);
        let mut dc = TransientDrawCall::new(&mut vertices, &mut indices);
        material.apply_cpu_deforms(&ctx, &view, &mut dc);

        // Short ends are (0,3) and (1,2); their midpoints must not move.
        let left_mid = (dc.vertices[0].pos() + dc.vertices[3].pos()) * 0.5;
        let right_mid = (dc.vertices[1].pos() + dc.vertices[2].pos()) * 0.5;
        assert!((left_mid - Vec3::new(0.0, 0.5, 0.0)).norm() < 1e-5);
        assert!((right_mid - Vec3::new(4.0, 0.5, 0.0)).norm() < 1e-5);

        // Major separation and short-edge lengths are preserved.
        assert!(((right_mid - left_mid).norm() - 4.0).abs() < 1e-5);
        assert!(((dc.vertices[0].pos() - dc.vertices[3].pos()).norm() - 1.0).abs() < 1e-5);
        assert!(((dc.vertices[1].pos() - dc.vertices[2].pos()).norm() - 1.0).abs() < 1e-5);

        // Triangle winding survives the re-projection.
        let a = dc.vertices[dc.indices[0] as usize].pos();
        let b = dc.vertices[dc.indices[1] as usize].pos();
        let c = dc.vertices[dc.indices[2] as usize].pos();
        let normal = (b - a).cross(&(c - a));
        assert!(normal.z > 0.0);
    }

    #[test]
    fn deform_uniforms_zero_filled_without_gpu_deforms() {
        let material = autosprite_material();
        let uniforms = material.deform_uniforms();
        assert_eq!(uniforms, DeformUniforms::zeroed());
    }

    #[test]
    fn deform_uniforms_packs_wave() {
        let mut material = Material::new("textures/base/flag");
        let wave = WaveForm::new(WaveFunc::Sin, 0.1, 0.2, 0.3, 0.4);
        material.deforms.push(Deform::Wave { wave, spread: 0.7 });

        let uniforms = material.deform_uniforms();
        assert_eq!(uniforms.count[0], 1.0);
        assert_eq!(uniforms.gen_wave_base_amplitude[0], [1.0, 1.0, 0.1, 0.2]);
        assert_eq!(uniforms.frequency_phase_spread[0], [0.4, 0.3, 0.7, 0.0]);
    }

    #[test]
    fn deform_uniforms_packs_bulge_and_move() {
        let mut material = Material::new("textures/base/pulse");
        material.deforms.push(Deform::Bulge {
            width: 2.0,
            height: 0.5,
            speed: 3.0,
        });
        let wave = WaveForm::new(WaveFunc::Triangle, 0.0, 1.0, 0.0, 2.0);
        material.deforms.push(Deform::Move {
            dir: Vec3::new(0.0, 0.0, 8.0),
            wave,
        });

        let uniforms = material.deform_uniforms();
        assert_eq!(uniforms.count[0], 2.0);
        assert_eq!(uniforms.gen_wave_base_amplitude[0], [3.0, 0.0, 0.0, 0.5]);
        assert_eq!(uniforms.frequency_phase_spread[0], [3.0, 2.0, 0.0, 0.0]);
        assert_eq!(uniforms.gen_wave_base_amplitude[1], [4.0, 2.0, 0.0, 1.0]);
        assert_eq!(uniforms.move_dirs[1], [0.0, 0.0, 8.0, 0.0]);
    }

    #[test]
    fn deform_uniforms_drops_excess_slots() {
        let mut material = Material::new("textures/base/overfull");
        let wave = WaveForm::new(WaveFunc::Sin, 0.0, 1.0, 0.0, 1.0);
        for _ in 0..5 {
            material.deforms.push(Deform::Wave { wave, spread: 0.0 });
        }
        let uniforms = material.deform_uniforms();
        assert_eq!(uniforms.count[0], MAX_DEFORMS as f32);
    }

    #[test]
    fn cpu_deforms_ignore_gpu_only_materials() {
        let (mut vertices, mut indices) = unit_quad();
        let original = vertices.clone();
        let mut material = Material::new("textures/base/flag");
        material.deforms.push(Deform::Wave {
            wave: WaveForm::new(WaveFunc::Sin, 0.0, 1.0, 0.0, 1.0),
            spread: 0.1,
        });

        let view = test_view();
        let ctx = DrawContext::new(0.0);
        let mut dc = TransientDrawCall::new(&mut vertices, &mut indices);
        material.apply_cpu_deforms(&ctx, &view, &mut dc);
        assert_eq!(&dc.vertices[..], &original[..]);
    }
}
