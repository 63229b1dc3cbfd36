//! 4-D coherent value noise.
//!
//! Backs the noise color-glow path: a permutation-hashed lattice of
//! random values in `[-1, 1]`, linearly interpolated along all four
//! axes. The lattice is built deterministically from a fixed seed so
//! glow effects replay identically across runs.

use std::sync::LazyLock;

use vermilion_core::math::lerp;

const NOISE_SIZE: usize = 256;
const NOISE_MASK: i64 = NOISE_SIZE as i64 - 1;

struct NoiseTables {
    values: [f32; NOISE_SIZE],
    perm: [u8; NOISE_SIZE],
}

static NOISE_TABLES: LazyLock<NoiseTables> = LazyLock::new(NoiseTables::build);

impl NoiseTables {
    fn build() -> Self {
        let mut rng = Lcg::new(0x2b_14_97_53);
        let mut values = [0.0; NOISE_SIZE];
        let mut perm = [0; NOISE_SIZE];
        for i in 0..NOISE_SIZE {
            values[i] = 2.0 * rng.next_unit() - 1.0;
            perm[i] = (rng.next_unit() * 255.0) as u8;
        }
        Self { values, perm }
    }

    fn hash(&self, a: i64) -> i64 {
        self.perm[(a & NOISE_MASK) as usize] as i64
    }

    fn lattice(&self, x: i64, y: i64, z: i64, t: i64) -> f32 {
        let index = self.hash(x + self.hash(y + self.hash(z + self.hash(t))));
        self.values[(index & NOISE_MASK) as usize]
    }
}

/// Linear congruential generator seeding the lattice tables.
struct Lcg {
    state: u32,
}

impl Lcg {
    fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next_unit(&mut self) -> f32 {
        self.state = self.state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        (self.state >> 16) as f32 / 65_535.0
    }
}

/// Sample the noise field at `(x, y, z, t)`.
///
/// Returns a value in `[-1, 1]`, continuous in all four coordinates.
pub fn noise_4d(x: f32, y: f32, z: f32, t: f32) -> f32 {
    let tables = &*NOISE_TABLES;

    let ix = x.floor() as i64;
    let iy = y.floor() as i64;
    let iz = z.floor() as i64;
    let it = t.floor() as i64;
    let fx = x - ix as f32;
    let fy = y - iy as f32;
    let fz = z - iz as f32;
    let ft = t - it as f32;

    let mut value = [0.0f32; 2];
    for (i, v) in value.iter_mut().enumerate() {
        let ti = it + i as i64;

        let front = [
            tables.lattice(ix, iy, iz, ti),
            tables.lattice(ix + 1, iy, iz, ti),
            tables.lattice(ix, iy + 1, iz, ti),
            tables.lattice(ix + 1, iy + 1, iz, ti),
        ];
        let back = [
            tables.lattice(ix, iy, iz + 1, ti),
            tables.lattice(ix + 1, iy, iz + 1, ti),
            tables.lattice(ix, iy + 1, iz + 1, ti),
            tables.lattice(ix + 1, iy + 1, iz + 1, ti),
        ];

        let fvalue = lerp(lerp(front[0], front[1], fx), lerp(front[2], front[3], fx), fy);
        let bvalue = lerp(lerp(back[0], back[1], fx), lerp(back[2], back[3], fx), fy);
        *v = lerp(fvalue, bvalue, fz);
    }

    lerp(value[0], value[1], ft)
}
