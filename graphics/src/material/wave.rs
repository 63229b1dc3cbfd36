//! Waveform table bank and evaluator.
//!
//! Periodic waveforms are evaluated through fixed-size lookup tables
//! built once at first use. Table indices are derived from
//! `(phase + time * frequency)` scaled into the table domain, so every
//! effect driven by the same clock stays phase-aligned.

use std::sync::LazyLock;

use crate::error::MaterialError;

use super::noise;

/// Number of entries in each waveform table.
pub const FUNC_TABLE_SIZE: usize = 1024;

/// Bitmask for wrapping table indices.
pub(crate) const FUNC_TABLE_MASK: i64 = FUNC_TABLE_SIZE as i64 - 1;

/// log2 of [`FUNC_TABLE_SIZE`], used to divide scaled times back out.
pub(crate) const FUNC_TABLE_SIZE_LOG2: u32 = FUNC_TABLE_SIZE.trailing_zeros();

/// Waveform shape selector.
///
/// Discriminants are stable tags consumed by the GPU deform packer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum WaveFunc {
    /// No function; evaluating this through a table is a configuration
    /// error.
    #[default]
    None = 0,
    /// Sine wave.
    Sin = 1,
    /// Triangle wave.
    Triangle = 2,
    /// Square wave.
    Square = 3,
    /// Sawtooth ramp.
    Sawtooth = 4,
    /// Inverted sawtooth ramp.
    InverseSawtooth = 5,
    /// 4-D coherent noise; valid only on the color glow path.
    Noise = 6,
}

/// A 4-parameter periodic signal generator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WaveForm {
    /// Waveform shape.
    pub func: WaveFunc,
    /// Constant offset added to the table value.
    pub base: f32,
    /// Table value multiplier.
    pub amplitude: f32,
    /// Phase offset in cycles.
    pub phase: f32,
    /// Frequency in cycles per second.
    pub frequency: f32,
}

impl WaveForm {
    /// Create a waveform from its five parameters.
    pub fn new(func: WaveFunc, base: f32, amplitude: f32, phase: f32, frequency: f32) -> Self {
        Self {
            func,
            base,
            amplitude,
            phase,
            frequency,
        }
    }

    /// Evaluate the waveform at the given time.
    ///
    /// Fails with [`MaterialError::InvalidWaveFunction`] when the
    /// function has no lookup table ([`WaveFunc::None`] and
    /// [`WaveFunc::Noise`]); the error names `material`.
    pub fn evaluate(&self, material: &str, time: f32) -> Result<f32, MaterialError> {
        let table = FuncTables::get().table_for(self.func, material)?;
        Ok(wave_value(
            table,
            self.base,
            self.amplitude,
            self.phase,
            self.frequency,
            time,
        ))
    }

    /// Evaluate the waveform and clamp the result to `[0, 1]`.
    pub fn evaluate_clamped(&self, material: &str, time: f32) -> Result<f32, MaterialError> {
        Ok(self.evaluate(material, time)?.clamp(0.0, 1.0))
    }

    /// Sample the noise glow signal at the given time.
    ///
    /// Used by [`WaveFunc::Noise`] color generation only: samples the
    /// 4-D noise field at a fixed spatial point with
    /// `(time + phase) * frequency` as the 4th coordinate.
    pub(crate) fn noise_glow(&self, time: f32) -> f32 {
        self.base + noise::noise_4d(0.0, 0.0, 0.0, (time + self.phase) * self.frequency) * self.amplitude
    }
}

/// Look up a table value for `(phase + time * frequency)`.
pub(crate) fn wave_value(
    table: &[f32; FUNC_TABLE_SIZE],
    base: f32,
    amplitude: f32,
    phase: f32,
    frequency: f32,
    time: f32,
) -> f32 {
    let index = ((phase + time * frequency) * FUNC_TABLE_SIZE as f32) as i64 & FUNC_TABLE_MASK;
    base + table[index as usize] * amplitude
}

/// Precomputed periodic tables for the five waveform shapes.
pub(crate) struct FuncTables {
    pub sin: [f32; FUNC_TABLE_SIZE],
    pub triangle: [f32; FUNC_TABLE_SIZE],
    pub square: [f32; FUNC_TABLE_SIZE],
    pub sawtooth: [f32; FUNC_TABLE_SIZE],
    pub inverse_sawtooth: [f32; FUNC_TABLE_SIZE],
}

static FUNC_TABLES: LazyLock<FuncTables> = LazyLock::new(FuncTables::build);

impl FuncTables {
    /// The shared table bank.
    pub fn get() -> &'static Self {
        &FUNC_TABLES
    }

    fn build() -> Self {
        let mut tables = Self {
            sin: [0.0; FUNC_TABLE_SIZE],
            triangle: [0.0; FUNC_TABLE_SIZE],
            square: [0.0; FUNC_TABLE_SIZE],
            sawtooth: [0.0; FUNC_TABLE_SIZE],
            inverse_sawtooth: [0.0; FUNC_TABLE_SIZE],
        };

        let quarter = FUNC_TABLE_SIZE / 4;
        let half = FUNC_TABLE_SIZE / 2;

        for i in 0..FUNC_TABLE_SIZE {
            let cycles = i as f32 / (FUNC_TABLE_SIZE - 1) as f32;
            tables.sin[i] = (cycles * std::f32::consts::TAU).sin();
            tables.square[i] = if i < half { 1.0 } else { -1.0 };
            tables.sawtooth[i] = i as f32 / FUNC_TABLE_SIZE as f32;
            tables.inverse_sawtooth[i] = 1.0 - tables.sawtooth[i];

            tables.triangle[i] = if i < half {
                if i < quarter {
                    i as f32 / quarter as f32
                } else {
                    1.0 - tables.triangle[i - quarter]
                }
            } else {
                -tables.triangle[i - half]
            };
        }

        tables
    }

    /// Table for the given function, or a configuration error naming
    /// the material.
    pub fn table_for(
        &self,
        func: WaveFunc,
        material: &str,
    ) -> Result<&[f32; FUNC_TABLE_SIZE], MaterialError> {
        match func {
            WaveFunc::Sin => Ok(&self.sin),
            WaveFunc::Triangle => Ok(&self.triangle),
            WaveFunc::Square => Ok(&self.square),
            WaveFunc::Sawtooth => Ok(&self.sawtooth),
            WaveFunc::InverseSawtooth => Ok(&self.inverse_sawtooth),
            WaveFunc::None | WaveFunc::Noise => Err(MaterialError::InvalidWaveFunction {
                material: material.to_string(),
                func,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATERIAL: &str = "textures/test/wave";

    #[test]
    fn none_func_is_an_error() {
        let wf = WaveForm::new(WaveFunc::None, 0.0, 1.0, 0.0, 1.0);
        let err = wf.evaluate(MATERIAL, 0.0).unwrap_err();
        assert_eq!(
            err,
            MaterialError::InvalidWaveFunction {
                material: MATERIAL.to_string(),
                func: WaveFunc::None,
            }
        );
    }

    #[test]
    fn noise_func_has_no_table() {
        let wf = WaveForm::new(WaveFunc::Noise, 0.0, 1.0, 0.0, 1.0);
        assert!(wf.evaluate(MATERIAL, 0.0).is_err());
    }

    #[test]
    fn bounded_by_base_and_amplitude() {
        for func in [
            WaveFunc::Sin,
            WaveFunc::Triangle,
            WaveFunc::Square,
            WaveFunc::Sawtooth,
            WaveFunc::InverseSawtooth,
        ] {
            let wf = WaveForm::new(func, 0.5, 0.25, 0.1, 2.0);
            for step in 0..200 {
                let t = step as f32 * 0.013;
                let v = wf.evaluate(MATERIAL, t).unwrap();
                assert!(
                    (0.25..=0.75).contains(&v),
                    "{func:?} out of bounds at t={t}: {v}"
                );
            }
        }
    }

    #[test]
    fn periodic_with_inverse_frequency() {
        let wf = WaveForm::new(WaveFunc::Sawtooth, 0.0, 1.0, 0.0, 4.0);
        for step in 0..50 {
            let t = step as f32 * 0.017;
            let a = wf.evaluate(MATERIAL, t).unwrap();
            let b = wf.evaluate(MATERIAL, t + 0.25).unwrap();
            assert!((a - b).abs() < 2.0 / FUNC_TABLE_SIZE as f32, "t={t}: {a} vs {b}");
        }
    }

    #[test]
    fn clamped_stays_in_unit_interval() {
        let wf = WaveForm::new(WaveFunc::Sin, 0.5, 2.0, 0.0, 1.0);
        for step in 0..100 {
            let t = step as f32 * 0.01;
            let v = wf.evaluate_clamped(MATERIAL, t).unwrap();
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn square_flips_sign() {
        let wf = WaveForm::new(WaveFunc::Square, 0.0, 1.0, 0.0, 1.0);
        assert_eq!(wf.evaluate(MATERIAL, 0.1).unwrap(), 1.0);
        assert_eq!(wf.evaluate(MATERIAL, 0.6).unwrap(), -1.0);
    }

    #[test]
    fn negative_phase_wraps() {
        let wf = WaveForm::new(WaveFunc::Sawtooth, 0.0, 1.0, -0.25, 0.0);
        // floor-free truncation wraps through the mask: -256 & 1023 == 768.
        assert!((wf.evaluate(MATERIAL, 0.0).unwrap() - 0.75).abs() < 1e-6);
    }
}
