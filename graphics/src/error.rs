//! Material evaluation error types.

use std::fmt;

use crate::material::WaveFunc;

/// Errors that can occur while evaluating a material.
///
/// These indicate a malformed material definition and are not
/// recoverable at the draw-call level: the caller must drop the draw
/// call rather than submit partially computed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialError {
    /// A waveform with a non-periodic function reached the table-lookup
    /// path (geometry or texture-coordinate math).
    InvalidWaveFunction {
        /// Name of the offending material.
        material: String,
        /// The function that has no lookup table.
        func: WaveFunc,
    },
}

impl fmt::Display for MaterialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWaveFunction { material, func } => {
                write!(
                    f,
                    "invalid waveform function {func:?} in material '{material}'"
                )
            }
        }
    }
}

impl std::error::Error for MaterialError {}
