//! # Vermilion Core
//!
//! Core crate for Vermilion renderer basic utilities.

pub mod math;
pub mod mesh;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Placeholder for future game loop implementation
pub fn init() {
    log::info!("Vermilion Core v{} initialized", VERSION);
}
