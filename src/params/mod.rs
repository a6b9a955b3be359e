//! Parameter definitions with units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - World units, UV units or per-tick units spelled out
//! - Documented ranges and meanings
//! - Validation where a bad value would break the simulation

mod render;
mod shading;
mod simulation;
mod surface;

// Re-export all types
pub use render::{CameraParams, RecordingConfig, RenderConfig};
pub use shading::{Palette, ShadingParams};
pub use simulation::LoopParams;
pub use surface::{MeshParams, NoiseOctave, PointerRipple, WaveParams};
