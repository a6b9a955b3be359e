//! Surface mesh and wave displacement parameters.

use crate::error::{Result, WaveError};

/// Surface mesh dimensions and resolution
#[derive(Debug, Clone)]
pub struct MeshParams {
    /// Plane extent along X (world units)
    pub width: f32,

    /// Plane extent along Y (world units)
    pub height: f32,

    /// Cells along X (128 = 129 vertices per row)
    pub width_segments: usize,

    /// Cells along Y
    pub height_segments: usize,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            width: 40.0,
            height: 40.0,
            width_segments: 128,
            height_segments: 128,
        }
    }
}

impl MeshParams {
    /// Square mesh with the default extent and `segments` cells per side
    pub fn with_segments(segments: usize) -> Self {
        Self {
            width_segments: segments,
            height_segments: segments,
            ..Self::default()
        }
    }

    /// Reject resolutions whose vertex or index count overflows `u32` indexing
    ///
    /// Zero segments are clamped to one by the mesh generator, so they pass.
    pub fn validate(&self) -> Result<()> {
        let nx = self.width_segments.max(1) as u64;
        let ny = self.height_segments.max(1) as u64;

        let vertex_count = (nx + 1).checked_mul(ny + 1);
        let index_count = nx.checked_mul(ny).and_then(|cells| cells.checked_mul(6));

        match (vertex_count, index_count) {
            (Some(v), Some(i)) if v <= u32::MAX as u64 && i <= u32::MAX as u64 => Ok(()),
            _ => Err(WaveError::InvalidParameter(format!(
                "mesh resolution {}x{} exceeds 32-bit index range",
                self.width_segments, self.height_segments
            ))),
        }
    }
}

/// One layer of the fractal noise sum
#[derive(Debug, Clone, Copy)]
pub struct NoiseOctave {
    /// Spatial frequency (noise cycles per world unit)
    pub frequency: f64,

    /// Temporal rate (noise units per unit of simulation time)
    pub rate: f64,

    /// Height contribution (world units)
    pub amplitude: f64,

    /// Domain offset applied after frequency scaling, decorrelates octaves
    pub offset: [f64; 2],
}

/// Radial ripple centered on the pointer
#[derive(Debug, Clone, Copy)]
pub struct PointerRipple {
    /// Falloff radius in UV space; ripple is exactly zero at and beyond it
    pub radius: f64,

    /// Peak ripple height at the pointer (world units)
    pub amplitude: f64,

    /// Phase change per unit of UV distance
    pub frequency: f64,

    /// Phase change per unit of simulation time
    pub rate: f64,
}

/// Wave displacement field parameters
#[derive(Debug, Clone)]
pub struct WaveParams {
    /// Octaves summed into the base surface, low frequency first
    pub octaves: [NoiseOctave; 3],

    /// Pointer-reactive ripple term
    pub ripple: PointerRipple,

    /// Finite-difference step for normal reconstruction (world units)
    pub normal_epsilon: f64,

    /// OpenSimplex noise seed
    pub noise_seed: u32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            octaves: [
                NoiseOctave {
                    frequency: 0.3,
                    rate: 0.3,
                    amplitude: 0.5,
                    offset: [0.0, 0.0],
                },
                NoiseOctave {
                    frequency: 0.6,
                    rate: 0.4,
                    amplitude: 0.25,
                    offset: [100.0, 0.0],
                },
                NoiseOctave {
                    frequency: 1.2,
                    rate: 0.5,
                    amplitude: 0.125,
                    offset: [0.0, 100.0],
                },
            ],
            ripple: PointerRipple {
                radius: 0.5,
                amplitude: 0.3,
                frequency: 20.0,
                rate: 3.0,
            },
            normal_epsilon: 0.01,
            noise_seed: 42,
        }
    }
}
