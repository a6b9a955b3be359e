//! Wave displacement field: fractal OpenSimplex noise plus a pointer ripple.

use glam::{DVec2, Vec2};
use noise::{NoiseFn, OpenSimplex};

use crate::params::WaveParams;

/// Hermite interpolation with GLSL semantics (edges may be given in either order)
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Deterministic height field over the surface plane
///
/// Holds no per-frame state: every call with the same arguments returns the
/// same height, which finite-difference normals rely on.
pub struct WaveField {
    simplex: OpenSimplex,
    params: WaveParams,
    plane_size: DVec2,
}

impl WaveField {
    /// Create a field over a plane of `plane_size` world units centered on the origin
    pub fn new(params: WaveParams, plane_size: Vec2) -> Self {
        Self {
            simplex: OpenSimplex::new(params.noise_seed),
            params,
            plane_size: plane_size.as_dvec2(),
        }
    }

    pub fn params(&self) -> &WaveParams {
        &self.params
    }

    /// Finite-difference step used for normals
    pub fn normal_epsilon(&self) -> f64 {
        self.params.normal_epsilon
    }

    /// UV coordinate of a plane position (0 at the min corner, 1 at the max corner)
    pub fn uv_at(&self, position: DVec2) -> DVec2 {
        position / self.plane_size + DVec2::splat(0.5)
    }

    /// Full height at `position`: noise octaves plus the pointer ripple
    ///
    /// # Arguments
    /// * `position` - Rest position on the plane (world units)
    /// * `time` - Simulation time
    /// * `pointer` - Smoothed pointer in UV space
    pub fn displacement(&self, position: DVec2, time: f64, pointer: DVec2) -> f64 {
        self.base_height(position, time) + self.pointer_ripple(self.uv_at(position), time, pointer)
    }

    /// Sum of the noise octaves, without pointer influence
    pub fn base_height(&self, position: DVec2, time: f64) -> f64 {
        self.params
            .octaves
            .iter()
            .map(|octave| {
                let sample = self.simplex.get([
                    position.x * octave.frequency + octave.offset[0],
                    position.y * octave.frequency + octave.offset[1],
                    time * octave.rate,
                ]);
                sample * octave.amplitude
            })
            .sum()
    }

    /// Ripple height at `uv` for a pointer at `pointer` (both UV space)
    pub fn pointer_ripple(&self, uv: DVec2, time: f64, pointer: DVec2) -> f64 {
        let ripple = &self.params.ripple;
        let distance = uv.distance(pointer);
        let envelope = self.ripple_envelope(distance);
        if envelope == 0.0 {
            return 0.0;
        }

        (distance * ripple.frequency - time * ripple.rate).sin() * envelope
    }

    /// Ripple amplitude as a function of UV distance from the pointer
    ///
    /// Peaks at the pointer and reaches zero, with zero slope, at the radius.
    pub fn ripple_envelope(&self, distance: f64) -> f64 {
        let ripple = &self.params.ripple;
        if ripple.radius <= 0.0 {
            return 0.0;
        }
        smoothstep(ripple.radius, 0.0, distance) * ripple.amplitude
    }
}
