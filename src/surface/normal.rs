//! Surface normals by central differences of the displacement field.

use glam::{DVec2, DVec3};

use super::displacement::WaveField;

/// Unit normal of the displaced surface at rest position `position`
///
/// Samples the full field (noise and pointer ripple) at `x±ε` and `y±ε`,
/// builds the two tangents and returns their normalized cross product. The
/// z component is always `4ε²` before normalization, so the result is never
/// degenerate and always faces +z.
pub fn estimate_normal(field: &WaveField, position: DVec2, time: f64, pointer: DVec2) -> DVec3 {
    let eps = field.normal_epsilon();
    let dx = DVec2::new(eps, 0.0);
    let dy = DVec2::new(0.0, eps);

    let h_px = field.displacement(position + dx, time, pointer);
    let h_nx = field.displacement(position - dx, time, pointer);
    let h_py = field.displacement(position + dy, time, pointer);
    let h_ny = field.displacement(position - dy, time, pointer);

    let tangent_x = DVec3::new(2.0 * eps, 0.0, h_px - h_nx);
    let tangent_y = DVec3::new(0.0, 2.0 * eps, h_py - h_ny);

    tangent_x.cross(tangent_y).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::WaveParams;
    use glam::Vec2;

    #[test]
    fn test_normals_unit_length() {
        let field = WaveField::new(WaveParams::default(), Vec2::new(40.0, 40.0));
        let pointer = DVec2::new(0.45, 0.55);

        for i in 0..400 {
            let p = DVec2::new((i % 20) as f64 * 2.0 - 20.0, (i / 20) as f64 * 2.0 - 20.0);
            let n = estimate_normal(&field, p, i as f64 * 0.01, pointer);
            assert!((n.length() - 1.0).abs() < 1e-9, "normal {:?} not unit", n);
            assert!(n.z > 0.0);
        }
    }

    #[test]
    fn test_flat_field_normal_points_up() {
        let mut params = WaveParams::default();
        for octave in &mut params.octaves {
            octave.amplitude = 0.0;
        }
        params.ripple.amplitude = 0.0;
        let field = WaveField::new(params, Vec2::new(40.0, 40.0));

        let n = estimate_normal(&field, DVec2::new(1.0, 2.0), 3.0, DVec2::splat(0.5));
        assert!(n.distance(DVec3::Z) < 1e-12, "normal {:?}", n);
    }

    #[test]
    fn test_steep_field_normal_still_unit() {
        let mut params = WaveParams::default();
        for octave in &mut params.octaves {
            octave.amplitude *= 1.0e4;
        }
        let field = WaveField::new(params, Vec2::new(40.0, 40.0));

        let n = estimate_normal(&field, DVec2::new(-3.3, 7.1), 0.5, DVec2::splat(0.5));
        assert!((n.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normal_includes_pointer_ripple() {
        let field = WaveField::new(WaveParams::default(), Vec2::new(40.0, 40.0));
        // A point 0.1 UV (4 world units) right of the pointer
        let p = DVec2::new(4.0, 0.0);
        let t = 0.7;

        let near = estimate_normal(&field, p, t, DVec2::splat(0.5));
        let far = estimate_normal(&field, p, t, DVec2::splat(50.0));
        assert!(near.distance(far) > 1e-6);
    }
}
