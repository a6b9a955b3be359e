//! CPU reference of the surface lighting model.
//!
//! `shade` mirrors `fs_main` in `shader.wgsl` term for term. It is used to
//! test the lighting math and to render a UV-space reference map without a
//! GPU.

use glam::{DVec2, Vec2, Vec3, Vec4};
use image::{Rgba, RgbaImage};

use crate::params::ShadingParams;
use crate::surface::{estimate_normal, WaveField};

/// Interpolated inputs of one surface fragment
#[derive(Debug, Clone, Copy)]
pub struct SurfaceSample {
    pub uv: Vec2,
    pub normal: Vec3,
    /// Displaced position in surface space (before the model rotation)
    pub position: Vec3,
}

/// Light position for a pointer in UV space
pub fn light_position(pointer: Vec2, params: &ShadingParams) -> Vec3 {
    let offset = (pointer - Vec2::splat(0.5)) * params.light_span;
    Vec3::new(offset.x, offset.y, params.light_height)
}

/// Shade one fragment, returning straight (non-premultiplied) RGBA
pub fn shade(sample: &SurfaceSample, pointer: Vec2, time: f32, params: &ShadingParams) -> Vec4 {
    let palette = &params.palette;
    let n = sample.normal;
    let p = sample.position;

    let light_dir = (light_position(pointer, params) - p).normalize();
    let view_dir = (Vec3::new(0.0, 0.0, params.view_height) - p).normalize();
    let half_dir = (light_dir + view_dir).normalize();

    let n_dot_h = n.dot(half_dir).max(0.0);
    let sharp = n_dot_h.powf(params.sharp_exponent);
    let broad = n_dot_h.powf(params.broad_exponent);
    let fresnel = (1.0 - n.dot(view_dir).max(0.0)).powf(params.fresnel_power);

    let highlight = Vec3::from_array(palette.highlight);
    let secondary = Vec3::from_array(palette.secondary);

    let mut color = Vec3::from_array(palette.base);
    color += highlight * sharp * params.sharp_weight;
    color += secondary * broad * params.broad_weight;
    color += secondary * fresnel * params.fresnel_weight;

    let uv = sample.uv;
    let shimmer = (uv.x * params.shimmer_frequency + time).sin()
        * (uv.y * params.shimmer_frequency).sin()
        * params.shimmer_amplitude;
    color += Vec3::splat(shimmer);

    let vignette = 1.0 - uv.distance(Vec2::splat(0.5)) * params.vignette_strength;
    color *= vignette;

    color.extend(params.alpha)
}

/// Render the lit surface in UV space, one pixel per sample, over `background`
///
/// Row 0 of the image is the top (v = 1) edge of the surface.
pub fn render_reference(
    field: &WaveField,
    plane_size: Vec2,
    time: f64,
    pointer: Vec2,
    params: &ShadingParams,
    background: Vec3,
    size: u32,
) -> RgbaImage {
    let size = size.max(1);
    let plane_size = plane_size.as_dvec2();
    let pointer_uv = pointer.as_dvec2();

    RgbaImage::from_fn(size, size, |px, py| {
        let uv = DVec2::new(
            (px as f64 + 0.5) / size as f64,
            1.0 - (py as f64 + 0.5) / size as f64,
        );
        let rest = (uv - DVec2::splat(0.5)) * plane_size;
        let height = field.displacement(rest, time, pointer_uv);
        let normal = estimate_normal(field, rest, time, pointer_uv);

        let sample = SurfaceSample {
            uv: uv.as_vec2(),
            normal: normal.as_vec3(),
            position: Vec3::new(rest.x as f32, rest.y as f32, height as f32),
        };
        let color = shade(&sample, pointer, time as f32, params);

        let rgb = color.truncate() * color.w + background * (1.0 - color.w);
        Rgba([to_byte(rgb.x), to_byte(rgb.y), to_byte(rgb.z), 255])
    })
}

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::WaveParams;

    fn flat_sample(uv: Vec2) -> SurfaceSample {
        SurfaceSample {
            uv,
            normal: Vec3::Z,
            position: Vec3::new((uv.x - 0.5) * 40.0, (uv.y - 0.5) * 40.0, 0.0),
        }
    }

    #[test]
    fn test_output_alpha_fixed() {
        let params = ShadingParams::default();
        for uv in [Vec2::ZERO, Vec2::splat(0.5), Vec2::new(0.2, 0.9)] {
            let color = shade(&flat_sample(uv), Vec2::splat(0.5), 1.0, &params);
            assert_eq!(color.w, 0.9);
        }
    }

    #[test]
    fn test_light_follows_pointer() {
        let params = ShadingParams::default();
        assert_eq!(light_position(Vec2::splat(0.5), &params), Vec3::new(0.0, 0.0, 8.0));
        assert_eq!(
            light_position(Vec2::new(1.0, 0.0), &params),
            Vec3::new(10.0, -10.0, 8.0)
        );
    }

    #[test]
    fn test_center_highlight_under_centered_light() {
        let params = ShadingParams::default();
        // Flat surface at the origin, light and eye straight above: N.H = 1, N.V = 1
        let color = shade(&flat_sample(Vec2::splat(0.5)), Vec2::splat(0.5), 0.0, &params);

        let palette = &params.palette;
        let expected = Vec3::from_array(palette.base)
            + Vec3::from_array(palette.highlight) * 0.8
            + Vec3::from_array(palette.secondary) * 0.5;
        // Shimmer is sin(25) * sin(25) * 0.02 at the center
        let shimmer = 25.0f32.sin() * 25.0f32.sin() * 0.02;
        let expected = expected + Vec3::splat(shimmer);

        assert!(color.truncate().distance(expected) < 1e-4, "{:?} vs {:?}", color, expected);
    }

    #[test]
    fn test_vignette_darkens_corners() {
        let mut params = ShadingParams::default();
        params.shimmer_amplitude = 0.0;
        // Turn off lighting so only base color and vignette remain
        params.sharp_weight = 0.0;
        params.broad_weight = 0.0;
        params.fresnel_weight = 0.0;

        let center = shade(&flat_sample(Vec2::splat(0.5)), Vec2::splat(0.5), 0.0, &params);
        let corner = shade(&flat_sample(Vec2::ZERO), Vec2::splat(0.5), 0.0, &params);

        assert!(corner.x < center.x);
        let expected = 1.0 - std::f32::consts::SQRT_2 * 0.5 * 0.5;
        assert!((corner.x / center.x - expected).abs() < 1e-5);
    }

    #[test]
    fn test_fresnel_grows_at_grazing_angles() {
        let mut params = ShadingParams::default();
        params.shimmer_amplitude = 0.0;
        params.vignette_strength = 0.0;
        params.sharp_weight = 0.0;
        params.broad_weight = 0.0;

        let facing = shade(&flat_sample(Vec2::splat(0.5)), Vec2::splat(0.5), 0.0, &params);
        let tilted = SurfaceSample {
            normal: Vec3::new(0.9, 0.0, 0.1).normalize(),
            ..flat_sample(Vec2::splat(0.5))
        };
        let grazing = shade(&tilted, Vec2::splat(0.5), 0.0, &params);

        assert!(grazing.x > facing.x);
    }

    #[test]
    fn test_back_facing_normal_has_no_specular() {
        let mut params = ShadingParams::default();
        params.shimmer_amplitude = 0.0;
        params.vignette_strength = 0.0;
        params.fresnel_weight = 0.0;

        let sample = SurfaceSample {
            normal: -Vec3::Z,
            ..flat_sample(Vec2::splat(0.5))
        };
        let color = shade(&sample, Vec2::splat(0.5), 0.0, &params);
        let base = Vec3::from_array(params.palette.base);
        assert!(color.truncate().distance(base) < 1e-6);
    }

    #[test]
    fn test_reference_map_size_and_opacity() {
        let field = WaveField::new(WaveParams::default(), Vec2::new(40.0, 40.0));
        let image = render_reference(
            &field,
            Vec2::new(40.0, 40.0),
            0.5,
            Vec2::new(0.3, 0.6),
            &ShadingParams::default(),
            Vec3::ZERO,
            16,
        );

        assert_eq!(image.dimensions(), (16, 16));
        assert!(image.pixels().all(|p| p.0[3] == 255));
        // Base color alone is non-black, so every pixel carries some light
        assert!(image.pixels().all(|p| p.0[0] > 0 || p.0[1] > 0 || p.0[2] > 0));
    }
}
