//! Surface color palette and lighting constants.

/// Three fixed surface colors (linear RGB in [0, 1], written as authored)
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    /// Unlit surface color (#1a1a1a)
    pub base: [f32; 3],

    /// Sharp specular tint (#d4af37, gold)
    pub highlight: [f32; 3],

    /// Broad specular and Fresnel tint (#c0c0c0, silver)
    pub secondary: [f32; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            base: rgb_from_hex(0x1a1a1a),
            highlight: rgb_from_hex(0xd4af37),
            secondary: rgb_from_hex(0xc0c0c0),
        }
    }
}

/// Convert a 0xRRGGBB literal to float RGB
pub fn rgb_from_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Lighting model constants shared by the CPU reference and the WGSL shader
#[derive(Debug, Clone)]
pub struct ShadingParams {
    pub palette: Palette,

    /// Light XY offset per unit of pointer displacement from center (world units)
    pub light_span: f32,

    /// Light height above the surface plane (world units)
    pub light_height: f32,

    /// Fixed view point on the surface normal axis (world units)
    pub view_height: f32,

    /// Exponent of the sharp highlight lobe
    pub sharp_exponent: f32,

    /// Exponent of the broad highlight lobe
    pub broad_exponent: f32,

    /// Fresnel falloff power
    pub fresnel_power: f32,

    /// Weight of highlight * sharp lobe
    pub sharp_weight: f32,

    /// Weight of secondary * broad lobe
    pub broad_weight: f32,

    /// Weight of secondary * fresnel
    pub fresnel_weight: f32,

    /// Amplitude of the UV shimmer added to every channel
    pub shimmer_amplitude: f32,

    /// Shimmer frequency in UV space (radians per UV unit)
    pub shimmer_frequency: f32,

    /// Darkening per unit of UV distance from center
    pub vignette_strength: f32,

    /// Output alpha
    pub alpha: f32,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            light_span: 20.0,
            light_height: 8.0,
            view_height: 10.0,
            sharp_exponent: 64.0,
            broad_exponent: 128.0,
            fresnel_power: 3.0,
            sharp_weight: 0.8,
            broad_weight: 0.5,
            fresnel_weight: 0.3,
            shimmer_amplitude: 0.02,
            shimmer_frequency: 50.0,
            vignette_strength: 0.5,
            alpha: 0.9,
        }
    }
}
