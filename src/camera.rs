//! Fixed perspective camera over the tilted surface.

use glam::{Mat4, Vec3};

use crate::params::CameraParams;
use crate::state::Viewport;

/// Camera system: projection follows the viewport, the eye never moves
pub struct CameraSystem {
    params: CameraParams,
    aspect: f32,
}

impl CameraSystem {
    /// Create camera for the given viewport
    pub fn new(params: CameraParams, viewport: &Viewport) -> Self {
        Self {
            params,
            aspect: viewport.aspect_ratio(),
        }
    }

    /// Recompute projection parameters after a resize
    pub fn resize(&mut self, viewport: &Viewport) {
        self.aspect = viewport.aspect_ratio();
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    pub fn eye(&self) -> Vec3 {
        Vec3::from_array(self.params.eye)
    }

    /// Surface-to-world transform (tilt about X)
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.params.surface_tilt_rad)
    }

    /// Create view-projection matrix for rendering
    pub fn view_proj_matrix(&self) -> Mat4 {
        let target = Vec3::from_array(self.params.target);

        // Always keep Y as up vector (camera never rolls)
        let view = Mat4::look_at_rh(self.eye(), target, Vec3::Y);
        let proj = Mat4::perspective_rh(
            self.params.fov_degrees.to_radians(),
            self.aspect,
            self.params.near_plane,
            self.params.far_plane,
        );

        proj * view
    }
}
