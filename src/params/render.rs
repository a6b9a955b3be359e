//! Rendering, camera and recording configuration.

use std::path::PathBuf;

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Initial window width (pixels)
    pub window_width: u32,

    /// Initial window height (pixels)
    pub window_height: u32,

    /// Background behind the translucent surface (RGBA)
    pub clear_color: [f64; 4],

    /// Requested MSAA sample count (falls back to 1 when unsupported)
    pub msaa_samples: u32,

    /// Upper bound on rendered pixels per logical pixel
    pub max_pixel_ratio: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            clear_color: [0.04, 0.04, 0.04, 1.0],
            msaa_samples: 4,
            max_pixel_ratio: 2.0,
        }
    }
}

/// Fixed perspective camera looking down at the tilted surface
#[derive(Debug, Clone)]
pub struct CameraParams {
    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (world units)
    pub near_plane: f32,

    /// Far clipping plane (world units)
    pub far_plane: f32,

    /// Eye position, above and behind the surface (world units)
    pub eye: [f32; 3],

    /// Look-at point (world units)
    pub target: [f32; 3],

    /// Surface rotation about X (radians); negative tips the far edge away
    pub surface_tilt_rad: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            eye: [0.0, 5.0, 12.0],
            target: [0.0, 0.0, 0.0],
            surface_tilt_rad: -std::f32::consts::PI / 2.5,
        }
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds of output video)
    pub duration_secs: f32,

    /// Output directory for frames
    pub output_dir: PathBuf,

    /// Frame rate (FPS), one tick per frame
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: PathBuf::from("recording"),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> u64 {
        (self.duration_secs.max(0.0) * self.fps as f32).ceil() as u64
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> PathBuf {
        self.output_dir.join("frames")
    }

    /// Path of a single captured frame
    pub fn frame_path(&self, frame_num: u64) -> PathBuf {
        self.frames_dir().join(format!("frame_{:05}.png", frame_num))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_frame_count() {
        assert_eq!(RecordingConfig::new(1.0).total_frames(), 60);
        assert_eq!(RecordingConfig::new(0.51).total_frames(), 31);
        assert_eq!(RecordingConfig::new(-3.0).total_frames(), 0);
    }

    #[test]
    fn test_recording_frame_path() {
        let config = RecordingConfig::new(2.0);
        assert_eq!(
            config.frame_path(7),
            PathBuf::from("recording").join("frames").join("frame_00007.png")
        );
    }
}
