//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{Result, WaveError};
use crate::params::{LoopParams, MeshParams, RecordingConfig, RenderConfig, WaveParams};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "wavepanel")]
#[command(about = "Animated water-surface hero panel", long_about = None)]
pub struct Args {
    /// Mesh subdivisions per axis
    #[arg(long, value_name = "N", default_value_t = 128)]
    pub segments: usize,

    /// Pointer smoothing factor per tick, in (0, 1)
    #[arg(long, value_name = "F", default_value_t = 0.05)]
    pub smoothing: f32,

    /// Gradient noise seed
    #[arg(long, value_name = "N", default_value_t = 42)]
    pub seed: u32,

    /// Initial window width (logical pixels)
    #[arg(long, value_name = "PX", default_value_t = 1280)]
    pub width: u32,

    /// Initial window height (logical pixels)
    #[arg(long, value_name = "PX", default_value_t = 720)]
    pub height: u32,

    /// Record frames to PNG (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Write a CPU-shaded reference map to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub reference: Option<PathBuf>,

    /// Reference map edge length in pixels
    #[arg(long, value_name = "N", default_value_t = 512)]
    pub reference_size: u32,
}

impl Args {
    /// Square mesh with the CLI resolution, validated
    pub fn mesh_params(&self) -> Result<MeshParams> {
        let params = MeshParams::with_segments(self.segments);
        params.validate()?;
        Ok(params)
    }

    pub fn wave_params(&self) -> WaveParams {
        WaveParams {
            noise_seed: self.seed,
            ..WaveParams::default()
        }
    }

    /// Loop parameters with the CLI smoothing factor, validated
    pub fn loop_params(&self) -> Result<LoopParams> {
        let params = LoopParams {
            pointer_smoothing: self.smoothing,
            ..LoopParams::default()
        };
        params.validate()?;
        Ok(params)
    }

    pub fn render_config(&self) -> Result<RenderConfig> {
        if self.width == 0 || self.height == 0 {
            return Err(WaveError::InvalidParameter(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(RenderConfig {
            window_width: self.width,
            window_height: self.height,
            ..RenderConfig::default()
        })
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> Result<Option<RecordingConfig>> {
        let Some(duration) = self.record else {
            return Ok(None);
        };

        if !duration.is_finite() || duration <= 0.0 {
            return Err(WaveError::InvalidParameter(format!(
                "recording duration must be positive, got {duration}"
            )));
        }

        let config = RecordingConfig::new(duration);

        // Create output directories
        std::fs::create_dir_all(config.frames_dir())?;

        Ok(Some(config))
    }
}
