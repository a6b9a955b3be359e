//! Error types for the wave panel renderer.

use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum WaveError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to create surface: {0}")]
    CreateSurface(String),

    #[error("failed to request device: {0}")]
    RequestDevice(String),

    #[error("surface reports no supported formats or alpha modes for this adapter")]
    UnsupportedSurface,

    #[error("degenerate viewport {width}x{height}")]
    DegenerateViewport { width: u32, height: u32 },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WaveError>;
