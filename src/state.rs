//! Per-frame simulation state: time, pointer and viewport.
//!
//! Everything the evaluation functions read each tick lives here and is
//! passed by reference, so a tick can be replayed without a display.

use glam::Vec2;

use crate::error::{Result, WaveError};
use crate::params::LoopParams;

/// Output surface size in pixels (both dimensions >= 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(WaveError::DegenerateViewport { width, height });
        }
        Ok(Self { width, height })
    }

    /// Apply a resize event; a zero dimension is rejected and leaves the viewport unchanged
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        *self = Self::new(width, height)?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Map a pixel position (origin top-left) to [0,1]² with y = 0 at the bottom
    pub fn normalize_pointer(&self, x: f64, y: f64) -> Vec2 {
        let nx = x / self.width as f64;
        let ny = 1.0 - y / self.height as f64;
        Vec2::new(nx.clamp(0.0, 1.0) as f32, ny.clamp(0.0, 1.0) as f32)
    }
}

/// Latest pointer sample and the exponentially smoothed value used for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub target: Vec2,
    pub smoothed: Vec2,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            target: Vec2::splat(0.5),
            smoothed: Vec2::splat(0.5),
        }
    }
}

impl PointerState {
    /// Move `smoothed` a fixed fraction of the way toward `target`
    pub fn smooth(&mut self, factor: f32) {
        self.smoothed += (self.target - self.smoothed) * factor;
    }
}

/// Mutable state advanced once per tick
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub time: f64,
    pub pointer: PointerState,
    pub viewport: Viewport,
    ticks: u64,
}

impl SimulationState {
    pub fn new(params: &LoopParams, viewport: Viewport) -> Self {
        Self {
            time: params.start_time,
            pointer: PointerState::default(),
            viewport,
            ticks: 0,
        }
    }

    /// Ticks completed since construction
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance time by one step and smooth the pointer toward its target
    pub fn advance(&mut self, params: &LoopParams) {
        self.time += params.time_step.max(0.0);
        self.pointer.smooth(params.pointer_smoothing);
        self.ticks += 1;
    }

    /// Record a raw pointer position in viewport pixels
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        self.pointer.target = self.viewport.normalize_pointer(x, y);
    }
}
