//! Frame-driven render loop with an explicit stop signal.
//!
//! One tick advances simulation time, smooths the pointer, re-evaluates every
//! vertex of the surface and hands the result to a [`FrameSink`]. The loop is
//! single-threaded; the windowed app calls [`RenderLoop::tick`] once per
//! redraw, headless callers use [`RenderLoop::run`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::params::{LoopParams, MeshParams, WaveParams};
use crate::state::{SimulationState, Viewport};
use crate::surface::{SurfaceMesh, WaveField};

/// Shared flag checked at the top of every tick
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown; takes effect on the next tick
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Presented,
    Stopped,
}

/// Everything a presentation target needs for one frame
pub struct Frame<'a> {
    pub tick: u64,
    pub state: &'a SimulationState,
    pub mesh: &'a SurfaceMesh,
}

/// Presentation target for evaluated frames
pub trait FrameSink {
    fn present(&mut self, frame: &Frame<'_>) -> Result<()>;
}

/// Owns the simulation state, the surface and its displacement field
pub struct RenderLoop {
    params: LoopParams,
    state: SimulationState,
    mesh: SurfaceMesh,
    field: WaveField,
    stop: StopSignal,
}

impl RenderLoop {
    /// Build the surface and start in the running phase
    pub fn new(
        params: LoopParams,
        mesh_params: &MeshParams,
        wave_params: WaveParams,
        viewport: Viewport,
    ) -> Result<Self> {
        params.validate()?;
        mesh_params.validate()?;

        let mesh = SurfaceMesh::new(mesh_params);
        let field = WaveField::new(wave_params, mesh.size());
        let state = SimulationState::new(&params, viewport);

        log::debug!(
            "Surface mesh: {} vertices, {} triangles",
            mesh.vertices.len(),
            mesh.triangle_count()
        );

        Ok(Self {
            params,
            state,
            mesh,
            field,
            stop: StopSignal::new(),
        })
    }

    /// Handle that stops this loop when raised
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn phase(&self) -> Phase {
        if self.stop.is_stopped() {
            Phase::Stopped
        } else {
            Phase::Running
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn mesh(&self) -> &SurfaceMesh {
        &self.mesh
    }

    pub fn field(&self) -> &WaveField {
        &self.field
    }

    /// Pointer moved to pixel position `(x, y)` of the viewport
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        self.state.pointer_moved(x, y);
    }

    /// Viewport resized; zero-sized viewports are rejected
    pub fn resized(&mut self, width: u32, height: u32) -> Result<()> {
        self.state.viewport.resize(width, height)
    }

    /// Run one tick unless stopped
    pub fn tick<S: FrameSink + ?Sized>(&mut self, sink: &mut S) -> Result<TickOutcome> {
        if self.stop.is_stopped() {
            return Ok(TickOutcome::Stopped);
        }

        self.state.advance(&self.params);
        self.mesh
            .update(&self.field, self.state.time, self.state.pointer.smoothed);

        let frame = Frame {
            tick: self.state.ticks(),
            state: &self.state,
            mesh: &self.mesh,
        };
        sink.present(&frame)?;

        Ok(TickOutcome::Presented)
    }

    /// Tick until stopped or `max_ticks` frames were presented
    ///
    /// # Returns
    /// * Number of frames presented by this call
    pub fn run<S: FrameSink + ?Sized>(&mut self, sink: &mut S, max_ticks: Option<u64>) -> Result<u64> {
        let mut presented = 0;
        while max_ticks.map_or(true, |max| presented < max) {
            match self.tick(sink)? {
                TickOutcome::Presented => presented += 1,
                TickOutcome::Stopped => break,
            }
        }
        Ok(presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WaveError;
    use glam::Vec2;

    /// Records what each tick handed over
    #[derive(Default)]
    struct RecordingSink {
        ticks: Vec<u64>,
        times: Vec<f64>,
        pointers: Vec<Vec2>,
        heights: Vec<f32>,
        stop_after: Option<(u64, StopSignal)>,
    }

    impl FrameSink for RecordingSink {
        fn present(&mut self, frame: &Frame<'_>) -> Result<()> {
            self.ticks.push(frame.tick);
            self.times.push(frame.state.time);
            self.pointers.push(frame.state.pointer.smoothed);
            self.heights.push(frame.mesh.vertices[0].position[2]);
            if let Some((tick, signal)) = &self.stop_after {
                if frame.tick == *tick {
                    signal.stop();
                }
            }
            Ok(())
        }
    }

    struct FailingSink;

    impl FrameSink for FailingSink {
        fn present(&mut self, _frame: &Frame<'_>) -> Result<()> {
            Err(WaveError::Surface(wgpu::SurfaceError::Timeout))
        }
    }

    fn render_loop() -> RenderLoop {
        RenderLoop::new(
            LoopParams::default(),
            &MeshParams::with_segments(8),
            WaveParams::default(),
            Viewport::new(640, 480).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_bounded_run() {
        let mut render_loop = render_loop();
        let mut sink = RecordingSink::default();

        let presented = render_loop.run(&mut sink, Some(25)).unwrap();

        assert_eq!(presented, 25);
        assert_eq!(sink.ticks, (1..=25).collect::<Vec<_>>());
        assert!((render_loop.state().time - 0.25).abs() < 1e-9);
        assert!(sink.times.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(render_loop.phase(), Phase::Running);
    }

    #[test]
    fn test_stop_signal_halts_run() {
        let mut render_loop = render_loop();
        let mut sink = RecordingSink {
            stop_after: Some((10, render_loop.stop_signal())),
            ..RecordingSink::default()
        };

        let presented = render_loop.run(&mut sink, None).unwrap();

        assert_eq!(presented, 10);
        assert_eq!(render_loop.phase(), Phase::Stopped);
        assert_eq!(render_loop.state().ticks(), 10);
    }

    #[test]
    fn test_stopped_loop_does_not_advance() {
        let mut render_loop = render_loop();
        render_loop.stop_signal().stop();

        let mut sink = RecordingSink::default();
        assert_eq!(render_loop.tick(&mut sink).unwrap(), TickOutcome::Stopped);
        assert!(sink.ticks.is_empty());
        assert_eq!(render_loop.state().time, 0.0);
    }

    #[test]
    fn test_pointer_smoothing_across_ticks() {
        let mut render_loop = render_loop();
        // Top-right corner of a 640x480 viewport
        render_loop.pointer_moved(640.0, 0.0);

        let mut sink = RecordingSink::default();
        render_loop.run(&mut sink, Some(3)).unwrap();

        let mut expected = Vec2::splat(0.5);
        for pointer in &sink.pointers {
            expected += (Vec2::ONE - expected) * 0.05;
            assert_eq!(*pointer, expected);
        }
    }

    #[test]
    fn test_mesh_heights_change_over_time() {
        let mut render_loop = render_loop();
        let mut sink = RecordingSink::default();
        render_loop.run(&mut sink, Some(50)).unwrap();

        let first = sink.heights[0];
        assert!(sink.heights.iter().any(|h| *h != first));
    }

    #[test]
    fn test_topology_invariant_across_ticks() {
        let mut render_loop = render_loop();
        let vertex_count = render_loop.mesh().vertices.len();
        let indices = render_loop.mesh().indices.clone();

        render_loop.run(&mut RecordingSink::default(), Some(5)).unwrap();

        assert_eq!(render_loop.mesh().vertices.len(), vertex_count);
        assert_eq!(render_loop.mesh().indices, indices);
    }

    #[test]
    fn test_sink_error_propagates() {
        let mut render_loop = render_loop();
        let result = render_loop.run(&mut FailingSink, Some(3));
        assert!(matches!(result, Err(WaveError::Surface(_))));
    }

    #[test]
    fn test_resize_rejects_zero_and_keeps_viewport() {
        let mut render_loop = render_loop();
        assert!(render_loop.resized(800, 0).is_err());
        assert_eq!(render_loop.state().viewport.width(), 640);

        render_loop.resized(1024, 512).unwrap();
        assert_eq!(render_loop.state().viewport.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = LoopParams {
            pointer_smoothing: 2.0,
            ..LoopParams::default()
        };
        let result = RenderLoop::new(
            params,
            &MeshParams::default(),
            WaveParams::default(),
            Viewport::new(1, 1).unwrap(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_oversized_mesh_rejected() {
        let result = RenderLoop::new(
            LoopParams::default(),
            &MeshParams::with_segments(1 << 20),
            WaveParams::default(),
            Viewport::new(1, 1).unwrap(),
        );
        assert!(matches!(result, Err(WaveError::InvalidParameter(_))));
    }
}
