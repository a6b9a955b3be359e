//! Wavepanel - an animated water surface for hero sections
//!
//! A dense plane rolls with layered gradient noise, ripples under the
//! pointer and catches a gold highlight from a light that follows it.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use glam::{Vec2, Vec3};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use wavepanel::camera::CameraSystem;
use wavepanel::cli::Args;
use wavepanel::error::{Result, WaveError};
use wavepanel::params::*;
use wavepanel::render_loop::{RenderLoop, TickOutcome};
use wavepanel::rendering::RenderSystem;
use wavepanel::shading;
use wavepanel::state::Viewport;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Simulation
    render_loop: RenderLoop,

    // Configuration
    render_config: RenderConfig,
    recording_config: Option<RecordingConfig>,

    failed: bool,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let render_config = args.render_config()?;
        let viewport = Viewport::new(render_config.window_width, render_config.window_height)?;
        let render_loop = RenderLoop::new(
            args.loop_params()?,
            &args.mesh_params()?,
            args.wave_params(),
            viewport,
        )?;
        let recording_config = args.create_recording_config()?;

        if let Some(ref config) = recording_config {
            log::info!(
                "Recording {} frames to {}",
                config.total_frames(),
                config.frames_dir().display()
            );
        }

        Ok(Self {
            window: None,
            render_system: None,
            render_loop,
            render_config,
            recording_config,
            failed: false,
        })
    }

    /// Create the window and GPU resources
    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title("Wavepanel")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .map_err(|e| WaveError::CreateSurface(e.to_string()))?,
        );

        // Logical size may differ from the physical size we render at
        let size = window.inner_size();
        if let Err(e) = self.render_loop.resized(size.width, size.height) {
            log::debug!("Keeping initial viewport: {e}");
        }

        let viewport = self.render_loop.state().viewport;
        let camera = CameraSystem::new(CameraParams::default(), &viewport);
        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            self.render_loop.mesh(),
            camera,
            ShadingParams::default(),
            &self.render_config,
            self.recording_config.clone(),
        ))?;

        self.window = Some(window);
        self.render_system = Some(render_system);
        Ok(())
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        self.render_loop.stop_signal().stop();
        event_loop.exit();
    }

    /// Run one tick into the GPU sink and react to frame errors
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(ref mut render_system) = self.render_system else {
            return;
        };

        match self.render_loop.tick(render_system) {
            Ok(TickOutcome::Presented) => {
                if render_system.recording_complete() {
                    log::info!("Recording complete: {} frames", render_system.captured_frames());
                    self.stop(event_loop);
                }
            }
            Ok(TickOutcome::Stopped) => event_loop.exit(),
            Err(WaveError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                render_system.reconfigure();
            }
            Err(WaveError::Surface(wgpu::SurfaceError::Timeout)) => {
                log::warn!("Surface timeout, skipping frame");
            }
            Err(e) => {
                log::error!("Render error: {e}");
                self.failed = true;
                self.stop(event_loop);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        match self.init_graphics(event_loop) {
            Ok(()) => log::info!("Wavepanel is running, press ESC to quit"),
            Err(e) => {
                log::error!("Initialization failed: {e}");
                self.failed = true;
                self.stop(event_loop);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.stop(event_loop),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => self.stop(event_loop),
            WindowEvent::CursorMoved { position, .. } => {
                self.render_loop.pointer_moved(position.x, position.y);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                // A Resized event with the new physical size follows
                if let Some(ref mut render_system) = self.render_system {
                    render_system.set_scale_factor(scale_factor);
                }
            }
            WindowEvent::Resized(size) => match self.render_loop.resized(size.width, size.height) {
                Ok(()) => {
                    if let Some(ref mut render_system) = self.render_system {
                        render_system.resize(&self.render_loop.state().viewport);
                    }
                }
                // Minimized windows report 0x0; keep the last good configuration
                Err(e) => log::debug!("Ignoring resize: {e}"),
            },
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }
}

/// Shade the surface on the CPU and write it as a PNG
fn write_reference(args: &Args, path: &std::path::Path) -> Result<()> {
    let mesh_params = args.mesh_params()?;
    let loop_params = args.loop_params()?;
    let field = wavepanel::surface::WaveField::new(
        args.wave_params(),
        Vec2::new(mesh_params.width, mesh_params.height),
    );
    let [r, g, b, _] = RenderConfig::default().clear_color;

    let image = shading::render_reference(
        &field,
        Vec2::new(mesh_params.width, mesh_params.height),
        loop_params.start_time,
        Vec2::splat(0.5),
        &ShadingParams::default(),
        Vec3::new(r as f32, g as f32, b as f32),
        args.reference_size,
    );
    image.save(path)?;

    log::info!("Reference map written to {}", path.display());
    Ok(())
}

fn run(args: &Args) -> Result<bool> {
    if let Some(ref path) = args.reference {
        write_reference(args, path)?;
        return Ok(true);
    }

    let mut app = App::new(args)?;
    let event_loop = EventLoop::new().map_err(|e| WaveError::CreateSurface(e.to_string()))?;
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {e}");
        return Ok(false);
    }

    log::info!("Stopped after {} frames", app.render_loop.state().ticks());
    Ok(!app.failed)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
