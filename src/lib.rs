//! Wavepanel library - animated water-surface hero renderer

pub mod camera;
pub mod cli;
pub mod error;
pub mod params;
pub mod render_loop;
pub mod rendering;
pub mod shading;
pub mod state;
pub mod surface;
