//! Surface grid mesh, displaced and re-lit in place every tick.

use bytemuck::{Pod, Zeroable};
use glam::{DVec2, Vec2};

use super::displacement::WaveField;
use super::normal::estimate_normal;
use crate::params::MeshParams;

/// Vertex data for the surface mesh (position + normal + UV coordinates)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Subdivided plane in z = 0 with fixed topology
pub struct SurfaceMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    width: f32,
    height: f32,
    width_segments: usize,
    height_segments: usize,
}

impl SurfaceMesh {
    /// Create a flat grid centered on the origin
    pub fn new(params: &MeshParams) -> Self {
        let nx = params.width_segments.max(1);
        let ny = params.height_segments.max(1);
        let half_w = params.width / 2.0;
        let half_h = params.height / 2.0;
        let step_x = params.width / nx as f32;
        let step_y = params.height / ny as f32;

        let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
        let mut indices = Vec::with_capacity(nx * ny * 6);

        // Rows ascend in y, so UV (0,0) is the first vertex and (1,1) the last
        for iy in 0..=ny {
            for ix in 0..=nx {
                vertices.push(Vertex {
                    position: [ix as f32 * step_x - half_w, iy as f32 * step_y - half_h, 0.0],
                    normal: [0.0, 0.0, 1.0],
                    uv: [ix as f32 / nx as f32, iy as f32 / ny as f32],
                });
            }
        }

        // Two counter-clockwise triangles per cell, seen from +z
        let row = nx + 1;
        for iy in 0..ny {
            for ix in 0..nx {
                let v00 = (iy * row + ix) as u32;
                let v10 = v00 + 1;
                let v01 = ((iy + 1) * row + ix) as u32;
                let v11 = v01 + 1;

                indices.extend_from_slice(&[v00, v10, v01, v10, v11, v01]);
            }
        }

        Self {
            vertices,
            indices,
            width: params.width,
            height: params.height,
            width_segments: nx,
            height_segments: ny,
        }
    }

    /// Plane extent (world units)
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Cells per axis
    pub fn segments(&self) -> (usize, usize) {
        (self.width_segments, self.height_segments)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Rewrite every vertex height and normal from the displacement field
    ///
    /// Heights and normals are sampled from the same field at the same instant,
    /// pointer ripple included, so lighting always matches the drawn geometry.
    pub fn update(&mut self, field: &WaveField, time: f64, pointer: Vec2) {
        let pointer = pointer.as_dvec2();

        for vertex in &mut self.vertices {
            let rest = DVec2::new(vertex.position[0] as f64, vertex.position[1] as f64);

            vertex.position[2] = field.displacement(rest, time, pointer) as f32;
            vertex.normal = estimate_normal(field, rest, time, pointer)
                .as_vec3()
                .to_array();
        }
    }
}
