//! Procedural water surface: grid mesh, displacement field and normals.

mod displacement;
mod mesh;
mod normal;

// Re-export public types
pub use displacement::{smoothstep, WaveField};
pub use mesh::{SurfaceMesh, Vertex};
pub use normal::estimate_normal;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{MeshParams, WaveParams};
    use glam::{DVec2, Vec2};

    fn small_mesh() -> SurfaceMesh {
        SurfaceMesh::new(&MeshParams {
            width: 2.0,
            height: 2.0,
            width_segments: 4,
            height_segments: 4,
        })
    }

    #[test]
    fn test_surface_mesh_creation() {
        let params = MeshParams::default();
        let mesh = SurfaceMesh::new(&params);

        // Check vertex count: (segments + 1)^2
        assert_eq!(mesh.vertices.len(), (params.width_segments + 1).pow(2));

        // Check triangle count: segments^2 * 2 triangles * 3 indices
        assert_eq!(mesh.indices.len(), params.width_segments.pow(2) * 6);
    }

    #[test]
    fn test_small_mesh_counts_and_corner_uvs() {
        let mesh = small_mesh();

        assert_eq!(mesh.vertices.len(), 25);
        assert_eq!(mesh.triangle_count(), 32);

        let first = mesh.vertices.first().unwrap();
        let last = mesh.vertices.last().unwrap();
        assert_eq!(first.uv, [0.0, 0.0]);
        assert_eq!(last.uv, [1.0, 1.0]);
        assert_eq!(first.position, [-1.0, -1.0, 0.0]);
        assert_eq!(last.position, [1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_rectangular_mesh_counts() {
        let mesh = SurfaceMesh::new(&MeshParams {
            width: 6.0,
            height: 2.0,
            width_segments: 3,
            height_segments: 1,
        });

        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.triangle_count(), 6);
        assert_eq!(mesh.vertices[1].position, [-1.0, -1.0, 0.0]);
    }

    #[test]
    fn test_zero_segments_clamped() {
        let mesh = SurfaceMesh::new(&MeshParams::with_segments(0));
        assert_eq!(mesh.segments(), (1, 1));
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_triangles_counter_clockwise_from_above() {
        let mesh = small_mesh();

        for tri in mesh.indices.chunks(3) {
            let a = mesh.vertices[tri[0] as usize].position;
            let b = mesh.vertices[tri[1] as usize].position;
            let c = mesh.vertices[tri[2] as usize].position;
            let cross_z = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            assert!(cross_z > 0.0, "triangle {:?} is not CCW", tri);
        }
    }

    #[test]
    fn test_update_keeps_topology_and_matches_field() {
        let mut mesh = small_mesh();
        let field = WaveField::new(WaveParams::default(), mesh.size());
        let indices_before = mesh.indices.clone();
        let rest_before: Vec<[f32; 2]> = mesh
            .vertices
            .iter()
            .map(|v| [v.position[0], v.position[1]])
            .collect();

        let pointer = Vec2::new(0.25, 0.75);
        mesh.update(&field, 1.5, pointer);

        assert_eq!(mesh.indices, indices_before);
        for (vertex, rest) in mesh.vertices.iter().zip(&rest_before) {
            assert_eq!([vertex.position[0], vertex.position[1]], *rest);

            let p = DVec2::new(rest[0] as f64, rest[1] as f64);
            let expected = field.displacement(p, 1.5, pointer.as_dvec2()) as f32;
            assert_eq!(vertex.position[2], expected);

            let n = glam::Vec3::from_array(vertex.normal);
            assert!((n.length() - 1.0).abs() < 1e-5);
        }
    }
}
