//! Mesh vertex data and the builtin shapes used by the light passes

use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Vec3;
use crate::spatial::AxisAlignedBox;

/// Vertex layout shared by every mesh
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position
    pub position: [f32; 3],
    /// Object-space normal
    pub normal: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
}

impl Vertex {
    /// Create a vertex
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, normal, uv }
    }
}

/// CPU-side mesh geometry, indexed triangle list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertices
    pub vertices: Vec<Vertex>,
    /// Triangle indices
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Vertex data as raw bytes for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data as raw bytes for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Tight bounding box of the vertex positions
    pub fn bounding_box(&self) -> AxisAlignedBox {
        if self.vertices.is_empty() {
            return AxisAlignedBox::default();
        }
        let mut bounds = AxisAlignedBox::empty();
        for vertex in &self.vertices {
            bounds.expand_to_include(&Vec3::from(vertex.position));
        }
        bounds
    }

    /// Full-screen quad in normalised device coordinates, on the z = 0 plane
    pub fn unit_quad() -> Self {
        let normal = [0.0, 0.0, 1.0];
        Self {
            vertices: vec![
                Vertex::new([-1.0, -1.0, 0.0], normal, [0.0, 0.0]),
                Vertex::new([1.0, -1.0, 0.0], normal, [1.0, 0.0]),
                Vertex::new([1.0, 1.0, 0.0], normal, [1.0, 1.0]),
                Vertex::new([-1.0, 1.0, 0.0], normal, [0.0, 1.0]),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// Axis-aligned cube spanning [-1, 1] on every axis
    pub fn unit_cube() -> Self {
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]),
            ([-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 1.0, 0.0], [0.0, 0.0, -1.0], [1.0, 0.0, 0.0]),
            ([0.0, -1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            ([0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
            ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]),
        ];
        let mut data = Self::default();
        for (normal, up, right) in faces {
            let n = Vec3::from(normal);
            let u = Vec3::from(up);
            let r = Vec3::from(right);
            let base = u32::try_from(data.vertices.len()).unwrap_or(u32::MAX);
            for (du, dr, uv) in [(-1.0, -1.0, [0.0, 0.0]), (-1.0, 1.0, [1.0, 0.0]), (1.0, 1.0, [1.0, 1.0]), (1.0, -1.0, [0.0, 1.0])] {
                let p = n + u * du + r * dr;
                data.vertices.push(Vertex::new([p.x, p.y, p.z], normal, uv));
            }
            data.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        data
    }

    /// UV sphere of radius 1, used as the point and spot light volume
    ///
    /// The tessellation is coarse, so every vertex is pushed out slightly so
    /// that the polygonal hull still encloses the true sphere.
    pub fn unit_sphere(rings: u32, segments: u32) -> Self {
        let rings = rings.max(2);
        let segments = segments.max(3);
        #[allow(clippy::cast_precision_loss)]
        let inflate = 1.0 / (PI / segments as f32).cos().max(f32::EPSILON);

        let mut data = Self::default();
        for ring in 0..=rings {
            #[allow(clippy::cast_precision_loss)]
            let v = ring as f32 / rings as f32;
            let theta = v * PI;
            for segment in 0..=segments {
                #[allow(clippy::cast_precision_loss)]
                let u = segment as f32 / segments as f32;
                let phi = u * TAU;
                let normal = [theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()];
                let position = normal.map(|c| c * inflate);
                data.vertices.push(Vertex::new(position, normal, [u, v]));
            }
        }

        let stride = segments + 1;
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment;
                let b = a + stride;
                data.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        data
    }
}
