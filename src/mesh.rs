use glam::{Mat4, Vec3};
use serde::Deserialize;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position: position.to_array(), normal: normal.to_array() }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
            wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
            wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Local-space axis-aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl MeshBounds {
    pub fn from_vertices(vertices: &[MeshVertex]) -> Self {
        if vertices.is_empty() {
            return Self { min: Vec3::ZERO, max: Vec3::ZERO };
        }
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for v in vertices {
            let p = v.position();
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Indexed triangle list with counter-clockwise front faces.
#[derive(Debug, Clone, PartialEq)]
pub struct TriMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub bounds: MeshBounds,
}

impl TriMesh {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        let bounds = MeshBounds::from_vertices(&vertices);
        Self { vertices, indices, bounds }
    }

    /// Quad in the XY plane centred on the origin, front face towards +Z.
    pub fn quad(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let n = Vec3::Z;
        let vertices = vec![
            MeshVertex::new(Vec3::new(-hw, -hh, 0.0), n),
            MeshVertex::new(Vec3::new(hw, -hh, 0.0), n),
            MeshVertex::new(Vec3::new(hw, hh, 0.0), n),
            MeshVertex::new(Vec3::new(-hw, hh, 0.0), n),
        ];
        Self::new(vertices, vec![0, 1, 2, 0, 2, 3])
    }

    /// Axis-aligned box centred on the origin with per-face normals.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        let faces: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, right, up) in faces {
            let base = vertices.len() as u32;
            let c = normal * h;
            let r = right * h;
            let u = up * h;
            for corner in [c - r - u, c + r - u, c + r + u, c - r + u] {
                vertices.push(MeshVertex::new(corner, normal));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(vertices, indices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// World-space corners of each triangle.
    pub fn world_triangles(&self, model: Mat4) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(move |tri| {
            let fetch = |i: u32| self.vertices.get(i as usize).map(|v| model.transform_point3(v.position()));
            Some([fetch(tri[0])?, fetch(tri[1])?, fetch(tri[2])?])
        })
    }
}

/// Procedural geometry a scene file can request.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshShape {
    Quad { width: f32, height: f32 },
    Cuboid { size: [f32; 3] },
}

impl MeshShape {
    pub fn build(&self) -> TriMesh {
        match *self {
            MeshShape::Quad { width, height } => TriMesh::quad(width, height),
            MeshShape::Cuboid { size } => TriMesh::cuboid(Vec3::from_array(size)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winding_normal(mesh: &TriMesh, tri: usize) -> Vec3 {
        let idx = &mesh.indices[tri * 3..tri * 3 + 3];
        let a = mesh.vertices[idx[0] as usize].position();
        let b = mesh.vertices[idx[1] as usize].position();
        let c = mesh.vertices[idx[2] as usize].position();
        (b - a).cross(c - a).normalize()
    }

    #[test]
    fn cuboid_winding_matches_normals() {
        let mesh = TriMesh::cuboid(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.triangle_count(), 12);
        for tri in 0..mesh.triangle_count() {
            let stored = mesh.vertices[mesh.indices[tri * 3] as usize].normal();
            assert!(winding_normal(&mesh, tri).dot(stored) > 0.99, "triangle {tri} is wound backwards");
        }
        assert_eq!(mesh.bounds.min, Vec3::new(-0.5, -1.0, -1.5));
        assert_eq!(mesh.bounds.max, Vec3::new(0.5, 1.0, 1.5));
    }

    #[test]
    fn quad_faces_positive_z() {
        let mesh = TriMesh::quad(2.0, 1.0);
        assert!(winding_normal(&mesh, 0).dot(Vec3::Z) > 0.99);
        assert!(winding_normal(&mesh, 1).dot(Vec3::Z) > 0.99);
    }

    #[test]
    fn shape_deserializes_from_scene_json() {
        let shape: MeshShape = serde_json::from_str(r#"{"cuboid":{"size":[1,1,1]}}"#).unwrap();
        assert_eq!(shape, MeshShape::Cuboid { size: [1.0, 1.0, 1.0] });
    }
}
