use std::collections::BTreeMap;

use bytemuck::cast_slice;
use serde::{Deserialize, Serialize};

use math::vec::Vec3;

use crate::SceneError;

/// Largest grid resolution whose vertices are still addressable with `u16`
/// indices: `(255 + 1)^2 == 65536`.
pub const MAX_GRID_SEGMENTS: usize = 255;

/// Flat triangle mesh, laid out the way the renderer uploads it.
///
/// `vertices` and `normals` hold xyz triples, `tex_coords` uv pairs and
/// `indices` one triangle per three entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub tex_coords: Vec<f32>,
    pub indices: Vec<u16>,
    pub vertex_count: usize,
    pub triangle_count: usize,
}

impl Mesh {
    /// Regular `(segments + 1)^2` vertex grid covering a `size` x `size`
    /// square centered at the origin in the XZ plane. `height(x, z)` gives
    /// the y of every vertex. Normals are accumulated from the faces.
    pub fn grid<F>(name: &str, size: f32, segments: usize, height: F) -> Result<Mesh, SceneError>
    where
        F: Fn(f32, f32) -> f32,
    {
        let mut mesh = Mesh::grid_without_normals(name, size, segments, height)?;
        mesh.compute_normals();
        Ok(mesh)
    }

    /// Flat plane at y = 0 with every normal pointing up.
    pub fn water_plane(size: f32, segments: usize) -> Result<Mesh, SceneError> {
        let mut mesh = Mesh::grid_without_normals("water_plane", size, segments, |_, _| 0.0)?;
        for normal in mesh.normals.chunks_exact_mut(3) {
            normal.copy_from_slice(&Vec3::UP.to_slice());
        }
        Ok(mesh)
    }

    /// Sloped ground sitting below the water plane: it drops linearly from
    /// y = 0 at the (-x, -z) corner to y = -height_scale at the (+x, +z) one.
    pub fn terrain(size: f32, segments: usize, height_scale: f32) -> Result<Mesh, SceneError> {
        let half_size = size * 0.5;
        Mesh::grid("terrain", size, segments, |x, z| {
            -height_scale * ((x + half_size) + (z + half_size)) / (2.0 * size)
        })
    }

    fn grid_without_normals<F>(name: &str, size: f32, segments: usize, height: F) -> Result<Mesh, SceneError>
    where
        F: Fn(f32, f32) -> f32,
    {
        if segments == 0 || segments > MAX_GRID_SEGMENTS {
            return Err(SceneError::InvalidGrid { segments, max: MAX_GRID_SEGMENTS });
        }

        let side = segments + 1;
        let vertex_count = side * side;
        let triangle_count = 2 * segments * segments;

        let mut vertices = Vec::with_capacity(vertex_count * 3);
        let mut tex_coords = Vec::with_capacity(vertex_count * 2);

        let step = size / segments as f32;
        let half_size = size * 0.5;

        for i in 0..side {
            for j in 0..side {
                let x = j as f32 * step - half_size;
                let z = i as f32 * step - half_size;

                vertices.extend_from_slice(&[x, height(x, z), z]);
                tex_coords.extend_from_slice(&[
                    j as f32 / segments as f32,
                    i as f32 / segments as f32,
                ]);
            }
        }

        // Winding is what the renderer's backface culling expects.
        let mut indices = Vec::with_capacity(triangle_count * 3);
        for i in 0..segments {
            for j in 0..segments {
                let top_left = (i * side + j) as u16;
                let top_right = top_left + 1;
                let bottom_left = ((i + 1) * side + j) as u16;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[top_left, bottom_left, top_right]);
                indices.extend_from_slice(&[top_right, bottom_left, bottom_right]);
            }
        }

        Ok(Mesh {
            name: name.to_string(),
            vertices,
            normals: vec![0.0; vertex_count * 3],
            tex_coords,
            indices,
            vertex_count,
            triangle_count,
        })
    }

    #[inline]
    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::new(
            self.vertices[index * 3],
            self.vertices[index * 3 + 1],
            self.vertices[index * 3 + 2],
        )
    }

    #[inline]
    pub fn normal(&self, index: usize) -> Vec3 {
        Vec3::new(
            self.normals[index * 3],
            self.normals[index * 3 + 1],
            self.normals[index * 3 + 2],
        )
    }

    /// Recomputes vertex normals from the triangles.
    ///
    /// Every unit face normal is added with equal weight to its three
    /// vertices, no area or angle weighting, and the sums are normalized at
    /// the end. Vertices not referenced by any triangle end up with a zero
    /// normal.
    pub fn compute_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.vertex_count];

        for triangle in self.indices.chunks_exact(3) {
            let (i1, i2, i3) = (
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            );
            let v1 = self.position(i1);
            let edge1 = self.position(i2) - v1;
            let edge2 = self.position(i3) - v1;
            let face = edge1.cross(edge2).normalized();

            accumulated[i1] += face;
            accumulated[i2] += face;
            accumulated[i3] += face;
        }

        self.normals.clear();
        for normal in accumulated {
            self.normals.extend_from_slice(&normal.normalized().to_slice());
        }
    }

    /// Vertex positions as raw bytes for buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        cast_slice(&self.vertices)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        cast_slice(&self.normals)
    }

    pub fn tex_coord_bytes(&self) -> &[u8] {
        cast_slice(&self.tex_coords)
    }

    pub fn index_bytes(&self) -> &[u8] {
        cast_slice(&self.indices)
    }
}

/// Named meshes generated at startup.
#[derive(Debug, Default)]
pub struct MeshLibrary {
    meshes: BTreeMap<String, Mesh>,
}

impl MeshLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `mesh` under its name, replacing any previous mesh with that
    /// name.
    pub fn insert(&mut self, mesh: Mesh) {
        log::debug!(
            "registered mesh '{}' ({} vertices, {} triangles)",
            mesh.name, mesh.vertex_count, mesh.triangle_count
        );
        self.meshes.insert(mesh.name.clone(), mesh);
    }

    pub fn get(&self, name: &str) -> Result<&Mesh, SceneError> {
        self.meshes
            .get(name)
            .ok_or_else(|| SceneError::MeshNotFound(name.to_string()))
    }

    /// Mesh names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.meshes.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
