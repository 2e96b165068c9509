//! Mutable mesh state: vertices, faces, and the derived edge structure.
//!
//! The vertex and face lists are the sole persisted topology. Edges (and
//! their adjacency) are a cache rebuilt from the face list with
//! [`Mesh::rebuild_edges`]; they are never carried across a subdivision.

use crate::types::{EdgeId, EdgeKey, FaceId, VertexId};
use glam::Vec3;
use hashbrown::HashMap;

#[derive(Clone, Debug)]
pub struct Vertex {
    pub pos: Vec3,
    pub vel: Vec3,
    /// Seconds accumulated since creation.
    pub age: f32,
    pub growth_dir: Vec3,
    pub boundary: bool,
    pub last_collision: f32,
}

impl Vertex {
    pub fn at(pos: Vec3, boundary: bool) -> Self {
        Self {
            pos,
            vel: Vec3::ZERO,
            age: 0.0,
            growth_dir: Vec3::Z,
            boundary,
            last_collision: f32::NEG_INFINITY,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Edge {
    /// Canonical endpoints, `v1 < v2`.
    pub v1: VertexId,
    pub v2: VertexId,
    /// Endpoint distance at creation.
    pub rest_length: f32,
    /// Incident faces; at most two in a manifold neighbourhood.
    pub faces: Vec<FaceId>,
    pub age: f32,
    pub growth_dir: Vec3,
    pub last_collision: f32,
}

impl Edge {
    /// An edge is on the mesh rim iff exactly one face touches it.
    pub fn is_boundary(&self) -> bool {
        self.faces.len() == 1
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Face {
    pub verts: [VertexId; 3],
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
    pub edges: Vec<Edge>,
    edge_map: HashMap<EdgeKey, EdgeId>,
}

impl Mesh {
    /// Builds a flat `resolution` x `resolution`-cell planar grid in the
    /// XY plane, centered on the origin, with two triangles per cell.
    /// Outer-ring vertices are flagged as boundary.
    pub fn planar_grid(resolution: usize, size: f32) -> Self {
        let n = resolution.max(1);
        let step = size / n as f32;
        let half = size * 0.5;

        let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
        for j in 0..=n {
            for i in 0..=n {
                let boundary = i == 0 || j == 0 || i == n || j == n;
                let pos = Vec3::new(i as f32 * step - half, j as f32 * step - half, 0.0);
                vertices.push(Vertex::at(pos, boundary));
            }
        }

        let mut faces = Vec::with_capacity(n * n * 2);
        for j in 0..n {
            for i in 0..n {
                let a = j * (n + 1) + i;
                let b = a + 1;
                let c = a + (n + 1);
                let d = c + 1;
                faces.push(Face { verts: [a, b, c] });
                faces.push(Face { verts: [b, d, c] });
            }
        }

        let mut mesh = Self {
            vertices,
            faces,
            edges: Vec::new(),
            edge_map: HashMap::new(),
        };
        mesh.rebuild_edges();
        mesh
    }

    /// Assembles a mesh from explicit vertex and face lists, deriving
    /// the edge structure.
    pub fn from_faces(vertices: Vec<Vertex>, faces: Vec<Face>) -> Self {
        let mut mesh = Self {
            vertices,
            faces,
            edges: Vec::new(),
            edge_map: HashMap::new(),
        };
        mesh.rebuild_edges();
        mesh
    }

    /// Derives the edge list and edge map from the face list in O(faces).
    ///
    /// Fresh edges start with age zero, a +Z growth direction, and a rest
    /// length equal to the current endpoint distance. A third face on an
    /// edge is an impossible local configuration and is discarded.
    pub fn rebuild_edges(&mut self) {
        self.edges.clear();
        self.edge_map.clear();

        for fi in 0..self.faces.len() {
            let [a, b, c] = self.faces[fi].verts;
            for (u, v) in [(a, b), (b, c), (c, a)] {
                let key = EdgeKey::new(u, v);
                let id = match self.edge_map.get(&key) {
                    Some(&id) => id,
                    None => {
                        let id = self.edges.len();
                        let rest =
                            (self.vertices[key.b].pos - self.vertices[key.a].pos).length();
                        self.edges.push(Edge {
                            v1: key.a,
                            v2: key.b,
                            rest_length: rest,
                            faces: Vec::with_capacity(2),
                            age: 0.0,
                            growth_dir: Vec3::Z,
                            last_collision: f32::NEG_INFINITY,
                        });
                        self.edge_map.insert(key, id);
                        id
                    }
                };
                let edge = &mut self.edges[id];
                if edge.faces.len() < 2 && !edge.faces.contains(&fi) {
                    edge.faces.push(fi);
                }
            }
        }
    }

    pub fn edge_id(&self, v1: VertexId, v2: VertexId) -> Option<EdgeId> {
        self.edge_map.get(&EdgeKey::new(v1, v2)).copied()
    }

    /// Indices of edges with exactly one incident face.
    pub fn boundary_edges(&self) -> Vec<EdgeId> {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(id, e)| e.is_boundary().then_some(id))
            .collect()
    }

    /// Vertices sharing an edge with `vertex`. Used by on-demand
    /// smoothing, never by the per-step simulation loop.
    pub fn neighbors_of(&self, vertex: VertexId) -> Vec<VertexId> {
        let mut out = Vec::new();
        for edge in &self.edges {
            if edge.v1 == vertex {
                out.push(edge.v2);
            } else if edge.v2 == vertex {
                out.push(edge.v1);
            }
        }
        out
    }

    pub fn edge_midpoint(&self, id: EdgeId) -> Vec3 {
        let e = &self.edges[id];
        (self.vertices[e.v1].pos + self.vertices[e.v2].pos) * 0.5
    }

    pub fn face_centroid(&self, id: FaceId) -> Vec3 {
        let [a, b, c] = self.faces[id].verts;
        (self.vertices[a].pos + self.vertices[b].pos + self.vertices[c].pos) / 3.0
    }

    pub fn face_positions(&self, id: FaceId) -> [Vec3; 3] {
        let [a, b, c] = self.faces[id].verts;
        [
            self.vertices[a].pos,
            self.vertices[b].pos,
            self.vertices[c].pos,
        ]
    }

    /// True if the two faces have a vertex in common.
    pub fn faces_share_vertex(&self, f1: FaceId, f2: FaceId) -> bool {
        let a = self.faces[f1].verts;
        self.faces[f2].verts.iter().any(|v| a.contains(v))
    }

    // --- render snapshots -------------------------------------------------
    //
    // Collaborators get owned copies, never views into the live buffers.

    /// Flat position array, three floats per vertex.
    pub fn positions(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.vertices.len() * 3);
        for v in &self.vertices {
            out.extend_from_slice(&[v.pos.x, v.pos.y, v.pos.z]);
        }
        out
    }

    /// Flat triangle index array.
    pub fn indices(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.faces.len() * 3);
        for f in &self.faces {
            out.extend_from_slice(&[f.verts[0] as u32, f.verts[1] as u32, f.verts[2] as u32]);
        }
        out
    }

    /// Per-vertex colors: a height gradient, with boundary vertices
    /// tinted toward the rim color.
    pub fn vertex_colors(&self) -> Vec<[f32; 3]> {
        let low = [0.18, 0.32, 0.45];
        let high = [0.95, 0.85, 0.55];
        let rim = [0.90, 0.30, 0.25];

        let (min_z, max_z) = self.vertices.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY),
            |(lo, hi), v| (lo.min(v.pos.z), hi.max(v.pos.z)),
        );
        let span = (max_z - min_z).max(1e-6);

        self.vertices
            .iter()
            .map(|v| {
                let t = (v.pos.z - min_z) / span;
                let mut c = [
                    low[0] + (high[0] - low[0]) * t,
                    low[1] + (high[1] - low[1]) * t,
                    low[2] + (high[2] - low[2]) * t,
                ];
                if v.boundary {
                    for (ch, r) in c.iter_mut().zip(rim) {
                        *ch = *ch * 0.6 + r * 0.4;
                    }
                }
                c
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_by_two_grid_has_expected_topology() {
        // 2x2 cells: 9 vertices, 8 triangles.
        let mesh = Mesh::planar_grid(2, 2.0);
        assert_eq!(mesh.vertices.len(), 9);
        assert_eq!(mesh.faces.len(), 8);

        // Outer ring: 8 boundary vertices, the center vertex is interior.
        let boundary_verts = mesh.vertices.iter().filter(|v| v.boundary).count();
        assert_eq!(boundary_verts, 8);
        assert!(!mesh.vertices[4].boundary, "center vertex must be interior");

        // Perimeter: 8 boundary edges.
        assert_eq!(mesh.boundary_edges().len(), 8);
    }

    #[test]
    fn every_edge_touches_one_or_two_faces() {
        let mesh = Mesh::planar_grid(4, 4.0);
        for edge in &mesh.edges {
            assert!(
                edge.faces.len() == 1 || edge.faces.len() == 2,
                "edge {}-{} touches {} faces",
                edge.v1,
                edge.v2,
                edge.faces.len()
            );
        }
    }

    #[test]
    fn rebuild_edges_is_stable() {
        let mut mesh = Mesh::planar_grid(3, 3.0);
        let count = mesh.edges.len();
        let boundary = mesh.boundary_edges();

        mesh.rebuild_edges();
        assert_eq!(mesh.edges.len(), count);
        assert_eq!(mesh.boundary_edges(), boundary);
    }

    #[test]
    fn rest_length_matches_creation_distance() {
        let mesh = Mesh::planar_grid(2, 2.0);
        // Axis-aligned grid edges have length size / n = 1.0.
        let id = mesh.edge_id(0, 1).expect("grid edge 0-1 exists");
        assert!((mesh.edges[id].rest_length - 1.0).abs() < 1e-6);
    }

    #[test]
    fn neighbors_of_center_vertex() {
        let mesh = Mesh::planar_grid(2, 2.0);
        // Vertex 4 is the center of the 3x3 vertex grid; its edge
        // neighbours are the 4 axis neighbours plus the diagonals
        // introduced by the cell split.
        let n = mesh.neighbors_of(4);
        assert!(n.contains(&1) && n.contains(&3) && n.contains(&5) && n.contains(&7));
        assert!(n.len() >= 4);
    }

    #[test]
    fn snapshots_are_flat_and_sized() {
        let mesh = Mesh::planar_grid(2, 2.0);
        assert_eq!(mesh.positions().len(), 9 * 3);
        assert_eq!(mesh.indices().len(), 8 * 3);
        assert_eq!(mesh.vertex_colors().len(), 9);
    }

    #[test]
    fn boundary_vertices_are_tinted() {
        let mesh = Mesh::planar_grid(2, 2.0);
        let colors = mesh.vertex_colors();
        // Flat grid: same height everywhere, so any color difference
        // comes from the boundary tint alone.
        assert_ne!(colors[0], colors[4]);
    }
}
