//! Quad-based topology refinement.
//!
//! Pairs of triangles sharing an interior edge are reassembled into
//! quads, each quad gains a face point, every mesh edge gains an edge
//! point, and the quads are retriangulated around those points. This is
//! deliberately not true Catmull-Clark — there is no limit-surface
//! weighting — and the approximation is part of the visual behaviour,
//! not something to be corrected.

use crate::geometry::random_unit;
use crate::mesh::{Face, Mesh, Vertex};
use crate::types::{EdgeId, EdgeKey, FaceId, VertexId};
use glam::Vec3;
use hashbrown::HashMap;
use rand::Rng;

/// Positional jitter added to synthesized points.
const POINT_JITTER: f32 = 0.02;

/// A 4-vertex region reconstructed from two triangles sharing an edge.
///
/// Corners are ordered `[shared0, unshared0, shared1, unshared1]`, which
/// walks the quad perimeter (the shared edge is the quad's diagonal).
#[derive(Clone, Copy, Debug)]
pub struct Quad {
    pub corners: [VertexId; 4],
    pub faces: [FaceId; 2],
    pub edge: EdgeId,
}

/// Finds disjoint quads among triangle pairs.
///
/// A non-boundary edge with exactly two incident faces forms a quad if
/// neither face is claimed yet and the faces share exactly two vertices.
/// Anything failing a precondition is left untouched; a partially
/// subdividable mesh is accepted, not an error.
pub fn identify_quads(mesh: &Mesh) -> Vec<Quad> {
    let mut claimed = vec![false; mesh.faces.len()];
    let mut quads = Vec::new();

    for (ei, edge) in mesh.edges.iter().enumerate() {
        if edge.faces.len() != 2 {
            continue;
        }
        let (f1, f2) = (edge.faces[0], edge.faces[1]);
        if claimed[f1] || claimed[f2] {
            continue;
        }

        let a = mesh.faces[f1].verts;
        let b = mesh.faces[f2].verts;
        let shared: Vec<VertexId> = a.iter().filter(|v| b.contains(v)).copied().collect();
        if shared.len() != 2 {
            continue;
        }
        let Some(&u1) = a.iter().find(|v| !shared.contains(v)) else {
            continue;
        };
        let Some(&u2) = b.iter().find(|v| !shared.contains(v)) else {
            continue;
        };

        quads.push(Quad {
            corners: [shared[0], u1, shared[1], u2],
            faces: [f1, f2],
            edge: ei,
        });
        claimed[f1] = true;
        claimed[f2] = true;
    }
    quads
}

/// Refines the mesh in place. Returns `false` when no quad qualified and
/// the topology was left as it was.
///
/// Synthesizes one face point per quad (corner average plus jitter, min
/// corner age, fresh random growth direction) and one edge point per
/// mesh edge (midpoint plus jitter, inheriting the edge's growth
/// direction and boundary flag; `last_collision` is the plain min of the
/// endpoint values). Each quad becomes 8 triangles, two per perimeter
/// side; unclaimed faces are carried over unchanged. Vertex and face
/// lists are replaced wholesale and the edge map rebuilt.
pub fn subdivide(mesh: &mut Mesh, rng: &mut impl Rng) -> bool {
    let quads = identify_quads(mesh);
    if quads.is_empty() {
        return false;
    }

    let mut vertices = mesh.vertices.clone();

    let mut edge_points: HashMap<EdgeKey, VertexId> = HashMap::with_capacity(mesh.edges.len());
    for edge in &mesh.edges {
        let a = &mesh.vertices[edge.v1];
        let b = &mesh.vertices[edge.v2];
        let id = vertices.len();
        vertices.push(Vertex {
            pos: (a.pos + b.pos) * 0.5 + jitter(rng),
            vel: (a.vel + b.vel) * 0.5,
            age: a.age.min(b.age),
            growth_dir: edge.growth_dir,
            boundary: edge.is_boundary(),
            last_collision: a.last_collision.min(b.last_collision),
        });
        edge_points.insert(EdgeKey::new(edge.v1, edge.v2), id);
    }

    let mut face_points = Vec::with_capacity(quads.len());
    for quad in &quads {
        let corners = quad.corners.map(|c| &mesh.vertices[c]);
        let pos = corners.iter().map(|v| v.pos).sum::<Vec3>() / 4.0;
        let vel = corners.iter().map(|v| v.vel).sum::<Vec3>() / 4.0;
        let age = corners.iter().map(|v| v.age).fold(f32::INFINITY, f32::min);
        let last = corners
            .iter()
            .map(|v| v.last_collision)
            .fold(f32::INFINITY, f32::min);

        let id = vertices.len();
        vertices.push(Vertex {
            pos: pos + jitter(rng),
            vel,
            age,
            growth_dir: random_unit(rng),
            boundary: false,
            last_collision: last,
        });
        face_points.push(id);
    }

    let mut claimed = vec![false; mesh.faces.len()];
    for quad in &quads {
        claimed[quad.faces[0]] = true;
        claimed[quad.faces[1]] = true;
    }

    let mut faces: Vec<Face> = mesh
        .faces
        .iter()
        .enumerate()
        .filter_map(|(fi, f)| (!claimed[fi]).then_some(*f))
        .collect();

    for (quad, &fp) in quads.iter().zip(&face_points) {
        let [c0, c1, c2, c3] = quad.corners;
        for (u, v) in [(c0, c1), (c1, c2), (c2, c3), (c3, c0)] {
            let ep = edge_points[&EdgeKey::new(u, v)];
            faces.push(Face { verts: [u, ep, fp] });
            faces.push(Face { verts: [ep, v, fp] });
        }
    }

    mesh.vertices = vertices;
    mesh.faces = faces;
    mesh.rebuild_edges();
    true
}

fn jitter(rng: &mut impl Rng) -> Vec3 {
    Vec3::new(
        rng.random_range(-POINT_JITTER..POINT_JITTER),
        rng.random_range(-POINT_JITTER..POINT_JITTER),
        rng.random_range(-POINT_JITTER..POINT_JITTER),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Two triangles sharing the diagonal 0-2 of a unit quad.
    fn single_quad() -> Mesh {
        Mesh::from_faces(
            vec![
                Vertex::at(Vec3::new(0.0, 0.0, 0.0), true),
                Vertex::at(Vec3::new(1.0, 0.0, 0.0), true),
                Vertex::at(Vec3::new(1.0, 1.0, 0.0), true),
                Vertex::at(Vec3::new(0.0, 1.0, 0.0), true),
            ],
            vec![Face { verts: [0, 1, 2] }, Face { verts: [0, 2, 3] }],
        )
    }

    #[test]
    fn single_quad_is_identified() {
        let mesh = single_quad();
        let quads = identify_quads(&mesh);
        assert_eq!(quads.len(), 1);

        let q = quads[0];
        let mut corners = q.corners;
        corners.sort_unstable();
        assert_eq!(corners, [0, 1, 2, 3], "quad must contain all 4 vertices");

        // Shared corners sit at the even slots, unshared at the odd.
        assert!(q.corners[0] == 0 || q.corners[0] == 2);
        assert!(q.corners[2] == 0 || q.corners[2] == 2);
    }

    #[test]
    fn boundary_only_mesh_yields_no_quads() {
        // A single triangle has only boundary edges.
        let mut mesh = single_quad();
        mesh.faces.truncate(1);
        mesh.rebuild_edges();
        assert!(identify_quads(&mesh).is_empty());

        let mut rng = StdRng::seed_from_u64(0);
        assert!(!subdivide(&mut mesh, &mut rng));
        assert_eq!(mesh.faces.len(), 1);
    }

    #[test]
    fn subdividing_a_quad_yields_eight_faces() {
        let mut mesh = single_quad();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(subdivide(&mut mesh, &mut rng));

        // 2 -> 8 faces over the quad region.
        assert_eq!(mesh.faces.len(), 8);
        // 4 corners + one edge point per original edge (5) + 1 face point.
        assert_eq!(mesh.vertices.len(), 10);

        // Topology stays locally manifold.
        for edge in &mesh.edges {
            assert!(edge.faces.len() == 1 || edge.faces.len() == 2);
        }
    }

    #[test]
    fn edge_points_inherit_boundary_flags() {
        let mut mesh = single_quad();
        let mut rng = StdRng::seed_from_u64(3);
        subdivide(&mut mesh, &mut rng);

        // Original corners keep their flags; the face point is interior.
        assert!(mesh.vertices[..4].iter().all(|v| v.boundary));
        assert!(!mesh.vertices[9].boundary, "face point must be interior");

        // Four of the five edge points lie on the rim, one on the
        // diagonal.
        let rim = mesh.vertices[4..9].iter().filter(|v| v.boundary).count();
        assert_eq!(rim, 4);
    }

    #[test]
    fn face_point_ages_take_the_corner_minimum() {
        let mut mesh = single_quad();
        for (i, v) in mesh.vertices.iter_mut().enumerate() {
            v.age = i as f32 + 1.0;
        }
        let mut rng = StdRng::seed_from_u64(0);
        subdivide(&mut mesh, &mut rng);

        // Face point is the last vertex; corner ages were 1..=4.
        assert_eq!(mesh.vertices[9].age, 1.0);
    }

    #[test]
    fn grid_subdivision_keeps_edge_invariant() {
        let mut mesh = Mesh::planar_grid(3, 3.0);
        let faces_before = mesh.faces.len();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(subdivide(&mut mesh, &mut rng));

        assert!(mesh.faces.len() > faces_before);
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
}
