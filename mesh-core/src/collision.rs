//! Self-collision detection and response.
//!
//! Broad phase queries the [`SpatialGrid`] for boundary-edge midpoints
//! and face centroids; narrow phase runs the exact segment/triangle
//! tests from [`crate::geometry`]. Responses are velocity impulses plus
//! a steering blend that turns growth directions away from the contact.
//!
//! Cooldown windows and first-match-wins keep the per-step cost bounded;
//! dense clusters may under-resolve in one frame and rely on continued
//! per-frame correction.

use crate::config::Config;
use crate::geometry::{Aabb, segment_closest, triangle_contact};
use crate::grid::{GridItem, SpatialGrid};
use crate::mesh::Mesh;
use glam::Vec3;

/// Minimum time between collision responses for the same edge.
const EDGE_COOLDOWN: f32 = 0.2;
/// Impulse magnitude for edge-edge contacts.
const EDGE_REPULSION: f32 = 0.15;
/// Impulse magnitude for face-face contacts.
const FACE_REPULSION: f32 = 0.2;
/// Fraction of the growth direction steered away per contact.
const STEER_BLEND: f32 = 0.3;

/// Runs both collision passes for one step and returns the number of
/// collision events, for the cumulative telemetry counter.
///
/// The grid must describe the previous step's fully-integrated
/// positions; this function never observes partially-updated state.
pub fn collision_phase(mesh: &mut Mesh, grid: &SpatialGrid, cfg: &Config, time: f32) -> u32 {
    let mut events = 0;
    let mut budget = cfg.collision_checks;
    let mut touched_faces = vec![false; mesh.faces.len()];

    events += edge_pass(mesh, grid, cfg, time, &mut budget, &mut touched_faces);
    events += face_pass(mesh, grid, cfg, time, &mut budget, &mut touched_faces);
    events
}

/// Edge-edge pass over boundary edges outside their cooldown window.
fn edge_pass(
    mesh: &mut Mesh,
    grid: &SpatialGrid,
    cfg: &Config,
    time: f32,
    budget: &mut usize,
    touched_faces: &mut [bool],
) -> u32 {
    let threshold = cfg.collision_threshold;
    let mut events = 0;

    'edges: for ei in mesh.boundary_edges() {
        if *budget == 0 {
            break;
        }
        let (v1, v2) = {
            let e = &mesh.edges[ei];
            if time - e.last_collision < EDGE_COOLDOWN {
                continue;
            }
            (e.v1, e.v2)
        };
        let a0 = mesh.vertices[v1].pos;
        let a1 = mesh.vertices[v2].pos;
        let mid = (a0 + a1) * 0.5;
        let box_a = Aabb::from_points(&[a0, a1]).expanded(threshold);

        for item in grid.query(mid, threshold * 2.0) {
            let GridItem::Edge(oi) = item else { continue };
            if oi == ei {
                continue;
            }
            let (ov1, ov2) = (mesh.edges[oi].v1, mesh.edges[oi].v2);
            if ov1 == v1 || ov1 == v2 || ov2 == v1 || ov2 == v2 {
                continue;
            }

            let b0 = mesh.vertices[ov1].pos;
            let b1 = mesh.vertices[ov2].pos;
            if !box_a.intersects(&Aabb::from_points(&[b0, b1])) {
                continue;
            }

            if *budget == 0 {
                break 'edges;
            }
            *budget -= 1;

            let hit = segment_closest(a0, a1, b0, b1);
            if hit.distance < threshold {
                let dir = (hit.on_a - hit.on_b).normalize_or(Vec3::Z);

                // Equal and opposite impulse on the four endpoints.
                mesh.vertices[v1].vel += dir * EDGE_REPULSION;
                mesh.vertices[v2].vel += dir * EDGE_REPULSION;
                mesh.vertices[ov1].vel -= dir * EDGE_REPULSION;
                mesh.vertices[ov2].vel -= dir * EDGE_REPULSION;
                for v in [v1, v2, ov1, ov2] {
                    mesh.vertices[v].last_collision = time;
                }

                mesh.edges[ei].last_collision = time;
                mesh.edges[oi].last_collision = time;
                steer_away(mesh, ei, dir);
                steer_away(mesh, oi, dir);

                for id in [ei, oi] {
                    for fi in mesh.edges[id].faces.clone() {
                        touched_faces[fi] = true;
                    }
                }

                events += 1;
                // First qualifying neighbour wins for this edge.
                continue 'edges;
            }
        }
    }
    events
}

/// Face-face pass over faces untouched so far this step.
fn face_pass(
    mesh: &mut Mesh,
    grid: &SpatialGrid,
    cfg: &Config,
    time: f32,
    budget: &mut usize,
    touched_faces: &mut [bool],
) -> u32 {
    let threshold = cfg.collision_threshold;
    let mut events = 0;

    'faces: for fi in 0..mesh.faces.len() {
        if *budget == 0 {
            break;
        }
        if touched_faces[fi] || face_in_cooldown(mesh, fi, time) {
            continue;
        }
        let t1 = mesh.face_positions(fi);
        let c1 = mesh.face_centroid(fi);

        for item in grid.query(c1, threshold * 2.0) {
            let GridItem::Face(oi) = item else { continue };
            if oi == fi
                || touched_faces[oi]
                || face_in_cooldown(mesh, oi, time)
                || mesh.faces_share_vertex(fi, oi)
            {
                continue;
            }

            if *budget == 0 {
                break 'faces;
            }
            *budget -= 1;

            let t2 = mesh.face_positions(oi);
            if let Some(dir) = triangle_contact(&t1, &t2, threshold) {
                for &v in &mesh.faces[fi].verts {
                    mesh.vertices[v].vel += dir * FACE_REPULSION;
                    mesh.vertices[v].last_collision = time;
                }
                for &v in &mesh.faces[oi].verts {
                    mesh.vertices[v].vel -= dir * FACE_REPULSION;
                    mesh.vertices[v].last_collision = time;
                }
                touched_faces[fi] = true;
                touched_faces[oi] = true;
                events += 1;
                continue 'faces;
            }
        }
    }
    events
}

/// True if any vertex of the face was hit within the cooldown window.
fn face_in_cooldown(mesh: &Mesh, face: crate::types::FaceId, time: f32) -> bool {
    mesh.faces[face]
        .verts
        .iter()
        .any(|&v| time - mesh.vertices[v].last_collision < EDGE_COOLDOWN)
}

/// Blends an edge's growth direction toward its component perpendicular
/// to the repulsion, so growing edges steer away instead of re-colliding.
fn steer_away(mesh: &mut Mesh, edge: crate::types::EdgeId, repulsion: Vec3) {
    let g = mesh.edges[edge].growth_dir;
    let mut perp = (g - repulsion * g.dot(repulsion)).normalize_or_zero();
    if perp == Vec3::ZERO {
        perp = repulsion.any_orthonormal_vector();
    }
    mesh.edges[edge].growth_dir = (g * (1.0 - STEER_BLEND) + perp * STEER_BLEND).normalize_or(g);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Face, Mesh, Vertex};

    /// Two single-triangle islands whose boundary edges cross at a skew
    /// angle 0.05 apart: edge v0-v1 along X, edge v3-v4 along Z.
    fn crossing_edges_mesh() -> Mesh {
        Mesh::from_faces(
            vec![
                Vertex::at(Vec3::new(0.0, 0.0, 0.0), true),
                Vertex::at(Vec3::new(1.0, 0.0, 0.0), true),
                Vertex::at(Vec3::new(0.5, 1.0, 0.0), true),
                Vertex::at(Vec3::new(0.5, 0.05, -0.5), true),
                Vertex::at(Vec3::new(0.5, 0.05, 0.5), true),
                Vertex::at(Vec3::new(1.5, 1.05, 0.0), true),
            ],
            vec![Face { verts: [0, 1, 2] }, Face { verts: [3, 4, 5] }],
        )
    }

    fn grid_for(mesh: &Mesh, cell: f32) -> SpatialGrid {
        let mut grid = SpatialGrid::new(cell);
        for ei in mesh.boundary_edges() {
            grid.insert(GridItem::Edge(ei), mesh.edge_midpoint(ei));
        }
        for fi in 0..mesh.faces.len() {
            grid.insert(GridItem::Face(fi), mesh.face_centroid(fi));
        }
        grid
    }

    #[test]
    fn crossing_boundary_edges_collide_exactly_once() {
        let mut mesh = crossing_edges_mesh();
        let grid = grid_for(&mesh, 0.5);
        let cfg = Config::default();
        let time = 3.25;

        let events = collision_phase(&mut mesh, &grid, &cfg, time);
        assert_eq!(events, 1, "one edge pair within threshold");

        let e1 = mesh.edge_id(0, 1).unwrap();
        let e2 = mesh.edge_id(3, 4).unwrap();
        assert_eq!(mesh.edges[e1].last_collision, time);
        assert_eq!(mesh.edges[e2].last_collision, time);

        // Impulses are equal and opposite along the contact normal.
        let v_up = mesh.vertices[0].vel;
        let v_down = mesh.vertices[3].vel;
        assert!(v_up.length() > 0.0);
        assert!((v_up + v_down).length() < 1e-6);
    }

    #[test]
    fn cooldown_suppresses_immediate_retrigger() {
        let mut mesh = crossing_edges_mesh();
        let grid = grid_for(&mesh, 0.5);
        let cfg = Config::default();

        assert_eq!(collision_phase(&mut mesh, &grid, &cfg, 1.0), 1);
        // Same geometry 0.1 s later: both edges are still cooling down.
        assert_eq!(collision_phase(&mut mesh, &grid, &cfg, 1.1), 0);
        // After the window has passed they respond again.
        assert_eq!(collision_phase(&mut mesh, &grid, &cfg, 1.5), 1);
    }

    #[test]
    fn vertex_sharing_edges_are_skipped() {
        // A flat grid's adjacent boundary edges share vertices and its
        // parallel edges are ignored, so nothing collides.
        let mut mesh = Mesh::planar_grid(2, 2.0);
        let grid = grid_for(&mesh, 0.5);
        let cfg = Config::default();
        assert_eq!(collision_phase(&mut mesh, &grid, &cfg, 0.0), 0);
    }

    #[test]
    fn steering_turns_growth_away_from_contact() {
        let mut mesh = crossing_edges_mesh();
        let e1 = mesh.edge_id(0, 1).unwrap();
        // Point the growth direction straight along the repulsion axis,
        // the worst case for re-collision.
        mesh.edges[e1].growth_dir = Vec3::new(0.0, -1.0, 0.0);
        let grid = grid_for(&mesh, 0.5);
        let cfg = Config::default();
        let before = mesh.edges[e1].growth_dir;

        collision_phase(&mut mesh, &grid, &cfg, 0.0);

        let after = mesh.edges[e1].growth_dir;
        assert!((after.length() - 1.0).abs() < 1e-4);
        assert_ne!(before, after);
        // Still steering away from the other edge, never toward it.
        assert!(after.y <= 0.0 + 1e-4);
    }

    #[test]
    fn exhausted_budget_stops_the_pass() {
        let mut mesh = crossing_edges_mesh();
        let grid = grid_for(&mesh, 0.5);
        let cfg = Config {
            collision_checks: 0,
            ..Config::default()
        }
        .clamped();
        // One check allowed in total; whether it finds the contact
        // depends on iteration order, but the pass must terminate and
        // never exceed one event.
        let events = collision_phase(&mut mesh, &grid, &cfg, 0.0);
        assert!(events <= 1);
    }
}
