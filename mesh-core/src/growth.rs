//! Boundary extrusion, velocity integration, edge-length constraints,
//! and on-demand Laplacian smoothing.

use crate::geometry::{EPS, random_unit};
use crate::mesh::Mesh;
use glam::Vec3;
use rand::Rng;

/// Edges hit this recently do not grow.
const GROWTH_COOLDOWN: f32 = 0.5;
/// Base growth rate in units per second.
const GROWTH_RATE: f32 = 0.3;
/// How strongly boundary edges steer toward the rim normal.
const BOUNDARY_BLEND: f32 = 0.7;
/// Boundary edges grow this much faster than interior ones.
const BOUNDARY_FACTOR: f32 = 1.5;
/// Upper bound of the random upward (+Z) bias per step.
const UPWARD_BIAS: f32 = 0.1;
/// Per-axis random jitter applied to growth directions.
const JITTER: f32 = 0.05;
/// Velocity retained per step.
const DAMPING: f32 = 0.95;
/// Speed ceiling in units per step.
const MAX_SPEED: f32 = 0.5;
/// Stretch beyond this multiple of rest length is corrected.
const STRETCH_LIMIT: f32 = 1.5;
/// Compression below this multiple of rest length is corrected.
const COMPRESS_LIMIT: f32 = 0.5;
/// Fraction of the excess corrected per step.
const CORRECTION: f32 = 0.2;
/// Interpolation weight for Laplacian smoothing.
const SMOOTH_WEIGHT: f32 = 0.5;

/// Ages edges and converts growth directions into symmetric velocity
/// contributions on both endpoints, so an edge always grows outward from
/// both ends equally.
///
/// Edges within [`GROWTH_COOLDOWN`] of their last collision sit the step
/// out. True boundary edges additionally steer toward the vector
/// perpendicular to both the edge tangent and the current direction,
/// pick up a small random upward bias, and jitter per axis.
pub fn growth_phase(mesh: &mut Mesh, dt: f32, time: f32, rng: &mut impl Rng) {
    for ei in 0..mesh.edges.len() {
        let (v1, v2, boundary) = {
            let e = &mesh.edges[ei];
            if time - e.last_collision < GROWTH_COOLDOWN {
                continue;
            }
            (e.v1, e.v2, e.is_boundary())
        };

        mesh.edges[ei].age += dt;
        let age = mesh.edges[ei].age;

        let mut dir = mesh.edges[ei].growth_dir;
        if boundary {
            let tangent = (mesh.vertices[v2].pos - mesh.vertices[v1].pos).normalize_or_zero();
            let mut perp = tangent.cross(dir).normalize_or_zero();
            if perp == Vec3::ZERO {
                perp = Vec3::Z;
            }
            dir = dir * (1.0 - BOUNDARY_BLEND) + perp * BOUNDARY_BLEND;
            dir.z += rng.random_range(0.0..UPWARD_BIAS);
            dir.x += rng.random_range(-JITTER..JITTER);
            dir.y += rng.random_range(-JITTER..JITTER);
            dir.z += rng.random_range(-JITTER..JITTER);
        }
        let dir = dir.normalize_or(Vec3::Z);
        mesh.edges[ei].growth_dir = dir;

        let factor = if boundary { BOUNDARY_FACTOR } else { 1.0 };
        let magnitude = GROWTH_RATE * dt * (age * 0.5).min(1.0) * factor;
        mesh.vertices[v1].vel += dir * magnitude;
        mesh.vertices[v2].vel += dir * magnitude;
    }
}

/// Integrates all vertices: `pos += vel * dt`, then damping and the
/// speed clamp.
pub fn integrate(mesh: &mut Mesh, dt: f32) {
    for v in &mut mesh.vertices {
        v.pos += v.vel * dt;
        v.vel *= DAMPING;
        v.vel = v.vel.clamp_length_max(MAX_SPEED);
    }
}

/// Corrects edges that have stretched or compressed past their limits,
/// moving both endpoints symmetrically by [`CORRECTION`] of the excess.
///
/// Coincident endpoints produce a degenerate direction; a unit vector
/// from the seeded RNG replaces it so the pair still separates.
pub fn constrain_lengths(mesh: &mut Mesh, rng: &mut impl Rng) {
    for ei in 0..mesh.edges.len() {
        let (v1, v2, rest) = {
            let e = &mesh.edges[ei];
            (e.v1, e.v2, e.rest_length)
        };
        let delta = mesh.vertices[v2].pos - mesh.vertices[v1].pos;
        let len = delta.length();
        let mut dir = delta / len;
        if len <= EPS || !dir.is_finite() {
            dir = random_unit(rng);
        }

        if len > rest * STRETCH_LIMIT {
            let shift = (len - rest * STRETCH_LIMIT) * CORRECTION * 0.5;
            mesh.vertices[v1].pos += dir * shift;
            mesh.vertices[v2].pos -= dir * shift;
        } else if len < rest * COMPRESS_LIMIT {
            let shift = (rest * COMPRESS_LIMIT - len) * CORRECTION * 0.5;
            mesh.vertices[v1].pos -= dir * shift;
            mesh.vertices[v2].pos += dir * shift;
        }
    }
}

/// Laplacian smoothing: interior vertices move halfway toward the
/// centroid of their edge neighbours. Invoked only on explicit request.
///
/// All centroids are computed from the pre-pass positions, so the
/// result is independent of vertex order.
pub fn smooth(mesh: &mut Mesh) {
    let smoothed: Vec<Option<Vec3>> = (0..mesh.vertices.len())
        .map(|vi| {
            if mesh.vertices[vi].boundary {
                return None;
            }
            let neighbors = mesh.neighbors_of(vi);
            if neighbors.is_empty() {
                return None;
            }
            let centroid = neighbors
                .iter()
                .map(|&n| mesh.vertices[n].pos)
                .sum::<Vec3>()
                / neighbors.len() as f32;
            Some(mesh.vertices[vi].pos.lerp(centroid, SMOOTH_WEIGHT))
        })
        .collect();

    for (v, pos) in mesh.vertices.iter_mut().zip(smoothed) {
        if let Some(pos) = pos {
            v.pos = pos;
        }
    }
}
