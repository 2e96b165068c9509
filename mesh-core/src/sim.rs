//! The owning simulation state and per-frame pipeline.
//!
//! One step runs: collision detection (against the grid built at the end
//! of the previous step, so it always observes fully-integrated
//! positions), growth, integration, length constraints, grid rebuild,
//! then the periodic subdivision and the vertex-cap check. All mutation
//! happens synchronously inside [`Simulation::step`]; pausing is simply
//! the host not calling it.

use crate::collision::collision_phase;
use crate::config::Config;
use crate::grid::{GridItem, SpatialGrid};
use crate::growth::{constrain_lengths, growth_phase, integrate, smooth};
use crate::mesh::Mesh;
use crate::subdivision::subdivide;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Subdivision is considered every this many frames...
pub const SUBDIVISION_FRAMES: u64 = 100;
/// ...but runs at most once per this much simulated time.
pub const SUBDIVISION_MIN_INTERVAL: f32 = 2.0;

/// Owns the mesh, the spatial grid, the RNG, and all per-run counters.
///
/// Collaborators never hold references across steps; rendering consumes
/// the owned snapshots from [`Simulation::positions`],
/// [`Simulation::indices`] and [`Simulation::vertex_colors`].
pub struct Simulation {
    pub mesh: Mesh,
    pub cfg: Config,
    grid: SpatialGrid,
    rng: StdRng,
    time: f32,
    frame: u64,
    collision_count: u64,
    last_subdivision: f32,
}

impl Simulation {
    pub fn new(cfg: Config) -> Self {
        let cfg = cfg.clamped();
        let mut sim = Self {
            mesh: Mesh::planar_grid(cfg.resolution, cfg.size),
            grid: SpatialGrid::new(cfg.cell_size),
            rng: StdRng::seed_from_u64(cfg.seed),
            time: 0.0,
            frame: 0,
            collision_count: 0,
            last_subdivision: 0.0,
            cfg,
        };
        sim.rebuild_grid();
        sim
    }

    /// Advances the simulation by one frame of host time `dt`.
    pub fn step(&mut self, dt: f32) {
        let dt = dt * self.cfg.growth_speed;

        let events = collision_phase(&mut self.mesh, &self.grid, &self.cfg, self.time);
        self.collision_count += u64::from(events);

        growth_phase(&mut self.mesh, dt, self.time, &mut self.rng);
        integrate(&mut self.mesh, dt);
        constrain_lengths(&mut self.mesh, &mut self.rng);
        self.rebuild_grid();

        self.frame += 1;
        self.time += dt;

        if self.frame % SUBDIVISION_FRAMES == 0
            && self.time - self.last_subdivision >= SUBDIVISION_MIN_INTERVAL
            && self.mesh.vertices.len() < self.cfg.vertex_cap
            && subdivide(&mut self.mesh, &mut self.rng)
        {
            self.last_subdivision = self.time;
            self.rebuild_grid();
        }

        // Exceeding the cap is not an error: it is the defined trigger
        // for a full reset.
        if self.mesh.vertices.len() > self.cfg.vertex_cap {
            self.reset();
        }
    }

    /// Discards the mesh and recreates the initial grid. The cumulative
    /// collision counter survives; clocks restart.
    pub fn reset(&mut self) {
        self.mesh = Mesh::planar_grid(self.cfg.resolution, self.cfg.size);
        self.time = 0.0;
        self.frame = 0;
        self.last_subdivision = 0.0;
        self.rebuild_grid();
    }

    /// Rebuilds the spatial grid from boundary-edge midpoints and face
    /// centroids. Idempotent for unchanged geometry.
    pub fn rebuild_grid(&mut self) {
        self.grid.reset();
        for ei in self.mesh.boundary_edges() {
            self.grid.insert(GridItem::Edge(ei), self.mesh.edge_midpoint(ei));
        }
        for fi in 0..self.mesh.faces.len() {
            self.grid.insert(GridItem::Face(fi), self.mesh.face_centroid(fi));
        }
    }

    /// Immediate subdivision on user request, honouring the vertex cap
    /// and refreshing the rate-limit clock.
    pub fn subdivide_now(&mut self) {
        if self.mesh.vertices.len() >= self.cfg.vertex_cap {
            return;
        }
        if subdivide(&mut self.mesh, &mut self.rng) {
            self.last_subdivision = self.time;
            self.rebuild_grid();
        }
    }

    /// One Laplacian smoothing pass on user request.
    pub fn smooth(&mut self) {
        if self.mesh.vertices.len() >= self.cfg.vertex_cap {
            return;
        }
        smooth(&mut self.mesh);
        self.rebuild_grid();
    }

    // --- telemetry --------------------------------------------------------

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.mesh.faces.len()
    }

    pub fn collision_count(&self) -> u64 {
        self.collision_count
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    // --- render snapshots -------------------------------------------------

    pub fn positions(&self) -> Vec<f32> {
        self.mesh.positions()
    }

    pub fn indices(&self) -> Vec<u32> {
        self.mesh.indices()
    }

    pub fn vertex_colors(&self) -> Vec<[f32; 3]> {
        self.mesh.vertex_colors()
    }
}
