/// Global configuration for the growth engine.
///
/// All fields are plain scalars fed in from the host UI. Values are only
/// validated by clamping ([`Config::clamped`]); out-of-range input is
/// pulled back into a usable range rather than rejected.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Cells per side of the initial planar grid.
    pub resolution: usize,
    /// Physical side length of the initial grid.
    pub size: f32,
    /// Narrow-phase distance below which geometry is considered colliding.
    pub collision_threshold: f32,
    /// Multiplier applied to the host frame `dt`.
    pub growth_speed: f32,
    /// Budget of narrow-phase proximity tests per step.
    pub collision_checks: usize,
    /// Side length of a spatial grid cell.
    pub cell_size: f32,
    /// Hard vertex ceiling; exceeding it triggers a full mesh reset.
    pub vertex_cap: usize,
    /// Seed for the simulation RNG (jitter, fallback directions).
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolution: 10,
            size: 5.0,
            collision_threshold: 0.15,
            growth_speed: 1.0,
            collision_checks: 2000,
            cell_size: 0.5,
            vertex_cap: 3000,
            seed: 42,
        }
    }
}

impl Config {
    /// Returns a copy with every field clamped into its usable range.
    ///
    /// The resolution is implicitly bounded by the vertex cap: an
    /// `n`-cell grid starts with `(n + 1)^2` vertices.
    pub fn clamped(self) -> Self {
        let cap = self.vertex_cap.max(9);
        let max_res = (cap as f32).sqrt() as usize - 1;
        Self {
            resolution: self.resolution.clamp(1, max_res.max(1)),
            size: self.size.clamp(0.1, 100.0),
            collision_threshold: self.collision_threshold.clamp(0.001, 2.0),
            growth_speed: self.growth_speed.clamp(0.0, 10.0),
            collision_checks: self.collision_checks.max(1),
            cell_size: self.cell_size.clamp(0.01, 10.0),
            vertex_cap: cap,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_already_clamped() {
        let cfg = Config::default();
        let clamped = cfg.clamped();
        assert_eq!(cfg.resolution, clamped.resolution);
        assert_eq!(cfg.vertex_cap, clamped.vertex_cap);
    }

    #[test]
    fn resolution_is_bounded_by_vertex_cap() {
        let cfg = Config {
            resolution: 1000,
            vertex_cap: 100,
            ..Config::default()
        }
        .clamped();

        // A 100-vertex cap admits at most a 9x9-cell grid (10^2 vertices).
        assert!((cfg.resolution + 1) * (cfg.resolution + 1) <= 100);
    }

    #[test]
    fn zero_values_are_pulled_into_range() {
        let cfg = Config {
            resolution: 0,
            size: 0.0,
            collision_threshold: 0.0,
            collision_checks: 0,
            cell_size: 0.0,
            ..Config::default()
        }
        .clamped();

        assert!(cfg.resolution >= 1);
        assert!(cfg.size > 0.0);
        assert!(cfg.collision_threshold > 0.0);
        assert!(cfg.collision_checks >= 1);
        assert!(cfg.cell_size > 0.0);
    }
}
