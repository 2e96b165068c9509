//! Uniform spatial hash grid for broad-phase collision queries.
//!
//! Positions are quantized to integer cell coordinates with
//! `floor(position / cell_size)`. Each cell holds the typed items whose
//! representative point (edge midpoint or face centroid) falls inside it.
//! There is no deletion API: the grid is rebuilt wholesale every frame
//! from current geometry, which keeps it trivially free of stale entries.

use crate::types::{EdgeId, FaceId};
use glam::Vec3;
use hashbrown::HashMap;

/// A typed reference stored in a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridItem {
    Edge(EdgeId),
    Face(FaceId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpatialGrid {
    cells: HashMap<(i32, i32, i32), Vec<GridItem>>,
    cell_size: f32,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size,
        }
    }

    #[inline]
    fn cell_coords(&self, p: Vec3) -> (i32, i32, i32) {
        let discretize = |v: f32| (v / self.cell_size).floor() as i32;
        (discretize(p.x), discretize(p.y), discretize(p.z))
    }

    /// Buckets `item` under the cell containing `pos`.
    pub fn insert(&mut self, item: GridItem, pos: Vec3) {
        self.cells.entry(self.cell_coords(pos)).or_default().push(item);
    }

    /// All items in cells within `ceil(radius / cell_size)` cells of the
    /// cell containing `pos`.
    pub fn query(&self, pos: Vec3, radius: f32) -> Vec<GridItem> {
        let reach = (radius / self.cell_size).ceil() as i32;
        let (cx, cy, cz) = self.cell_coords(pos);

        let mut out = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    if let Some(items) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) {
                        out.extend_from_slice(items);
                    }
                }
            }
        }
        out
    }

    /// Clears all buckets, keeping the cell size.
    pub fn reset(&mut self) {
        self.cells.clear();
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }
}
