use std::collections::HashMap;

use crate::catalog::{Bounds, Zone};

/// Grid cell size in degrees
const CELL_SIZE: f64 = 0.5;

/// Spatial index over zone bounding boxes using conservative approximation.
/// Each zone's bounding box is indexed into every cell it overlaps,
/// guaranteeing no false negatives while allowing false positives
/// (eliminated by the point-in-polygon or bbox checks downstream).
#[derive(Default)]
pub struct ZoneGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl ZoneGrid {
    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Index zones by position in `zones`. Zones without geometry are skipped.
    pub fn build(zones: &[Zone]) -> Self {
        let mut grid = Self {
            cells: HashMap::new(),
            cell_size: CELL_SIZE,
        };
        for (idx, zone) in zones.iter().enumerate() {
            let Some(bounds) = zone.boundary.bounds() else {
                continue;
            };
            let min_cell = grid.to_cell(bounds.min.x, bounds.min.y);
            let max_cell = grid.to_cell(bounds.max.x, bounds.max.y);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    /// Candidate zones whose bounding box may contain the point
    pub fn query_point(&self, lon: f64, lat: f64) -> &[usize] {
        if self.cells.is_empty() {
            return &[];
        }
        self.cells
            .get(&self.to_cell(lon, lat))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Candidate zones overlapping `bounds`, sorted and deduplicated
    pub fn query_bounds(&self, bounds: &Bounds) -> Vec<usize> {
        if self.cells.is_empty() {
            return Vec::new();
        }
        let min_cell = self.to_cell(bounds.min.x, bounds.min.y);
        let max_cell = self.to_cell(bounds.max.x, bounds.max.y);
        let mut results = Vec::new();
        // Large views touch fewer cells than there are map entries; walk the map instead
        let span = (max_cell.0 - min_cell.0 + 1) as i64 * (max_cell.1 - min_cell.1 + 1) as i64;
        if span > self.cells.len() as i64 {
            for (&(x, y), indices) in &self.cells {
                if (min_cell.0..=max_cell.0).contains(&x) && (min_cell.1..=max_cell.1).contains(&y) {
                    results.extend_from_slice(indices);
                }
            }
        } else {
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    if let Some(indices) = self.cells.get(&(x, y)) {
                        results.extend_from_slice(indices);
                    }
                }
            }
        }
        results.sort_unstable();
        results.dedup();
        results
    }
}
