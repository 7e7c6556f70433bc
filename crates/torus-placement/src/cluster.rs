//! L1 clustering: pick the free cells closest to a sampled center.
//!
//! For each sampled center the `k` free cells with the smallest torus L1
//! distance are found by partial selection; the center with the lowest total
//! distance wins, ties going to the center sampled first.

use tracing::debug;
use torus_core::{Coord, JobShape, PolicyKind, coord_from_linear, torus_l1_distance};

use crate::grid::OccupancyGrid;
use crate::policy::{AllocationPolicy, PlacementMapping};

#[derive(Debug, Clone, Copy)]
pub struct L1Clustering {
    max_centers: usize,
}

impl Default for L1Clustering {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_CENTERS)
    }
}

impl L1Clustering {
    pub const DEFAULT_MAX_CENTERS: usize = 100;

    pub fn new(max_centers: usize) -> Self {
        Self {
            max_centers: max_centers.max(1),
        }
    }

    /// Stride over the free list so that roughly `max_centers` centers are tried.
    pub fn sampling_step(&self, free: usize) -> usize {
        (free / self.max_centers).max(1)
    }

    /// Select `k` cells out of `free` (ascending torus indices). Returns the
    /// chosen indices sorted ascending and their total distance to the center.
    pub fn select(&self, axes: [usize; 3], free: &[usize], k: usize) -> Option<(Vec<usize>, usize)> {
        if k == 0 || free.len() < k {
            return None;
        }
        let coords: Vec<Coord> = free.iter().map(|&i| coord_from_linear(i, axes)).collect();
        let step = self.sampling_step(free.len());

        let mut best: Option<(usize, Vec<usize>)> = None;
        let mut scratch: Vec<(usize, usize)> = Vec::with_capacity(free.len());

        for center in coords.iter().step_by(step) {
            scratch.clear();
            scratch.extend(
                coords
                    .iter()
                    .zip(free)
                    .map(|(&c, &index)| (torus_l1_distance(axes, *center, c), index)),
            );
            // (distance, index) keys are unique, so the k smallest are well defined.
            if k < scratch.len() {
                scratch.select_nth_unstable(k - 1);
            }
            let cost: usize = scratch[..k].iter().map(|&(d, _)| d).sum();

            if best.as_ref().is_none_or(|(best_cost, _)| cost < *best_cost) {
                debug!(%center, cost, "new best L1 center");
                best = Some((cost, scratch[..k].iter().map(|&(_, i)| i).collect()));
            }
        }

        best.map(|(cost, mut cells)| {
            cells.sort_unstable();
            (cells, cost)
        })
    }
}

impl AllocationPolicy for L1Clustering {
    fn kind(&self) -> PolicyKind {
        PolicyKind::L1Clustering
    }

    fn allocate(&mut self, grid: &mut OccupancyGrid, shape: JobShape) -> Option<PlacementMapping> {
        let free = grid.free_cell_indices();
        let (cells, cost) = self.select(grid.dims().axes(), &free, shape.volume())?;
        debug!(%shape, cost, "L1 clustering selection");

        grid.mark_indices_occupied(cells.iter().copied());
        Some(PlacementMapping::new(cells))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use torus_core::TorusDimensions;

    fn grid(w: usize, l: usize, h: usize) -> OccupancyGrid {
        OccupancyGrid::new(TorusDimensions::new(w, l, h).unwrap())
    }

    #[test]
    fn sampling_is_bounded() {
        let policy = L1Clustering::default();
        assert_eq!(policy.sampling_step(64), 1);
        assert_eq!(policy.sampling_step(512), 5);
        assert_eq!(L1Clustering::new(10).sampling_step(100), 10);
        assert_eq!(L1Clustering::new(0).sampling_step(7), 7);
    }

    #[test]
    fn single_node_job_takes_first_center() {
        let mut grid = grid(4, 4, 4);
        let mapping = L1Clustering::default()
            .allocate(&mut grid, JobShape::new(1, 1, 1).unwrap())
            .unwrap();
        // Every center costs zero; the first sampled one wins.
        assert_eq!(mapping.as_slice(), &[0]);
    }

    #[test]
    fn takes_every_free_cell_when_k_equals_free() {
        for max_centers in [1, 3, 100] {
            let mut grid = grid(4, 4, 2);
            grid.mark_occupied([Coord::new(1, 1, 0), Coord::new(3, 0, 1), Coord::new(0, 3, 1)]);
            let free = grid.free_cell_indices();
            let mapping = L1Clustering::new(max_centers)
                .allocate(&mut grid, JobShape::new(29, 1, 1).unwrap())
                .unwrap();
            assert_eq!(mapping.as_slice(), free.as_slice());
            assert_eq!(grid.free_count(), 0);
        }
    }

    #[test]
    fn selection_is_compact_and_sorted() {
        let mut grid = grid(8, 8, 8);
        let mapping = L1Clustering::default()
            .allocate(&mut grid, JobShape::new(7, 1, 1).unwrap())
            .unwrap();
        let cells = mapping.as_slice();
        assert!(cells.windows(2).all(|w| w[0] < w[1]));

        // Seven cells around a center: the center plus its six neighbours.
        let axes = [8, 8, 8];
        let coords: Vec<Coord> = cells.iter().map(|&i| coord_from_linear(i, axes)).collect();
        let total: usize = coords
            .iter()
            .map(|&c| torus_l1_distance(axes, coords[0], c))
            .sum();
        assert!(total <= 6 * 2, "selection too spread out: {coords:?}");
    }

    #[test]
    fn wraps_around_edges() {
        // Only the two ends of the x axis are free; they are neighbours on the torus.
        let mut grid = grid(6, 1, 1);
        grid.mark_occupied((1..5).map(|x| Coord::new(x, 0, 0)));
        let (cells, cost) = L1Clustering::default()
            .select([6, 1, 1], &grid.free_cell_indices(), 2)
            .unwrap();
        assert_eq!(cells, vec![0, 5]);
        assert_eq!(cost, 1);
    }

    #[test]
    fn equal_distances_prefer_lower_index() {
        let axes = [5, 1, 1];
        let free: Vec<usize> = (0..5).collect();
        // Center 0 picks itself plus one of its equidistant neighbours 1 and 4.
        let (cells, _) = L1Clustering::default().select(axes, &free, 2).unwrap();
        assert_eq!(cells, vec![0, 1]);
    }

    #[test]
    fn fails_without_enough_free_cells() {
        let mut grid = grid(2, 2, 2);
        grid.mark_occupied([Coord::new(0, 0, 0)]);
        assert!(L1Clustering::default()
            .allocate(&mut grid, JobShape::new(2, 2, 2).unwrap())
            .is_none());
    }
}
