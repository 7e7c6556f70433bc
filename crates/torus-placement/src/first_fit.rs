//! First-fit placement of axis-aligned boxes.
//!
//! The job's (D, T, P) axes span physical (X, Y, Z). Origins are scanned with
//! `z` outermost and `x` innermost, so the first free box found is the one
//! with the smallest linear origin. Boxes do not wrap around the torus edges.

use tracing::debug;
use torus_core::{Coord, JobShape, PolicyKind, linear_index};

use crate::grid::{OccupancyGrid, PrefixSums};
use crate::policy::{AllocationPolicy, PlacementMapping};

#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFit;

impl FirstFit {
    /// First origin whose `extent` box is entirely free.
    pub fn find_origin(sums: &PrefixSums, dims: [usize; 3], extent: [usize; 3]) -> Option<Coord> {
        let [w, l, h] = dims;
        let [a, b, c] = extent;
        let (max_x, max_y, max_z) = (w.checked_sub(a)?, l.checked_sub(b)?, h.checked_sub(c)?);

        for z in 0..=max_z {
            for y in 0..=max_y {
                for x in 0..=max_x {
                    let origin = Coord::new(x, y, z);
                    if sums.is_region_free(origin, extent) {
                        return Some(origin);
                    }
                }
            }
        }
        None
    }
}

impl AllocationPolicy for FirstFit {
    fn kind(&self) -> PolicyKind {
        PolicyKind::FirstFit
    }

    fn allocate(&mut self, grid: &mut OccupancyGrid, shape: JobShape) -> Option<PlacementMapping> {
        let dims = grid.dims().axes();
        let extent = shape.axes();
        let sums = grid.prefix_sums();
        let origin = Self::find_origin(&sums, dims, extent)?;
        debug!(%origin, %shape, "first-fit origin");

        let [a, b, c] = extent;
        let mut cells = vec![0usize; shape.volume()];
        let mut covered = Vec::with_capacity(cells.len());
        for dz in 0..c {
            for dy in 0..b {
                for dx in 0..a {
                    let local = Coord::new(dx, dy, dz);
                    let physical = origin.offset(local);
                    cells[linear_index(local, extent)] = linear_index(physical, dims);
                    covered.push(physical);
                }
            }
        }
        grid.mark_occupied(covered);

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

    fn shape(d: usize, t: usize, p: usize) -> JobShape {
        JobShape::new(d, t, p).unwrap()
    }

    #[test]
    fn first_job_starts_at_origin() {
        let mut grid = grid(4, 4, 4);
        let mapping = FirstFit.allocate(&mut grid, shape(2, 2, 2)).unwrap();

        assert_eq!(mapping.get(0), Some(0));
        assert_eq!(
            mapping.as_slice(),
            &[0, 1, 4, 5, 16, 17, 20, 21],
            "2x2x2 block from (0,0,0) in plane-major order"
        );
        assert_eq!(grid.occupied_count(), 8);
    }

    #[test]
    fn second_job_takes_next_origin_in_scan_order() {
        let mut grid = grid(4, 4, 4);
        let a = FirstFit.allocate(&mut grid, shape(2, 2, 2)).unwrap();
        let b = FirstFit.allocate(&mut grid, shape(2, 2, 2)).unwrap();

        // Next free origin scanning x fastest is (2, 0, 0).
        assert_eq!(b.as_slice(), &[2, 3, 6, 7, 18, 19, 22, 23]);
        assert!(a.as_slice().iter().all(|cell| !b.as_slice().contains(cell)));
    }

    #[test]
    fn local_axes_follow_job_shape() {
        let mut grid = grid(4, 4, 1);
        let mapping = FirstFit.allocate(&mut grid, shape(3, 2, 1)).unwrap();
        // Local index 3 is local (0, 1, 0) -> physical (0, 1, 0) -> 4.
        assert_eq!(mapping.as_slice(), &[0, 1, 2, 4, 5, 6]);
    }

    #[test]
    fn skips_occupied_cells() {
        let mut grid = grid(4, 4, 4);
        grid.mark_occupied([Coord::new(1, 0, 0)]);
        let mapping = FirstFit.allocate(&mut grid, shape(2, 1, 1)).unwrap();
        assert_eq!(mapping.as_slice(), &[2, 3]);
    }

    #[test]
    fn fails_when_box_larger_than_torus() {
        let mut grid = grid(4, 4, 4);
        assert!(FirstFit.allocate(&mut grid, shape(5, 1, 1)).is_none());
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn fails_on_fragmented_space() {
        // 14 free cells, but every 2x2x2 box touches an occupied one.
        let mut grid = grid(4, 2, 2);
        grid.mark_occupied([Coord::new(1, 0, 0), Coord::new(2, 1, 1)]);
        assert!(FirstFit.allocate(&mut grid, shape(2, 2, 2)).is_none());
        assert_eq!(grid.occupied_count(), 2);
    }
}
