//! Occupancy state of the physical torus.
//!
//! Cells are stored in plane-major linear-index order. A cell only ever goes
//! from free to occupied within a run.

use torus_core::{Coord, TorusDimensions, coord_from_linear, linear_index};

/// Free/occupied state for every torus coordinate.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    dims: TorusDimensions,
    cells: Vec<bool>,
    occupied: usize,
}

impl OccupancyGrid {
    /// A grid with every cell free.
    pub fn new(dims: TorusDimensions) -> Self {
        Self {
            dims,
            cells: vec![false; dims.volume()],
            occupied: 0,
        }
    }

    pub fn dims(&self) -> TorusDimensions {
        self.dims
    }

    pub fn is_occupied(&self, coord: Coord) -> bool {
        self.is_index_occupied(linear_index(coord, self.dims.axes()))
    }

    pub fn is_index_occupied(&self, index: usize) -> bool {
        self.cells[index]
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied
    }

    pub fn free_count(&self) -> usize {
        self.cells.len() - self.occupied
    }

    /// Mark every given coordinate occupied. Already-occupied cells are left as is.
    pub fn mark_occupied<I>(&mut self, coords: I)
    where
        I: IntoIterator<Item = Coord>,
    {
        let axes = self.dims.axes();
        for coord in coords {
            let index = linear_index(coord, axes);
            if !self.cells[index] {
                self.cells[index] = true;
                self.occupied += 1;
            }
        }
    }

    /// Mark cells occupied by torus linear index.
    pub fn mark_indices_occupied<I>(&mut self, indices: I)
    where
        I: IntoIterator<Item = usize>,
    {
        let axes = self.dims.axes();
        self.mark_occupied(indices.into_iter().map(|i| coord_from_linear(i, axes)));
    }

    /// Torus linear indices of all free cells, ascending.
    pub fn free_cell_indices(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, &occupied)| (!occupied).then_some(i))
            .collect()
    }

    /// Build the summed-volume table for the current occupancy. O(N).
    pub fn prefix_sums(&self) -> PrefixSums {
        PrefixSums::build(self)
    }

    /// Whether the axis-aligned box at `origin` spanning `extent` is inside the
    /// grid and entirely free. Builds a fresh [`PrefixSums`]; prefer reusing one
    /// when checking many boxes against the same occupancy.
    pub fn is_region_free(&self, origin: Coord, extent: [usize; 3]) -> bool {
        self.prefix_sums().is_region_free(origin, extent)
    }
}

/// 3D prefix sums over occupancy: `sums[x,y,z]` counts occupied cells in
/// `[0..=x] × [0..=y] × [0..=z]`.
#[derive(Debug, Clone)]
pub struct PrefixSums {
    axes: [usize; 3],
    sums: Vec<u32>,
}

impl PrefixSums {
    fn build(grid: &OccupancyGrid) -> Self {
        let axes = grid.dims.axes();
        let [w, l, h] = axes;
        let mut sums: Vec<u32> = grid.cells.iter().map(|&o| u32::from(o)).collect();

        // Cumulate along x, then y, then z.
        for z in 0..h {
            for y in 0..l {
                for x in 1..w {
                    let i = linear_index(Coord::new(x, y, z), axes);
                    sums[i] += sums[i - 1];
                }
            }
        }
        for z in 0..h {
            for y in 1..l {
                for x in 0..w {
                    let i = linear_index(Coord::new(x, y, z), axes);
                    sums[i] += sums[i - w];
                }
            }
        }
        for z in 1..h {
            for y in 0..l {
                for x in 0..w {
                    let i = linear_index(Coord::new(x, y, z), axes);
                    sums[i] += sums[i - w * l];
                }
            }
        }

        Self { axes, sums }
    }

    /// Prefix value at signed coordinates; any negative index contributes zero.
    fn at(&self, x: isize, y: isize, z: isize) -> i64 {
        if x < 0 || y < 0 || z < 0 {
            return 0;
        }
        let coord = Coord::new(x as usize, y as usize, z as usize);
        i64::from(self.sums[linear_index(coord, self.axes)])
    }

    /// Occupied cells inside the box, by inclusion–exclusion over its eight corners.
    pub fn occupied_in(&self, origin: Coord, extent: [usize; 3]) -> i64 {
        let (x0, y0, z0) = (origin.x as isize - 1, origin.y as isize - 1, origin.z as isize - 1);
        let x1 = (origin.x + extent[0]) as isize - 1;
        let y1 = (origin.y + extent[1]) as isize - 1;
        let z1 = (origin.z + extent[2]) as isize - 1;

        self.at(x1, y1, z1) - self.at(x0, y1, z1) - self.at(x1, y0, z1) - self.at(x1, y1, z0)
            + self.at(x0, y0, z1)
            + self.at(x0, y1, z0)
            + self.at(x1, y0, z0)
            - self.at(x0, y0, z0)
    }

    /// O(1) check that a box lies within the grid and holds no occupied cell.
    pub fn is_region_free(&self, origin: Coord, extent: [usize; 3]) -> bool {
        let fits = origin
            .axes()
            .into_iter()
            .zip(extent)
            .zip(self.axes)
            .all(|((start, len), size)| len > 0 && start + len <= size);
        fits && self.occupied_in(origin, extent) == 0
    }
}
