//! Space-filling-curve packing: a job takes the first free cells in Hilbert order.

use tracing::debug;
use torus_core::{JobShape, PolicyKind, coord_from_linear};

use crate::grid::OccupancyGrid;
use crate::hilbert::HilbertCurve;
use crate::policy::{AllocationPolicy, PlacementMapping};

#[derive(Debug, Clone, Copy, Default)]
pub struct SpaceFillingCurve;

impl SpaceFillingCurve {
    /// Free torus cells sorted by Hilbert distance.
    pub fn free_cells_in_curve_order(grid: &OccupancyGrid) -> Vec<usize> {
        let axes = grid.dims().axes();
        let curve = HilbertCurve::covering(axes);
        let mut ranked: Vec<(u64, usize)> = grid
            .free_cell_indices()
            .into_iter()
            .map(|index| {
                let c = coord_from_linear(index, axes);
                let point = [c.x as u64, c.y as u64, c.z as u64];
                (curve.distance_from_point(&point), index)
            })
            .collect();
        ranked.sort_unstable();
        ranked.into_iter().map(|(_, index)| index).collect()
    }
}

impl AllocationPolicy for SpaceFillingCurve {
    fn kind(&self) -> PolicyKind {
        PolicyKind::SpaceFillingCurve
    }

    fn allocate(&mut self, grid: &mut OccupancyGrid, shape: JobShape) -> Option<PlacementMapping> {
        let needed = shape.volume();
        let mut cells = Self::free_cells_in_curve_order(grid);
        if cells.len() < needed {
            return None;
        }
        cells.truncate(needed);
        debug!(%shape, first = ?cells.first(), "hilbert allocation");

        grid.mark_indices_occupied(cells.iter().copied());
        Some(PlacementMapping::new(cells))
    }
}
