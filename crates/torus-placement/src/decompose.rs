//! Job decomposition: up-front capacity checks and block carving.
//!
//! Both checks run before any allocation, so a run that fails them leaves no
//! trace on the occupancy grid.

use torus_core::{Coord, JobOrder, JobSet, TorusDimensions, linear_index};

use crate::error::{PlacementError, PlacementResult};

/// Fail fast when the jobs together need more nodes than the torus has.
pub fn validate_capacity(jobs: &JobSet, dims: TorusDimensions) -> PlacementResult<()> {
    let available = dims.volume();
    let Some(requested) = jobs.total_volume() else {
        return Err(PlacementError::CapacityOverflow { available });
    };
    if requested > available {
        return Err(PlacementError::Capacity { requested, available });
    }
    Ok(())
}

/// Torus and every job shape must be divisible by `block` on every axis.
pub fn validate_blocks(jobs: &JobSet, dims: TorusDimensions, block: usize) -> PlacementResult<()> {
    if block == 0 {
        return Err(PlacementError::ZeroBlockSize);
    }
    if !divisible(dims.axes(), block) {
        return Err(PlacementError::TorusNotDivisible { dims, block });
    }
    for entry in jobs.ordered(JobOrder::Declared) {
        if !divisible(entry.shape.axes(), block) {
            return Err(PlacementError::JobNotDivisible {
                job: entry.name.clone(),
                shape: entry.shape,
                block,
            });
        }
    }
    Ok(())
}

pub fn divisible(axes: [usize; 3], block: usize) -> bool {
    block > 0 && axes.iter().all(|axis| axis % block == 0)
}

/// Carve an extent into `block`³ cubes.
///
/// Blocks are listed by origin in linear-index order; each block lists its
/// cells' linear indices (within `axes`) in linear-index order. The extent
/// must be divisible by `block`.
pub fn blocks(axes: [usize; 3], block: usize) -> Vec<Vec<usize>> {
    let [w, l, h] = axes;
    let mut out = Vec::with_capacity((w / block) * (l / block) * (h / block));
    for z0 in (0..h).step_by(block) {
        for y0 in (0..l).step_by(block) {
            for x0 in (0..w).step_by(block) {
                let mut cells = Vec::with_capacity(block * block * block);
                for z in z0..z0 + block {
                    for y in y0..y0 + block {
                        for x in x0..x0 + block {
                            cells.push(linear_index(Coord::new(x, y, z), axes));
                        }
                    }
                }
                out.push(cells);
            }
        }
    }
    out
}
