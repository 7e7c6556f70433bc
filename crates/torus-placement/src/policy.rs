//! The allocation capability shared by every placement policy.

use torus_core::{JobShape, PolicyKind};

use crate::block::BlockPlacement;
use crate::cluster::L1Clustering;
use crate::curve::SpaceFillingCurve;
use crate::error::{PlacementError, PlacementResult};
use crate::first_fit::FirstFit;
use crate::grid::OccupancyGrid;

/// Dense job-local → torus mapping: entry `i` is the torus linear index of
/// job-local node `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementMapping {
    cells: Vec<usize>,
}

impl PlacementMapping {
    pub fn new(cells: Vec<usize>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Torus index assigned to job-local node `local`.
    pub fn get(&self, local: usize) -> Option<usize> {
        self.cells.get(local).copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.cells
    }

    /// (job-local index, torus index) pairs in local-index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().copied().enumerate()
    }

    pub fn into_cells(self) -> Vec<usize> {
        self.cells
    }
}

/// Places one job at a time against a shared occupancy grid.
///
/// A successful `allocate` marks every assigned cell occupied before
/// returning. `None` means the job does not fit the current occupancy;
/// the caller decides whether that is fatal.
pub trait AllocationPolicy {
    fn kind(&self) -> PolicyKind;

    fn allocate(&mut self, grid: &mut OccupancyGrid, shape: JobShape) -> Option<PlacementMapping>;

    /// Edge length of the blocks the policy assigns, for block-oriented policies.
    fn block_size(&self) -> Option<usize> {
        None
    }
}

/// Tunables consumed when building a policy from its selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyOptions {
    pub block_size: Option<usize>,
    pub seed: u64,
    /// Upper bound on sampled centers for L1 clustering.
    pub max_centers: usize,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        Self {
            block_size: None,
            seed: 0,
            max_centers: L1Clustering::DEFAULT_MAX_CENTERS,
        }
    }
}

/// Build the policy named by `kind`.
pub fn policy_for(kind: PolicyKind, options: &PolicyOptions) -> PlacementResult<Box<dyn AllocationPolicy>> {
    let block = || match options.block_size {
        Some(0) => Err(PlacementError::ZeroBlockSize),
        Some(size) => Ok(size),
        None => Err(PlacementError::MissingBlockSize { policy: kind }),
    };

    Ok(match kind {
        PolicyKind::FirstFit => Box::new(FirstFit),
        PolicyKind::SpaceFillingCurve => Box::new(SpaceFillingCurve),
        PolicyKind::L1Clustering => Box::new(L1Clustering::new(options.max_centers)),
        PolicyKind::Block => Box::new(BlockPlacement::sequential(block()?)),
        PolicyKind::RandomBlock => Box::new(BlockPlacement::random(block()?, options.seed)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use torus_core::TorusDimensions;

    #[test]
    fn builds_every_policy() {
        let options = PolicyOptions {
            block_size: Some(2),
            ..PolicyOptions::default()
        };
        for kind in PolicyKind::ALL {
            let policy = policy_for(kind, &options).unwrap();
            assert_eq!(policy.kind(), kind);
            assert_eq!(policy.block_size().is_some(), kind.is_block_oriented());
        }
    }

    #[test]
    fn block_policies_need_a_size() {
        let err = policy_for(PolicyKind::Block, &PolicyOptions::default()).err().unwrap();
        assert!(matches!(err, PlacementError::MissingBlockSize { .. }));

        let zero = PolicyOptions {
            block_size: Some(0),
            ..PolicyOptions::default()
        };
        let err = policy_for(PolicyKind::RandomBlock, &zero).err().unwrap();
        assert!(matches!(err, PlacementError::ZeroBlockSize));
    }

    #[test]
    fn every_policy_fills_a_cube_exactly() {
        let dims = TorusDimensions::new(2, 2, 2).unwrap();
        let shape = JobShape::new(2, 2, 2).unwrap();
        let options = PolicyOptions {
            block_size: Some(2),
            ..PolicyOptions::default()
        };
        for kind in PolicyKind::ALL {
            let mut grid = OccupancyGrid::new(dims);
            let mut policy = policy_for(kind, &options).unwrap();
            let mapping = policy.allocate(&mut grid, shape).unwrap();
            let mut cells = mapping.into_cells();
            cells.sort_unstable();
            assert_eq!(cells, (0..8).collect::<Vec<_>>(), "{kind}");
            assert_eq!(grid.free_count(), 0);
        }
    }
}
