//! Placement orchestrator: runs one policy over a whole job set.
//!
//! A run:
//! 1. Validates total capacity, then block divisibility for block policies
//! 2. Allocates jobs one at a time against a single fresh occupancy grid
//! 3. Merges per-job mappings into a [`PlacementTable`]
//!
//! Any job that cannot be placed fails the whole run; no partial table is
//! returned.

use tracing::{debug, info, warn};
use torus_core::{JobOrder, JobSet, TorusDimensions};
use torus_core::config::PolicyConfig;

use crate::decompose::{validate_blocks, validate_capacity};
use crate::error::{PlacementError, PlacementResult};
use crate::grid::OccupancyGrid;
use crate::policy::{AllocationPolicy, PolicyOptions, policy_for};
use crate::table::PlacementTable;

pub struct Placer {
    dims: TorusDimensions,
    policy: Box<dyn AllocationPolicy>,
    order: JobOrder,
}

impl Placer {
    pub fn new(dims: TorusDimensions, policy: Box<dyn AllocationPolicy>) -> Self {
        Self {
            dims,
            policy,
            order: JobOrder::Name,
        }
    }

    /// Build a placer from the `[placement]` config section.
    pub fn from_config(dims: TorusDimensions, config: &PolicyConfig) -> PlacementResult<Self> {
        let options = PolicyOptions {
            block_size: config.block_size,
            seed: config.seed.unwrap_or(0),
            ..PolicyOptions::default()
        };
        let policy = policy_for(config.policy, &options)?;
        Ok(Self::new(dims, policy).with_order(config.order))
    }

    pub fn with_order(mut self, order: JobOrder) -> Self {
        self.order = order;
        self
    }

    pub fn dims(&self) -> TorusDimensions {
        self.dims
    }

    /// Place every job, or fail without output.
    pub fn run(&mut self, jobs: &JobSet) -> PlacementResult<PlacementTable> {
        let policy = self.policy.kind();
        validate_capacity(jobs, self.dims)?;
        if let Some(block) = self.policy.block_size() {
            validate_blocks(jobs, self.dims, block)?;
        }

        let mut grid = OccupancyGrid::new(self.dims);
        let mut table = PlacementTable::new();

        for entry in jobs.ordered(self.order) {
            let Some(mapping) = self.policy.allocate(&mut grid, entry.shape) else {
                warn!(
                    job = %entry.name,
                    shape = %entry.shape,
                    %policy,
                    free = grid.free_count(),
                    "could not place job"
                );
                return Err(PlacementError::PlacementFailed {
                    job: entry.name.clone(),
                    shape: entry.shape,
                    policy,
                });
            };
            if mapping.len() != entry.shape.volume() {
                return Err(PlacementError::Inconsistent(format!(
                    "policy {policy} returned {} cells for job {} of volume {}",
                    mapping.len(),
                    entry.name,
                    entry.shape.volume()
                )));
            }

            debug!(job = %entry.name, cells = ?mapping.as_slice(), "job mapping");
            info!(
                job = %entry.name,
                shape = %entry.shape,
                %policy,
                cells = mapping.len(),
                free = grid.free_count(),
                "placed job"
            );
            table.insert(&entry.name, mapping)?;
        }

        table.verify(self.dims)?;
        Ok(table)
    }
}

/// One-shot placement of `jobs` on a torus of `dims`.
pub fn compute_placement(
    dims: TorusDimensions,
    jobs: &JobSet,
    config: &PolicyConfig,
) -> PlacementResult<PlacementTable> {
    Placer::from_config(dims, config)?.run(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use torus_core::{JobShape, PolicyKind};

    fn dims(w: usize, l: usize, h: usize) -> TorusDimensions {
        TorusDimensions::new(w, l, h).unwrap()
    }

    fn config(policy: PolicyKind) -> PolicyConfig {
        PolicyConfig {
            policy,
            order: JobOrder::Name,
            block_size: policy.is_block_oriented().then_some(2),
            seed: Some(42),
        }
    }

    fn jobs(list: &[(&str, [usize; 3])]) -> JobSet {
        let mut set = JobSet::new();
        for (name, axes) in list {
            set = set.with_job(name, JobShape::try_from(*axes).unwrap()).unwrap();
        }
        set
    }

    #[test]
    fn two_cubes_first_fit() {
        let set = jobs(&[("A", [2, 2, 2]), ("B", [2, 2, 2])]);
        let table = compute_placement(dims(4, 4, 4), &set, &config(PolicyKind::FirstFit)).unwrap();

        assert_eq!(table.get("A", 0), Some(0));
        assert_eq!(table.job("A").unwrap(), &[0, 1, 4, 5, 16, 17, 20, 21]);
        assert_eq!(table.job("B").unwrap(), &[2, 3, 6, 7, 18, 19, 22, 23]);
        assert_eq!(table.len(), 16);
    }

    #[test]
    fn jobs_visited_by_name_by_default() {
        let set = jobs(&[("B", [1, 1, 1]), ("A", [1, 1, 1])]);
        let table = compute_placement(dims(2, 1, 1), &set, &config(PolicyKind::FirstFit)).unwrap();
        assert_eq!(table.get("A", 0), Some(0));
        assert_eq!(table.get("B", 0), Some(1));
    }

    #[test]
    fn declared_order_is_honored() {
        let set = jobs(&[("B", [1, 1, 1]), ("A", [1, 1, 1])]);
        let mut cfg = config(PolicyKind::FirstFit);
        cfg.order = JobOrder::Declared;
        let table = compute_placement(dims(2, 1, 1), &set, &cfg).unwrap();
        assert_eq!(table.get("B", 0), Some(0));
        assert_eq!(table.get("A", 0), Some(1));
    }

    #[test]
    fn capacity_error_before_allocation() {
        let set = jobs(&[("A", [4, 4, 4]), ("B", [1, 1, 1])]);
        for policy in PolicyKind::ALL {
            let err = compute_placement(dims(4, 4, 4), &set, &config(policy)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Capacity, "{policy}");
        }
    }

    #[test]
    fn huge_job_is_capacity_error_under_every_policy() {
        let set = jobs(&[("A", [usize::MAX / 4, 2, 1]), ("B", [1, 1, 1])]);
        for policy in PolicyKind::ALL {
            let err = compute_placement(dims(4, 4, 4), &set, &config(policy)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Capacity, "{policy}");
        }
    }

    #[test]
    fn placement_failure_names_the_job() {
        // Fits by volume, but A leaves no free 2x2 box for B.
        let set = jobs(&[("A", [2, 1, 1]), ("B", [2, 2, 1])]);
        let err = compute_placement(dims(3, 2, 1), &set, &config(PolicyKind::FirstFit)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Placement);
        assert!(matches!(err, PlacementError::PlacementFailed { ref job, .. } if job == "B"));

        // The curve policy does not need contiguous boxes.
        assert!(compute_placement(dims(3, 2, 1), &set, &config(PolicyKind::SpaceFillingCurve)).is_ok());
    }

    #[test]
    fn block_misalignment_is_configuration_error() {
        let set = jobs(&[("A", [2, 3, 2])]);
        let err = compute_placement(dims(4, 4, 4), &set, &config(PolicyKind::Block)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn missing_block_size_is_configuration_error() {
        let mut cfg = config(PolicyKind::RandomBlock);
        cfg.block_size = None;
        let err = compute_placement(dims(4, 4, 4), &jobs(&[]), &cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn every_policy_covers_full_cube() {
        let set = jobs(&[("J0", [2, 2, 2])]);
        for policy in PolicyKind::ALL {
            let table = compute_placement(dims(2, 2, 2), &set, &config(policy)).unwrap();
            let mut cells: Vec<usize> = table.job("J0").unwrap().to_vec();
            cells.sort_unstable();
            assert_eq!(cells, (0..8).collect::<Vec<_>>(), "{policy}");
        }
    }

    #[test]
    fn empty_job_set_yields_empty_table() {
        let table = compute_placement(dims(2, 2, 2), &jobs(&[]), &config(PolicyKind::L1Clustering)).unwrap();
        assert!(table.is_empty());
    }
}
