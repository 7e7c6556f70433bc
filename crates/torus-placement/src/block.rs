//! Block-to-block assignment.
//!
//! The torus and each job are carved into `block`³ cubes. Every job block is
//! mapped onto one free torus block, cell `i` of the job block landing on cell
//! `i` of the torus block. The sequential variant always takes the first free
//! torus block; the random variant draws one from a seeded PCG stream.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tracing::{debug, warn};
use torus_core::{JobShape, PolicyKind};

use crate::decompose::{blocks, divisible};
use crate::grid::OccupancyGrid;
use crate::policy::{AllocationPolicy, PlacementMapping};

#[derive(Debug, Clone)]
pub struct BlockPlacement {
    block: usize,
    rng: Option<Pcg64>,
}

impl BlockPlacement {
    pub fn sequential(block: usize) -> Self {
        Self { block, rng: None }
    }

    pub fn random(block: usize, seed: u64) -> Self {
        Self {
            block,
            rng: Some(Pcg64::seed_from_u64(seed)),
        }
    }

    fn pick(&mut self, available: usize) -> usize {
        match self.rng.as_mut() {
            Some(rng) => rng.gen_range(0..available),
            None => 0,
        }
    }
}

impl AllocationPolicy for BlockPlacement {
    fn kind(&self) -> PolicyKind {
        if self.rng.is_some() {
            PolicyKind::RandomBlock
        } else {
            PolicyKind::Block
        }
    }

    fn block_size(&self) -> Option<usize> {
        Some(self.block)
    }

    fn allocate(&mut self, grid: &mut OccupancyGrid, shape: JobShape) -> Option<PlacementMapping> {
        let axes = grid.dims().axes();
        if !divisible(axes, self.block) || !divisible(shape.axes(), self.block) {
            warn!(%shape, block = self.block, "shape not divisible into blocks");
            return None;
        }

        let mut available: Vec<Vec<usize>> = blocks(axes, self.block)
            .into_iter()
            .filter(|cells| cells.iter().all(|&c| !grid.is_index_occupied(c)))
            .collect();
        let job_blocks = blocks(shape.axes(), self.block);
        if available.len() < job_blocks.len() {
            return None;
        }

        let mut cells = vec![0usize; shape.volume()];
        for job_block in &job_blocks {
            let torus_block = available.remove(self.pick(available.len()));
            debug!(first = torus_block[0], "assigned torus block");
            for (&local, &physical) in job_block.iter().zip(&torus_block) {
                cells[local] = physical;
            }
        }

        grid.mark_indices_occupied(cells.iter().copied());
        Some(PlacementMapping::new(cells))
    }
}
