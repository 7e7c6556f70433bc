//! Placement error types.

use thiserror::Error;
use torus_core::{DimensionError, JobShape, PolicyKind, TorusDimensions};

/// Broad category of a [`PlacementError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structurally inconsistent input, detected before allocation.
    Configuration,
    /// Jobs ask for more nodes than the torus has, detected before allocation.
    Capacity,
    /// A policy could not place a job given the current occupancy.
    Placement,
}

/// Errors that can occur during a placement run.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("invalid dimensions: {0}")]
    Dimension(#[from] DimensionError),

    #[error("policy {policy} requires a block size")]
    MissingBlockSize { policy: PolicyKind },

    #[error("block size must be positive")]
    ZeroBlockSize,

    #[error("torus {dims} is not divisible by block size {block}")]
    TorusNotDivisible { dims: TorusDimensions, block: usize },

    #[error("job {job} with shape {shape} is not divisible by block size {block}")]
    JobNotDivisible {
        job: String,
        shape: JobShape,
        block: usize,
    },

    #[error("total job nodes ({requested}) exceed torus capacity ({available})")]
    Capacity { requested: usize, available: usize },

    #[error("total job nodes overflow a node index, torus capacity is {available}")]
    CapacityOverflow { available: usize },

    #[error("policy {policy} could not place job {job} with shape {shape}")]
    PlacementFailed {
        job: String,
        shape: JobShape,
        policy: PolicyKind,
    },

    #[error("placement table is inconsistent: {0}")]
    Inconsistent(String),
}

impl PlacementError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlacementError::Capacity { .. } | PlacementError::CapacityOverflow { .. } => {
                ErrorKind::Capacity
            }
            PlacementError::PlacementFailed { .. } | PlacementError::Inconsistent(_) => {
                ErrorKind::Placement
            }
            _ => ErrorKind::Configuration,
        }
    }
}

pub type PlacementResult<T> = Result<T, PlacementError>;
