//! Torus placement engine: maps logically shaped jobs onto a 3D torus.
//!
//! Each job has a (D, T, P) shape. A run assigns every job-local node index
//! to a distinct physical torus node, producing a placement table that trace
//! translation tools consume. Runs are single-threaded: one occupancy grid,
//! mutated by one allocation at a time.
//!
//! # Components
//!
//! - **`grid`**: Occupancy grid and O(1) box-free checks via prefix sums
//! - **`policy`**: The `AllocationPolicy` trait and policy factory
//! - **`first_fit`**: Lexicographically first free bounding box
//! - **`curve`** / **`hilbert`**: Hilbert-order packing of free cells
//! - **`cluster`**: Sampled-center torus L1 clustering
//! - **`block`**: Sequential and seeded-random block assignment
//! - **`decompose`**: Capacity and block-divisibility checks, block carving
//! - **`placer`**: Orchestrates a run over a job set
//! - **`table`**: Merged placement table and its JSON form
//! - **`translate`**: Sequence ids and communication-group merging for consumers

pub mod block;
pub mod cluster;
pub mod curve;
pub mod decompose;
pub mod error;
pub mod first_fit;
pub mod grid;
pub mod hilbert;
pub mod placer;
pub mod policy;
pub mod table;
pub mod translate;

pub use block::BlockPlacement;
pub use cluster::L1Clustering;
pub use curve::SpaceFillingCurve;
pub use error::{ErrorKind, PlacementError, PlacementResult};
pub use first_fit::FirstFit;
pub use grid::{OccupancyGrid, PrefixSums};
pub use hilbert::HilbertCurve;
pub use placer::{Placer, compute_placement};
pub use policy::{AllocationPolicy, PlacementMapping, PolicyOptions, policy_for};
pub use table::{PlacementTable, parse_placement_key, placement_key};
pub use translate::{CommGroups, MergedCommGroups, SequenceGenerator, merge_comm_groups};
