pub mod config;
pub mod coords;
pub mod jobspec;
pub mod types;

pub use config::{ConfigError, PlacementConfig};
pub use coords::{coord_from_linear, linear_index, torus_l1_distance};
pub use jobspec::{JobEntry, JobSet, JobSpecError, JobSpecResult, parse_inline_jobs, parse_jobspec, read_jobspec};
pub use types::*;
