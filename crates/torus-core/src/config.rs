//! torusplace.toml configuration parser.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{JobOrder, PolicyKind, TorusDimensions};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    pub torus: TorusConfig,
    pub placement: PolicyConfig,
    pub jobs: Option<JobsConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorusConfig {
    pub dims: TorusDimensions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub policy: PolicyKind,
    #[serde(default)]
    pub order: JobOrder,
    /// Edge length of the cubic blocks used by block-oriented policies.
    pub block_size: Option<usize>,
    /// Seed for the random block policy.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Path to a job-spec file, relative to the config file.
    pub spec: Option<String>,
    /// Inline `Name:DxTxP` list.
    pub inline: Option<String>,
    /// Where to write the placement table.
    pub output: Option<String>,
}

impl PlacementConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a minimal torusplace.toml for the given torus and policy.
    pub fn scaffold(dims: TorusDimensions, policy: PolicyKind) -> Self {
        PlacementConfig {
            torus: TorusConfig { dims },
            placement: PolicyConfig {
                policy,
                order: JobOrder::Name,
                block_size: policy.is_block_oriented().then_some(2),
                seed: (policy == PolicyKind::RandomBlock).then_some(0),
            },
            jobs: Some(JobsConfig {
                spec: Some("jobspec.txt".to_string()),
                inline: None,
                output: Some("placement.json".to_string()),
            }),
        }
    }
}
