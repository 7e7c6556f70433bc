//! Job-spec reading.
//!
//! Two sources are understood:
//! - a job-spec file, one `Name,label,D,T,P` record per line
//! - an inline list, `Name:DxTxP` entries separated by commas

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{DimensionError, JobOrder, JobShape};

pub type JobSpecResult<T> = Result<T, JobSpecError>;

#[derive(Debug, Error)]
pub enum JobSpecError {
    #[error("failed to read job spec: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: expected 5 columns (Name,label,D,T,P), got '{content}'")]
    Columns { line: usize, content: String },

    #[error("line {line}: {source}")]
    Dimension { line: usize, source: DimensionError },

    #[error("line {line}: job name is empty")]
    EmptyName { line: usize },

    #[error("invalid inline job '{0}', expected Name:DxTxP")]
    InlineEntry(String),

    #[error("duplicate job name: {0}")]
    DuplicateName(String),
}

/// A single named job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEntry {
    pub name: String,
    /// Free-form tag, e.g. `M` for main jobs and `B` for background fill.
    pub label: Option<String>,
    pub shape: JobShape,
}

/// Named jobs in declared order. Names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSet {
    entries: Vec<JobEntry>,
}

impl JobSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: JobEntry) -> JobSpecResult<()> {
        if self.entries.iter().any(|e| e.name == entry.name) {
            return Err(JobSpecError::DuplicateName(entry.name));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Convenience for building sets in code.
    pub fn with_job(mut self, name: &str, shape: JobShape) -> JobSpecResult<Self> {
        self.push(JobEntry {
            name: name.to_string(),
            label: None,
            shape,
        })?;
        Ok(self)
    }

    /// Append every entry of `other`, rejecting name collisions.
    pub fn extend(&mut self, other: JobSet) -> JobSpecResult<()> {
        for entry in other.entries {
            self.push(entry)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&JobEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Sum of all job volumes, or `None` if it does not fit in a `usize`.
    pub fn total_volume(&self) -> Option<usize> {
        self.entries
            .iter()
            .try_fold(0usize, |total, e| total.checked_add(e.shape.volume()))
    }

    /// Entries in the requested visiting order.
    pub fn ordered(&self, order: JobOrder) -> Vec<&JobEntry> {
        let mut entries: Vec<&JobEntry> = self.entries.iter().collect();
        if order == JobOrder::Name {
            entries.sort_by(|a, b| a.name.cmp(&b.name));
        }
        entries
    }
}

/// Parse a job-spec file.
pub fn read_jobspec(path: &Path) -> JobSpecResult<JobSet> {
    let content = std::fs::read_to_string(path)?;
    parse_jobspec(&content)
}

/// Parse job-spec text. Blank lines and `#` comments are skipped.
pub fn parse_jobspec(content: &str) -> JobSpecResult<JobSet> {
    let mut jobs = JobSet::new();
    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if parts.len() != 5 {
            return Err(JobSpecError::Columns {
                line: line_no,
                content: line.to_string(),
            });
        }
        if parts[0].is_empty() {
            return Err(JobSpecError::EmptyName { line: line_no });
        }
        let mut axes = [0usize; 3];
        for (slot, part) in axes.iter_mut().zip(&parts[2..]) {
            *slot = part.parse().map_err(|_| JobSpecError::Dimension {
                line: line_no,
                source: DimensionError::Malformed(parts[2..].join(",")),
            })?;
        }
        let shape = JobShape::try_from(axes).map_err(|source| JobSpecError::Dimension {
            line: line_no,
            source,
        })?;
        let label = Some(parts[1].to_string()).filter(|l| !l.is_empty());
        jobs.push(JobEntry {
            name: parts[0].to_string(),
            label,
            shape,
        })?;
    }
    Ok(jobs)
}

/// Parse an inline `Name:DxTxP,Name:DxTxP` list.
pub fn parse_inline_jobs(spec: &str) -> JobSpecResult<JobSet> {
    let mut jobs = JobSet::new();
    for item in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, shape) = item
            .split_once(':')
            .ok_or_else(|| JobSpecError::InlineEntry(item.to_string()))?;
        if name.trim().is_empty() {
            return Err(JobSpecError::InlineEntry(item.to_string()));
        }
        let shape: JobShape = shape
            .parse()
            .map_err(|_| JobSpecError::InlineEntry(item.to_string()))?;
        jobs.push(JobEntry {
            name: name.trim().to_string(),
            label: None,
            shape,
        })?;
    }
    Ok(jobs)
}
