//! The merged placement table and its JSON form.
//!
//! Serialized as a flat object `{"<job>-<local>": <torus index>}` with entries
//! ordered by job name, then numeric local index.

use std::collections::{BTreeMap, HashMap};

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use torus_core::TorusDimensions;

use crate::error::{PlacementError, PlacementResult};
use crate::policy::PlacementMapping;

/// Composite key used by downstream consumers.
pub fn placement_key(job: &str, local: usize) -> String {
    format!("{job}-{local}")
}

/// Split a composite key at its last dash.
pub fn parse_placement_key(key: &str) -> Option<(&str, usize)> {
    let (job, local) = key.rsplit_once('-')?;
    if job.is_empty() {
        return None;
    }
    Some((job, local.parse().ok()?))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementTable {
    jobs: BTreeMap<String, Vec<usize>>,
}

impl PlacementTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one job's mapping. Each job may be merged once.
    pub fn insert(&mut self, job: &str, mapping: PlacementMapping) -> PlacementResult<()> {
        if self.jobs.contains_key(job) {
            return Err(PlacementError::Inconsistent(format!("job {job} merged twice")));
        }
        self.jobs.insert(job.to_string(), mapping.into_cells());
        Ok(())
    }

    /// Torus index of `job`'s local node `local`.
    pub fn get(&self, job: &str, local: usize) -> Option<usize> {
        self.jobs.get(job)?.get(local).copied()
    }

    /// Look up a composite `job-local` key.
    pub fn get_key(&self, key: &str) -> Option<usize> {
        let (job, local) = parse_placement_key(key)?;
        self.get(job, local)
    }

    /// All cells of one job in local-index order.
    pub fn job(&self, job: &str) -> Option<&[usize]> {
        self.jobs.get(job).map(Vec::as_slice)
    }

    pub fn job_names(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Total number of placed nodes.
    pub fn len(&self) -> usize {
        self.jobs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (job, local index, torus index) in output order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize, usize)> {
        self.jobs
            .iter()
            .flat_map(|(job, cells)| cells.iter().enumerate().map(move |(local, &t)| (job.as_str(), local, t)))
    }

    /// Every torus index is in range and used at most once across all jobs.
    pub fn verify(&self, dims: TorusDimensions) -> PlacementResult<()> {
        let volume = dims.volume();
        let mut owner: Vec<Option<(&str, usize)>> = vec![None; volume];
        for (job, local, cell) in self.iter() {
            if cell >= volume {
                return Err(PlacementError::Inconsistent(format!(
                    "{} maps to {cell}, outside torus of {volume} nodes",
                    placement_key(job, local)
                )));
            }
            if let Some((other, other_local)) = owner[cell] {
                return Err(PlacementError::Inconsistent(format!(
                    "{} and {} both map to {cell}",
                    placement_key(other, other_local),
                    placement_key(job, local)
                )));
            }
            owner[cell] = Some((job, local));
        }
        Ok(())
    }

    /// Rebuild a table from flat `(key, torus index)` entries. Every job's
    /// local indices must be dense from zero.
    pub fn from_entries<I>(entries: I) -> PlacementResult<Self>
    where
        I: IntoIterator<Item = (String, usize)>,
    {
        let mut grouped: BTreeMap<String, BTreeMap<usize, usize>> = BTreeMap::new();
        for (key, cell) in entries {
            let (job, local) = parse_placement_key(&key)
                .ok_or_else(|| PlacementError::Inconsistent(format!("malformed key '{key}'")))?;
            grouped.entry(job.to_string()).or_default().insert(local, cell);
        }

        let mut jobs = BTreeMap::new();
        for (job, locals) in grouped {
            if locals.keys().copied().ne(0..locals.len()) {
                return Err(PlacementError::Inconsistent(format!(
                    "job {job} local indices are not dense from 0"
                )));
            }
            jobs.insert(job, locals.into_values().collect());
        }
        Ok(Self { jobs })
    }

    /// Pretty JSON with four-space indentation.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        // serde_json only emits valid UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Serialize for PlacementTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (job, local, cell) in self.iter() {
            map.serialize_entry(&placement_key(job, local), &cell)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PlacementTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: HashMap<String, usize> = HashMap::deserialize(deserializer)?;
        Self::from_entries(raw).map_err(serde::de::Error::custom)
    }
}
