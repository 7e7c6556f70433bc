//! Helpers for consumers that rewrite per-job traces with physical node ids.

use std::collections::BTreeMap;

use crate::error::{PlacementError, PlacementResult};
use crate::table::{PlacementTable, placement_key};

/// Monotonically increasing id source. Not thread-safe; owned by the caller.
#[derive(Debug, Clone, Default)]
pub struct SequenceGenerator {
    next: u64,
}

impl SequenceGenerator {
    pub fn starting_at(start: u64) -> Self {
        Self { next: start }
    }

    /// Return the current value and advance.
    pub fn fetch(&mut self) -> u64 {
        let value = self.next;
        self.next += 1;
        value
    }

    pub fn peek(&self) -> u64 {
        self.next
    }
}

/// One job's communication groups: local group id → job-local member ids.
pub type CommGroups = BTreeMap<String, Vec<usize>>;

/// Communication groups of several jobs merged into one id space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedCommGroups {
    /// Global group id → physical member ids.
    pub groups: BTreeMap<u64, Vec<usize>>,
    /// Job → (local group id → global group id).
    pub translations: BTreeMap<String, BTreeMap<String, u64>>,
}

/// Order local group ids numerically when they are numbers, lexically otherwise.
fn group_order(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Give every job's groups fresh global ids from `seq` and rewrite their
/// members to torus indices. Jobs are visited in the order given.
pub fn merge_comm_groups<'a, I>(
    table: &PlacementTable,
    jobs: I,
    seq: &mut SequenceGenerator,
) -> PlacementResult<MergedCommGroups>
where
    I: IntoIterator<Item = (&'a str, &'a CommGroups)>,
{
    let mut staged = Vec::new();
    for (job, groups) in jobs {
        let mut local_ids: Vec<&String> = groups.keys().collect();
        local_ids.sort_by(|a, b| group_order(a, b));

        let mut resolved = Vec::with_capacity(local_ids.len());
        for local_id in local_ids {
            let members = groups[local_id]
                .iter()
                .map(|&local| {
                    table.get(job, local).ok_or_else(|| {
                        PlacementError::Inconsistent(format!(
                            "{} is not in the placement table",
                            placement_key(job, local)
                        ))
                    })
                })
                .collect::<PlacementResult<Vec<usize>>>()?;
            resolved.push((local_id, members));
        }
        staged.push((job, resolved));
    }

    // Ids are only drawn once every member has resolved.
    let mut merged = MergedCommGroups::default();
    for (job, resolved) in staged {
        let translation = merged.translations.entry(job.to_string()).or_default();
        for (local_id, members) in resolved {
            let global_id = seq.fetch();
            translation.insert(local_id.clone(), global_id);
            merged.groups.insert(global_id, members);
        }
    }
    Ok(merged)
}
