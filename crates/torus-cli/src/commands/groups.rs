use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use torus_placement::{CommGroups, PlacementTable, SequenceGenerator, merge_comm_groups};

pub const COMM_GROUP_FILE: &str = "comm_group.json";

pub fn groups(
    placement: &str,
    input: &str,
    traces: Option<&[String]>,
    output: Option<&str>,
) -> Result<()> {
    let table_json = std::fs::read_to_string(placement)
        .with_context(|| format!("failed to read placement {placement}"))?;
    let table = PlacementTable::from_json(&table_json)
        .with_context(|| format!("invalid placement table {placement}"))?;

    let mut jobs: Vec<String> = match traces {
        Some(list) => list.to_vec(),
        None => table.job_names().map(str::to_string).collect(),
    };
    jobs.sort();
    jobs.dedup();

    let mut loaded = Vec::with_capacity(jobs.len());
    for job in &jobs {
        let path = Path::new(input).join(job).join(COMM_GROUP_FILE);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let groups: CommGroups = serde_json::from_str(&content)
            .with_context(|| format!("invalid comm groups in {}", path.display()))?;
        loaded.push((job.as_str(), groups));
    }

    let mut seq = SequenceGenerator::default();
    let merged = merge_comm_groups(
        &table,
        loaded.iter().map(|(job, groups)| (*job, groups)),
        &mut seq,
    )?;
    let json = serde_json::to_string_pretty(&merged.groups)?;

    match output {
        Some(path) => {
            std::fs::write(path, json + "\n").with_context(|| format!("failed to write {path}"))?;
            info!(output = path, jobs = jobs.len(), groups = merged.groups.len(), "merged comm groups");
        }
        None => println!("{json}"),
    }
    Ok(())
}
