//! `torusplace place`: compute and write a placement table.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::info;
use torus_core::config::PolicyConfig;
use torus_core::{JobOrder, JobSet, PlacementConfig, PolicyKind, TorusDimensions};
use torus_placement::{PlacementTable, Placer};

#[derive(Debug, Clone, Default, Args)]
pub struct PlaceArgs {
    /// torusplace.toml to read defaults from
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Torus dimensions, WxLxH
    #[arg(short, long)]
    pub dims: Option<String>,
    /// first-fit, space-filling-curve, l1-clustering, block or random-block
    #[arg(short, long)]
    pub policy: Option<String>,
    /// Job-spec file (Name,label,D,T,P per line)
    #[arg(long)]
    pub jobspec: Option<PathBuf>,
    /// Inline jobs, Name:DxTxP comma separated
    #[arg(short = 'J', long)]
    pub jobs: Option<String>,
    /// Block edge length for block policies
    #[arg(short, long)]
    pub block_size: Option<usize>,
    /// Seed for random-block
    #[arg(long)]
    pub seed: Option<u64>,
    /// Job visiting order: name or declared
    #[arg(long)]
    pub order: Option<String>,
    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Everything a run needs, after merging config file and flags.
#[derive(Debug)]
pub struct ResolvedRun {
    pub dims: TorusDimensions,
    pub policy: PolicyConfig,
    pub jobs: JobSet,
    pub output: Option<PathBuf>,
}

pub fn resolve(args: &PlaceArgs) -> Result<ResolvedRun> {
    let config = args
        .config
        .as_deref()
        .map(PlacementConfig::from_file)
        .transpose()?;
    let base_dir = args
        .config
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let dims = match (&args.dims, &config) {
        (Some(dims), _) => dims.parse()?,
        (None, Some(config)) => config.torus.dims,
        (None, None) => bail!("torus dimensions required: pass --dims or --config"),
    };

    let mut policy = config
        .as_ref()
        .map(|c| c.placement.clone())
        .unwrap_or(PolicyConfig {
            policy: PolicyKind::FirstFit,
            order: JobOrder::Name,
            block_size: None,
            seed: None,
        });
    if let Some(name) = &args.policy {
        policy.policy = name.parse()?;
    }
    if let Some(order) = &args.order {
        policy.order = order.parse()?;
    }
    if args.block_size.is_some() {
        policy.block_size = args.block_size;
    }
    if args.seed.is_some() {
        policy.seed = args.seed;
    }

    let file_jobs = config.as_ref().and_then(|c| c.jobs.as_ref());
    let mut jobs = JobSet::new();
    if args.jobspec.is_some() || args.jobs.is_some() {
        if let Some(path) = &args.jobspec {
            jobs.extend(read_jobspec(path)?)?;
        }
        if let Some(inline) = &args.jobs {
            jobs.extend(torus_core::parse_inline_jobs(inline)?)?;
        }
    } else if let Some(file_jobs) = file_jobs {
        if let Some(spec) = &file_jobs.spec {
            jobs.extend(read_jobspec(&base_dir.join(spec))?)?;
        }
        if let Some(inline) = &file_jobs.inline {
            jobs.extend(torus_core::parse_inline_jobs(inline)?)?;
        }
    }
    if jobs.is_empty() {
        bail!("no jobs specified: pass --jobspec, --jobs, or a [jobs] section in the config");
    }

    let output = args.output.clone().or_else(|| {
        file_jobs
            .and_then(|j| j.output.as_ref())
            .map(|o| base_dir.join(o))
    });

    Ok(ResolvedRun { dims, policy, jobs, output })
}

fn read_jobspec(path: &Path) -> Result<JobSet> {
    torus_core::read_jobspec(path).with_context(|| format!("failed to load job spec {}", path.display()))
}

pub fn run(resolved: &ResolvedRun) -> Result<PlacementTable> {
    let mut placer = Placer::from_config(resolved.dims, &resolved.policy)?;
    info!(
        torus = %resolved.dims,
        policy = %resolved.policy.policy,
        jobs = resolved.jobs.len(),
        nodes = ?resolved.jobs.total_volume(),
        "starting placement"
    );
    Ok(placer.run(&resolved.jobs)?)
}

pub fn place(args: &PlaceArgs) -> Result<()> {
    let resolved = resolve(args)?;
    let table = run(&resolved)?;
    let json = table.to_json_pretty()?;

    match &resolved.output {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(
                output = %path.display(),
                placed = table.len(),
                torus_nodes = resolved.dims.volume(),
                "wrote placement"
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_flags_only() {
        let args = PlaceArgs {
            dims: Some("4x4x4".to_string()),
            jobs: Some("B:2x2x2,A:2x2x2".to_string()),
            ..PlaceArgs::default()
        };
        let resolved = resolve(&args).unwrap();
        assert_eq!(resolved.policy.policy, PolicyKind::FirstFit);
        let table = run(&resolved).unwrap();
        assert_eq!(table.get("A", 0), Some(0));
        assert_eq!(table.len(), 16);
    }

    #[test]
    fn test_config_with_relative_jobspec() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("jobs.txt"), "J0,M,2,2,2\nJ1,B,2,2,2\n").unwrap();
        fs::write(
            dir.path().join("torusplace.toml"),
            "[torus]\ndims = [4, 4, 4]\n\n[placement]\npolicy = \"block\"\nblock_size = 2\n\n[jobs]\nspec = \"jobs.txt\"\noutput = \"out.json\"\n",
        )
        .unwrap();

        let args = PlaceArgs {
            config: Some(dir.path().join("torusplace.toml")),
            ..PlaceArgs::default()
        };
        place(&args).unwrap();

        let written = fs::read_to_string(dir.path().join("out.json")).unwrap();
        let table = PlacementTable::from_json(&written).unwrap();
        assert_eq!(table.job("J0").unwrap(), &[0, 1, 4, 5, 16, 17, 20, 21]);
        assert_eq!(table.job_count(), 2);
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("torusplace.toml"),
            "[torus]\ndims = [2, 2, 2]\n\n[placement]\npolicy = \"first-fit\"\n\n[jobs]\ninline = \"X:1x1x1\"\n",
        )
        .unwrap();

        let args = PlaceArgs {
            config: Some(dir.path().join("torusplace.toml")),
            dims: Some("4x4x4".to_string()),
            policy: Some("l1-clustering".to_string()),
            jobs: Some("Y:2x1x1".to_string()),
            ..PlaceArgs::default()
        };
        let resolved = resolve(&args).unwrap();
        assert_eq!(resolved.dims.volume(), 64);
        assert_eq!(resolved.policy.policy, PolicyKind::L1Clustering);
        assert!(resolved.jobs.get("X").is_none());
        assert!(resolved.jobs.get("Y").is_some());
    }

    #[test]
    fn test_missing_inputs() {
        assert!(resolve(&PlaceArgs::default()).is_err());

        let no_jobs = PlaceArgs {
            dims: Some("4x4x4".to_string()),
            ..PlaceArgs::default()
        };
        assert!(resolve(&no_jobs).unwrap_err().to_string().contains("no jobs"));
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let args = PlaceArgs {
            dims: Some("4x4x4".to_string()),
            policy: Some("tetris".to_string()),
            jobs: Some("A:1x1x1".to_string()),
            ..PlaceArgs::default()
        };
        assert!(resolve(&args).is_err());
    }

    #[test]
    fn test_over_capacity_produces_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("placement.json");
        let args = PlaceArgs {
            dims: Some("4x4x4".to_string()),
            jobs: Some("A:4x4x4,B:1x1x1".to_string()),
            output: Some(out.clone()),
            ..PlaceArgs::default()
        };
        let err = place(&args).unwrap_err();
        assert!(err.to_string().contains("exceed torus capacity"));
        assert!(!out.exists());
    }
}
