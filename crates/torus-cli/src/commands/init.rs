use std::path::Path;

use anyhow::{Context, bail};
use torus_core::{PlacementConfig, PolicyKind, TorusDimensions};

pub const CONFIG_FILE: &str = "torusplace.toml";

pub fn init(path: &str, dims: &str, policy: &str, force: bool) -> anyhow::Result<()> {
    let dims: TorusDimensions = dims.parse()?;
    let policy: PolicyKind = policy.parse()?;

    let output = Path::new(path).join(CONFIG_FILE);
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }

    let config = PlacementConfig::scaffold(dims, policy);
    std::fs::write(&output, config.to_toml_string()?)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("✓ Generated {}", output.display());
    Ok(())
}
