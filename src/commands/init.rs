//! `vmfleet init` — scaffold a new workspace.

use std::path::Path;

use anyhow::{Result, bail};
use tokio::fs;

use vmfleet::config::{DEFAULT_CONFIG_FILE, DEFAULT_WORKSPACE};

// ============================================================================
// Templates (compiled into binary)
// ============================================================================

const TEMPLATE_CONFIG: &str = include_str!("../../templates/vmfleet.yaml");
const TEMPLATE_INSTANCES: &str = include_str!("../../templates/instances.json");

// ============================================================================
// Entry Point
// ============================================================================

pub async fn run(root: &Path, force: bool) -> Result<()> {
    let config_path = root.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() && !force {
        bail!(
            "'{}' already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    let workspace = root.join(DEFAULT_WORKSPACE);
    fs::create_dir_all(workspace.join("logs")).await?;

    fs::write(&config_path, TEMPLATE_CONFIG).await?;

    let instances_path = workspace.join("instances.json");
    if !instances_path.exists() || force {
        fs::write(&instances_path, TEMPLATE_INSTANCES).await?;
    }

    println!("Initialized vmfleet workspace in {}", root.display());
    println!();
    println!("  config    {}", config_path.display());
    println!("  data      {}", instances_path.display());
    println!("  logs      {}", workspace.join("logs").display());
    println!();
    println!("Next steps:");
    println!("  vmfleet add --name web-01 --ip 10.0.0.5 --os \"Ubuntu 22.04\" --status UP");
    println!("  vmfleet shell");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_scaffolds_workspace() {
        let tmp = TempDir::new().unwrap();

        run(tmp.path(), false).await.unwrap();

        assert!(tmp.path().join(DEFAULT_CONFIG_FILE).exists());
        assert!(tmp.path().join(".vmfleet/instances.json").exists());
        assert!(tmp.path().join(".vmfleet/logs").is_dir());

        let data = std::fs::read_to_string(tmp.path().join(".vmfleet/instances.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(parsed["instances"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn init_refuses_to_overwrite_without_force() {
        let tmp = TempDir::new().unwrap();

        run(tmp.path(), false).await.unwrap();
        assert!(run(tmp.path(), false).await.is_err());
        assert!(run(tmp.path(), true).await.is_ok());
    }
}
