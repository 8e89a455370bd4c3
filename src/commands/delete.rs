//! `vmfleet delete` — remove a machine by id and persist.

use std::path::Path;

use anyhow::{Result, bail};

pub async fn run(config_path: &str, data_file: Option<&Path>, id: &str) -> Result<()> {
    let mut ws = super::open_workspace(config_path, data_file).await?;
    let mut fleet = super::load_fleet(&mut ws).await?;

    let removed = match fleet.remove(id) {
        Ok(rec) => rec,
        Err(e) => {
            ws.journal
                .warning(format!("Deletion of machine '{id}' rejected: {e}"))
                .await;
            ws.close().await?;
            bail!(e);
        }
    };

    super::persist(&mut ws, &fleet).await?;
    ws.journal
        .info(format!("Machine '{}' was deleted", removed.name))
        .await;
    println!("Deleted machine '{}' ({}).", removed.name, removed.id);
    ws.close().await
}
