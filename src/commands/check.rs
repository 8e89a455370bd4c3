//! `vmfleet check` — report whether a machine with the given name exists.

use std::path::Path;

use anyhow::Result;

use vmfleet::fleet::MachineCollection;

use super::Workspace;

pub async fn run(config_path: &str, data_file: Option<&Path>, name: &str) -> Result<()> {
    let mut ws = super::open_workspace(config_path, data_file).await?;
    let fleet = super::load_fleet(&mut ws).await?;

    check_one(&mut ws, &fleet, name).await;
    ws.close().await
}

pub(crate) async fn check_one(ws: &mut Workspace, fleet: &MachineCollection, name: &str) {
    if fleet.contains_name(name) {
        println!("Machine '{name}' exists.");
        ws.journal.info(format!("Machine '{name}' exists")).await;
    } else {
        println!("Machine '{name}' does not exist.");
        ws.journal
            .warning(format!("Machine '{name}' does not exist"))
            .await;
    }
}
