//! `vmfleet list` — print every machine in the collection.

use std::path::Path;

use anyhow::Result;

use vmfleet::fleet::MachineCollection;

pub async fn run(config_path: &str, data_file: Option<&Path>) -> Result<()> {
    let mut ws = super::open_workspace(config_path, data_file).await?;
    let fleet = super::load_fleet(&mut ws).await?;

    render(&fleet);
    ws.journal.info("Displayed all machines").await;
    ws.close().await
}

pub(crate) fn render(fleet: &MachineCollection) {
    if fleet.is_empty() {
        println!("No machines found.");
        return;
    }

    for (i, rec) in fleet.records().iter().enumerate() {
        println!("Machine #{}", i + 1);
        println!("  Id     : {}", rec.id);
        println!("  Name   : {}", rec.name);
        println!("  IP     : {}", rec.ip);
        println!("  OS     : {}", rec.os);
        println!("  Status : {}", rec.status);
        if let Some(cpus) = rec.cpus {
            println!("  CPUs   : {cpus}");
        }
        if let Some(memory_mb) = rec.memory_mb {
            println!("  Memory : {memory_mb} MB");
        }
        if let Some(health) = &rec.health {
            println!("  Health : {health}");
        }
        println!();
    }
    println!("{} machine(s).", fleet.len());
}
