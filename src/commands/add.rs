//! `vmfleet add` — validate and append a new machine, then persist.

use std::path::Path;

use anyhow::{Result, bail};
use clap::Args;

use vmfleet::machine::MachineDraft;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Machine id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Display name
    #[arg(short, long)]
    pub name: String,

    /// IPv4 or IPv6 address
    #[arg(long)]
    pub ip: String,

    /// Operating system label, e.g. "Ubuntu 22.04"
    #[arg(long)]
    pub os: String,

    /// Machine status [UP, DOWN]
    #[arg(long)]
    pub status: String,

    /// CPU count
    #[arg(long)]
    pub cpus: Option<String>,

    /// Memory size in MB
    #[arg(long)]
    pub memory_mb: Option<String>,

    /// Probe kind for simulated health checks [ping, http]
    #[arg(long)]
    pub check: Option<String>,

    /// Probe URL (required with --check http)
    #[arg(long)]
    pub url: Option<String>,
}

impl AddArgs {
    fn into_draft(self) -> MachineDraft {
        MachineDraft {
            id: self.id,
            name: Some(self.name),
            ip: Some(self.ip),
            os: Some(self.os),
            status: Some(self.status),
            cpus: self.cpus,
            memory_mb: self.memory_mb,
            check: self.check,
            url: self.url,
            ..MachineDraft::default()
        }
    }
}

pub async fn run(config_path: &str, data_file: Option<&Path>, args: AddArgs) -> Result<()> {
    let mut ws = super::open_workspace(config_path, data_file).await?;
    let mut fleet = super::load_fleet(&mut ws).await?;

    let (id, name) = match fleet.add(args.into_draft()) {
        Ok(rec) => (rec.id.clone(), rec.name.clone()),
        Err(e) => {
            ws.journal
                .warning(format!("Rejected new machine: {e}"))
                .await;
            ws.close().await?;
            bail!(e);
        }
    };

    super::persist(&mut ws, &fleet).await?;
    ws.journal.info(format!("Machine '{name}' added")).await;
    println!("Added machine '{name}' with id {id}.");
    ws.close().await
}
