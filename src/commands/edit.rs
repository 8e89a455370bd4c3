//! `vmfleet edit` — merge changes over an existing machine, re-validate,
//! and persist.

use std::path::Path;

use anyhow::{Result, bail};
use clap::Args;

use vmfleet::machine::MachineDraft;

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Id of the machine to edit
    pub id: String,

    /// New display name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New IPv4 or IPv6 address
    #[arg(long)]
    pub ip: Option<String>,

    /// New operating system label
    #[arg(long)]
    pub os: Option<String>,

    /// New status [UP, DOWN]
    #[arg(long)]
    pub status: Option<String>,

    /// New CPU count
    #[arg(long)]
    pub cpus: Option<String>,

    /// New memory size in MB
    #[arg(long)]
    pub memory_mb: Option<String>,

    /// New probe kind [ping, http]
    #[arg(long)]
    pub check: Option<String>,

    /// New probe URL
    #[arg(long)]
    pub url: Option<String>,
}

impl EditArgs {
    fn changes(self) -> MachineDraft {
        MachineDraft {
            name: self.name,
            ip: self.ip,
            os: self.os,
            status: self.status,
            cpus: self.cpus,
            memory_mb: self.memory_mb,
            check: self.check,
            url: self.url,
            ..MachineDraft::default()
        }
    }
}

pub async fn run(config_path: &str, data_file: Option<&Path>, args: EditArgs) -> Result<()> {
    let mut ws = super::open_workspace(config_path, data_file).await?;
    let mut fleet = super::load_fleet(&mut ws).await?;

    let id = args.id.clone();
    let name = match fleet.edit(&id, args.changes()) {
        Ok(rec) => rec.name.clone(),
        Err(e) => {
            ws.journal
                .warning(format!("Edit of machine '{id}' rejected: {e}"))
                .await;
            ws.close().await?;
            bail!(e);
        }
    };

    super::persist(&mut ws, &fleet).await?;
    ws.journal.info(format!("Machine '{name}' was updated")).await;
    println!("Updated machine '{name}' ({id}).");
    ws.close().await
}
