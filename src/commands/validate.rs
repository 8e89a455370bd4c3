//! `vmfleet validate` — re-check every stored record against the schema.
//!
//! Records that pass and carry a probe config also get a simulated health
//! probe line; nothing is actually sent anywhere.

use std::path::Path;

use anyhow::{Result, bail};

use vmfleet::fleet::MachineCollection;
use vmfleet::machine::{MachineRecord, ProbeKind};

use super::Workspace;

pub async fn run(config_path: &str, data_file: Option<&Path>) -> Result<()> {
    let mut ws = super::open_workspace(config_path, data_file).await?;
    let fleet = super::load_fleet(&mut ws).await?;

    let invalid = run_checks(&mut ws, &fleet).await;
    ws.close().await?;

    if invalid > 0 {
        bail!("{invalid} invalid machine record(s)");
    }
    Ok(())
}

/// Audit the collection, print one line per record, and journal each
/// outcome. Returns the number of invalid records.
pub(crate) async fn run_checks(ws: &mut Workspace, fleet: &MachineCollection) -> usize {
    ws.journal.info("Started validating all machine records").await;

    if fleet.is_empty() {
        println!("No machines to validate.");
        return 0;
    }

    println!("Validating machine configurations...");
    let mut invalid = 0;

    for (i, (rec, outcome)) in fleet.records().iter().zip(fleet.audit()).enumerate() {
        match outcome {
            Ok(()) => {
                println!("#{:<3} {:<24} OK", i + 1, rec.name);
                if let Some(line) = probe_line(rec) {
                    println!("     {line}");
                }
                ws.journal
                    .info(format!("Machine '{}' is valid", rec.name))
                    .await;
            }
            Err(e) => {
                invalid += 1;
                println!("#{:<3} {:<24} INVALID", i + 1, rec.name);
                for issue in &e.issues {
                    println!("     - {issue}");
                }
                ws.journal
                    .error(format!("Machine '{}' is invalid: {e}", rec.name))
                    .await;
            }
        }
    }

    println!();
    println!(
        "Validation complete: {} valid, {} invalid.",
        fleet.len() - invalid,
        invalid
    );
    invalid
}

fn probe_line(rec: &MachineRecord) -> Option<String> {
    match rec.check? {
        ProbeKind::Ping => Some(format!("[SIM] PING {} ... OK", rec.ip)),
        ProbeKind::Http => rec
            .url
            .as_ref()
            .map(|url| format!("[SIM] HTTP GET {url} ... OK")),
    }
}
