//! Interactive shell: read one command, apply it, persist, loop.
//!
//! One command is fully processed (validated, applied, persisted, journaled)
//! before the next is read. When a save fails the in-memory collection is
//! rolled back so it keeps matching what is on disk.

use std::path::Path;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};
use tokio::time::{Duration, sleep};

use vmfleet::fleet::MachineCollection;
use vmfleet::machine::{MachineDraft, MachineRecord};
use vmfleet::store::StoreError;

use super::Workspace;

pub async fn run(config_path: &str, data_file: Option<&Path>) -> Result<()> {
    let mut ws = super::open_workspace(config_path, data_file).await?;
    let mut fleet = super::load_fleet(&mut ws).await?;
    let step_delay_ms = ws.config.shell.step_delay_ms;

    println!("vmfleet shell - {} machine(s) loaded", fleet.len());
    println!("Type 'help' for the command list, 'quit' to exit.");
    println!();

    let mut io = ShellIo {
        lines: BufReader::new(tokio::io::stdin()).lines(),
        out: tokio::io::stdout(),
    };

    loop {
        let Some(line) = io.prompt("vmfleet> ").await? else {
            // End of input counts as a clean exit.
            println!();
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let (command, rest) = split_command(input);
        match command {
            "quit" | "exit" => break,
            "help" => print_help(),
            "list" => {
                super::list::render(&fleet);
                ws.journal.info("Displayed all machines").await;
            }
            "stats" => {
                super::stats::render(&fleet.stats());
                ws.journal
                    .info(format!("Reported statistics for {} machines", fleet.len()))
                    .await;
            }
            "check" => {
                let name = match rest {
                    Some(name) => Some(name.to_string()),
                    None => io.prompt_nonempty("Machine name to check: ").await?,
                };
                if let Some(name) = name {
                    pace(step_delay_ms).await;
                    super::check::check_one(&mut ws, &fleet, &name).await;
                }
            }
            "validate" => {
                super::validate::run_checks(&mut ws, &fleet).await;
            }
            "add" => add_flow(&mut ws, &mut fleet, &mut io, step_delay_ms).await?,
            "edit" => edit_flow(&mut ws, &mut fleet, &mut io, rest, step_delay_ms).await?,
            "delete" => delete_flow(&mut ws, &mut fleet, &mut io, rest, step_delay_ms).await?,
            other => {
                println!("Unknown command '{other}'. Type 'help' for the command list.");
            }
        }
        println!();
    }

    ws.journal.info("Shell session ended").await;
    ws.close().await?;
    println!("Goodbye.");
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  list           show all machines");
    println!("  add            add a new machine (prompted)");
    println!("  edit [ID]      edit an existing machine");
    println!("  delete [ID]    delete a machine");
    println!("  stats          show fleet statistics");
    println!("  validate       re-check every stored record");
    println!("  check [NAME]   check whether a machine name exists");
    println!("  quit, exit     leave the shell");
}

fn split_command(input: &str) -> (&str, Option<&str>) {
    match input.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, Some(rest.trim()).filter(|r| !r.is_empty())),
        None => (input, None),
    }
}

fn print_record(rec: &MachineRecord) {
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
}

async fn pace(step_delay_ms: u64) {
    if step_delay_ms > 0 {
        sleep(Duration::from_millis(step_delay_ms)).await;
    }
}

// ============================================================================
// Shell I/O
// ============================================================================

struct ShellIo {
    lines: Lines<BufReader<Stdin>>,
    out: Stdout,
}

impl ShellIo {
    /// Print a prompt and read one line; `None` on end of input.
    async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        self.out.write_all(label.as_bytes()).await?;
        self.out.flush().await?;
        Ok(self.lines.next_line().await?)
    }

    /// Like `prompt`, but empty input (or end of input) becomes `None`.
    async fn prompt_nonempty(&mut self, label: &str) -> Result<Option<String>> {
        Ok(self
            .prompt(label)
            .await?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    async fn confirm(&mut self, label: &str) -> Result<bool> {
        let answer = self.prompt(label).await?;
        Ok(matches!(
            answer.as_deref().map(str::trim),
            Some("y") | Some("Y") | Some("yes")
        ))
    }
}

// ============================================================================
// Mutation flows
// ============================================================================

async fn add_flow(
    ws: &mut Workspace,
    fleet: &mut MachineCollection,
    io: &mut ShellIo,
    step_delay_ms: u64,
) -> Result<()> {
    println!("New machine:");
    let draft = MachineDraft {
        name: io.prompt_nonempty("  Name: ").await?,
        ip: io.prompt_nonempty("  IP address: ").await?,
        os: io.prompt_nonempty("  Operating system: ").await?,
        status: io.prompt_nonempty("  Status (UP/DOWN): ").await?,
        cpus: io.prompt_nonempty("  CPUs (optional): ").await?,
        memory_mb: io.prompt_nonempty("  Memory MB (optional): ").await?,
        ..MachineDraft::default()
    };

    let before = fleet.clone();
    let added = match fleet.add(draft) {
        Ok(rec) => rec.clone(),
        Err(e) => {
            println!("Invalid machine configuration: {e}");
            ws.journal
                .warning(format!("Validation failed for new machine: {e}"))
                .await;
            return Ok(());
        }
    };

    println!();
    println!("Please confirm the machine details:");
    print_record(&added);
    if !io.confirm("Save this machine? (y/n): ").await? {
        *fleet = before;
        println!("Machine not saved.");
        ws.journal
            .info(format!("Canceled saving machine '{}'", added.name))
            .await;
        return Ok(());
    }

    pace(step_delay_ms).await;
    if persist_or_rollback(ws, fleet, before).await {
        println!("Machine saved successfully.");
        ws.journal
            .info(format!("Machine '{}' added", added.name))
            .await;
    }
    Ok(())
}

async fn edit_flow(
    ws: &mut Workspace,
    fleet: &mut MachineCollection,
    io: &mut ShellIo,
    rest: Option<&str>,
    step_delay_ms: u64,
) -> Result<()> {
    let id = match rest {
        Some(id) => id.to_string(),
        None => match io.prompt_nonempty("Id of the machine to edit: ").await? {
            Some(id) => id,
            None => return Ok(()),
        },
    };

    let Some(current) = fleet.get(&id).cloned() else {
        println!("Machine '{id}' not found.");
        ws.journal
            .warning(format!("Attempted to edit non-existing machine '{id}'"))
            .await;
        return Ok(());
    };

    println!("Current configuration:");
    print_record(&current);
    println!("Press Enter to keep the current value.");

    let draft = MachineDraft {
        name: io
            .prompt_nonempty(&format!("  Name [{}]: ", current.name))
            .await?,
        ip: io
            .prompt_nonempty(&format!("  IP address [{}]: ", current.ip))
            .await?,
        os: io
            .prompt_nonempty(&format!("  Operating system [{}]: ", current.os))
            .await?,
        status: io
            .prompt_nonempty(&format!("  Status (UP/DOWN) [{}]: ", current.status))
            .await?,
        ..MachineDraft::default()
    };

    let before = fleet.clone();
    let updated = match fleet.edit(&id, draft) {
        Ok(rec) => rec.clone(),
        Err(e) => {
            println!("Invalid configuration: {e}");
            ws.journal
                .warning(format!("Validation failed while editing '{id}': {e}"))
                .await;
            return Ok(());
        }
    };

    if !io.confirm("Save changes? (y/n): ").await? {
        *fleet = before;
        println!("Changes discarded.");
        ws.journal
            .info(format!("Canceled editing machine '{}'", updated.name))
            .await;
        return Ok(());
    }

    println!("Saving changes...");
    pace(step_delay_ms).await;
    if persist_or_rollback(ws, fleet, before).await {
        println!("Machine updated successfully.");
        ws.journal
            .info(format!("Machine '{}' was updated", updated.name))
            .await;
    }
    Ok(())
}

async fn delete_flow(
    ws: &mut Workspace,
    fleet: &mut MachineCollection,
    io: &mut ShellIo,
    rest: Option<&str>,
    step_delay_ms: u64,
) -> Result<()> {
    let id = match rest {
        Some(id) => id.to_string(),
        None => match io.prompt_nonempty("Id of the machine to delete: ").await? {
            Some(id) => id,
            None => return Ok(()),
        },
    };

    let Some(target) = fleet.get(&id).cloned() else {
        println!("Machine '{id}' not found.");
        ws.journal
            .warning(format!("Attempted to delete non-existing machine '{id}'"))
            .await;
        return Ok(());
    };

    println!("Machine found:");
    print_record(&target);
    if !io
        .confirm("Are you sure you want to delete this machine? (y/n): ")
        .await?
    {
        println!("Deletion canceled.");
        ws.journal
            .info(format!("Canceled deletion of machine '{}'", target.name))
            .await;
        return Ok(());
    }

    let before = fleet.clone();
    if let Err(e) = fleet.remove(&id) {
        // The id was present a moment ago; nothing else mutates the
        // collection in between, but report rather than panic.
        println!("Delete failed: {e}");
        return Ok(());
    }

    pace(step_delay_ms).await;
    if persist_or_rollback(ws, fleet, before).await {
        println!("Machine deleted successfully.");
        ws.journal
            .info(format!("Machine '{}' was deleted", target.name))
            .await;
    }
    Ok(())
}

/// Persist the collection; on failure restore the pre-mutation state so the
/// in-memory view keeps matching the document on disk.
async fn persist_or_rollback(
    ws: &mut Workspace,
    fleet: &mut MachineCollection,
    before: MachineCollection,
) -> bool {
    match super::persist(ws, fleet).await {
        Ok(()) => true,
        Err(e) => {
            *fleet = before;
            println!("Save failed: {e}");
            if matches!(e, StoreError::BackupWrite { .. }) {
                println!("The data file was left untouched.");
            }
            false
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::split_command;

    #[test]
    fn split_command_without_argument() {
        assert_eq!(split_command("list"), ("list", None));
    }

    #[test]
    fn split_command_with_argument() {
        assert_eq!(split_command("edit vm-1"), ("edit", Some("vm-1")));
        assert_eq!(split_command("check  web-01 "), ("check", Some("web-01")));
    }
}
