//! CLI command implementations.

use std::path::Path;

use anyhow::{Result, bail};

use vmfleet::config::{Config, DEFAULT_WORKSPACE};
use vmfleet::fleet::MachineCollection;
use vmfleet::journal::Journal;
use vmfleet::store::{FileStore, RecordStore, StoreError};

pub mod add;
pub mod check;
pub mod delete;
pub mod edit;
pub mod init;
pub mod list;
pub mod shell;
pub mod stats;
pub mod validate;

/// Everything a command needs: the loaded config, the record store, and the
/// activity journal.
pub(crate) struct Workspace {
    pub config: Config,
    pub store: FileStore,
    pub journal: Journal,
}

impl Workspace {
    /// Flush the journal; call once when the command is done.
    pub async fn close(self) -> Result<()> {
        self.journal.close().await?;
        Ok(())
    }
}

/// Check that a vmfleet workspace exists.
///
/// If neither the config file nor the default workspace directory
/// (`.vmfleet/`) exists, returns an error suggesting `vmfleet init`.
pub(crate) fn check_workspace(config_path: &str) -> Result<()> {
    if Path::new(config_path).exists() || Path::new(DEFAULT_WORKSPACE).exists() {
        return Ok(());
    }
    bail!(
        "No vmfleet workspace found (missing '{}' and '{}/' directory).\n\
         Run `vmfleet init` to set one up.",
        config_path,
        DEFAULT_WORKSPACE,
    )
}

/// Load config, open the store and the journal.
///
/// An explicit `--data-file` overrides the configured storage path (and
/// re-derives the backup path next to it); it also skips the workspace
/// check, since the caller has named the data directly.
pub(crate) async fn open_workspace(config_path: &str, data_file: Option<&Path>) -> Result<Workspace> {
    if data_file.is_none() {
        check_workspace(config_path)?;
    }

    let mut config = Config::load(config_path).await?;
    if let Some(path) = data_file {
        config.storage.path = path.to_path_buf();
        config.storage.backup_path = None;
    }

    let store = FileStore::from_config(&config.storage);
    let journal = Journal::open(&config.journal.path).await?;

    Ok(Workspace {
        config,
        store,
        journal,
    })
}

/// Load the collection, honoring `storage.missing_as_empty`, and journal the
/// read. A corrupt document is fatal and carries a remediation hint.
pub(crate) async fn load_fleet(ws: &mut Workspace) -> Result<MachineCollection> {
    match ws.store.load().await {
        Ok(fleet) => {
            ws.journal
                .info(format!(
                    "Loaded {} machines from {}",
                    fleet.len(),
                    ws.store.path().display()
                ))
                .await;
            Ok(fleet)
        }
        Err(StoreError::NotFound { path }) if ws.config.storage.missing_as_empty => {
            ws.journal
                .warning(format!(
                    "Data file {} missing, starting with an empty collection",
                    path.display()
                ))
                .await;
            Ok(MachineCollection::new())
        }
        Err(e @ StoreError::Corrupt { .. }) => {
            ws.journal.error(e.to_string()).await;
            bail!(
                "{e}\nhint: the previous version may still be intact at {}",
                ws.store.backup_path().display()
            )
        }
        Err(e) => {
            ws.journal.error(e.to_string()).await;
            Err(e.into())
        }
    }
}

/// Save the collection and journal the write. All save failures are
/// journaled as ERROR; a backup failure means the primary was not touched.
pub(crate) async fn persist(ws: &mut Workspace, fleet: &MachineCollection) -> Result<(), StoreError> {
    match ws.store.save(fleet).await {
        Ok(()) => {
            ws.journal
                .info(format!(
                    "Saved {} machines to {}",
                    fleet.len(),
                    ws.store.path().display()
                ))
                .await;
            Ok(())
        }
        Err(e) => {
            ws.journal.error(e.to_string()).await;
            Err(e)
        }
    }
}
