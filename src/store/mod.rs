//! Persistence for the machine collection.
//!
//! The `RecordStore` trait is the seam between operations and storage. The
//! file-backed implementation keeps the whole collection in a single JSON
//! document and writes a backup copy of the previous document before every
//! overwrite.

mod error;
mod file;

use async_trait::async_trait;

use crate::fleet::MachineCollection;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;

/// Storage interface for the machine collection.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load the persisted collection.
    ///
    /// A missing document is `StoreError::NotFound`; an unparseable one is
    /// `StoreError::Corrupt`.
    async fn load(&self) -> StoreResult<MachineCollection>;

    /// Persist the collection, backing up the previous document first.
    ///
    /// Must not touch the primary document unless the backup step succeeded.
    async fn save(&self, fleet: &MachineCollection) -> StoreResult<()>;
}
