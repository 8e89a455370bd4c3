//! Common test utilities.

use std::path::PathBuf;

use tempfile::TempDir;

use vmfleet::machine::MachineDraft;
use vmfleet::store::FileStore;

/// A `FileStore` rooted in its own temp directory.
pub struct StoreFixture {
    pub tmp: TempDir,
    pub store: FileStore,
}

pub fn store_fixture() -> StoreFixture {
    let tmp = TempDir::new().unwrap();
    let store = FileStore::new(
        tmp.path().join("instances.json"),
        tmp.path().join("instances_backup.json"),
    );
    StoreFixture { tmp, store }
}

impl StoreFixture {
    pub fn primary(&self) -> PathBuf {
        self.tmp.path().join("instances.json")
    }

    pub fn backup(&self) -> PathBuf {
        self.tmp.path().join("instances_backup.json")
    }

    pub fn primary_bytes(&self) -> Vec<u8> {
        std::fs::read(self.primary()).unwrap()
    }

    pub fn backup_bytes(&self) -> Vec<u8> {
        std::fs::read(self.backup()).unwrap()
    }
}

pub fn draft(id: &str, name: &str, ip: &str, os: &str, status: &str) -> MachineDraft {
    MachineDraft {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        ip: Some(ip.to_string()),
        os: Some(os.to_string()),
        status: Some(status.to_string()),
        ..MachineDraft::default()
    }
}
