use std::path::{Path, PathBuf};

use tempfile::TempDir;

use chemtrade_common::ledger::RequestLedger;
use chemtrade_common::storage::{FileStorage, LedgerSlot};
use chemtrade_common::watch::PollingFeed;

use crate::open_file_ledger_at;

/// A data directory shared by several independent sessions, the way two
/// browser tabs share one origin's storage.
pub struct TestHarness {
    dir: TempDir,
    slot: LedgerSlot,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_slot(LedgerSlot::Shared)
    }

    pub fn with_slot(slot: LedgerSlot) -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
            slot,
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the file backing the harness slot.
    pub fn slot_file(&self) -> PathBuf {
        FileStorage::open(self.root())
            .expect("data dir is writable")
            .path_for(&self.slot.key())
    }

    /// A fresh session: its own in-memory ledger over the shared directory.
    pub fn session(&self) -> RequestLedger<FileStorage> {
        open_file_ledger_at(self.root(), &self.slot)
    }

    /// A listing-view session that polls for changes.
    pub fn watcher(&self) -> PollingFeed<FileStorage> {
        PollingFeed::new(self.session())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
