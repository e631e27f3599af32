use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StorageError;
use crate::identity::IndustryId;

/// Local-storage key of the shared ledger in the web client.
pub const SHARED_LEDGER_SLOT: &str = "purchaseRequests";

/// Where a ledger lives inside key-value storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LedgerSlot {
    /// One ledger for the whole device.
    Shared,
    /// One ledger per owning business, as a remote table keyed by seller would hold it.
    Business(IndustryId),
}

impl LedgerSlot {
    pub fn key(&self) -> String {
        match self {
            LedgerSlot::Shared => SHARED_LEDGER_SLOT.to_string(),
            LedgerSlot::Business(id) => format!("{SHARED_LEDGER_SLOT}/{id}"),
        }
    }

    /// Slot a request addressed to `owner` is written to. Per-business ledgers
    /// are keyed by the seller receiving the request, never by the sender.
    pub fn for_owner(&self, owner: &IndustryId) -> LedgerSlot {
        match self {
            LedgerSlot::Shared => LedgerSlot::Shared,
            LedgerSlot::Business(_) => LedgerSlot::Business(owner.clone()),
        }
    }
}

/// Abstraction over key-value backends (in-memory, a directory of files, a hosted table).
///
/// A slot holds one serialized value. `store` replaces the whole value; there is
/// no partial update.
pub trait LedgerStorage {
    /// Current value of the slot, or `None` if it was never written.
    fn load(&self, slot: &str) -> Result<Option<String>, StorageError>;

    /// Replace the slot's value.
    fn store(&mut self, slot: &str, value: &str) -> Result<(), StorageError>;

    /// Human-readable backend name (e.g. "memory", "file").
    fn backend_name(&self) -> &str;
}

impl<S: LedgerStorage + ?Sized> LedgerStorage for Box<S> {
    fn load(&self, slot: &str) -> Result<Option<String>, StorageError> {
        (**self).load(slot)
    }

    fn store(&mut self, slot: &str, value: &str) -> Result<(), StorageError> {
        (**self).store(slot, value)
    }

    fn backend_name(&self) -> &str {
        (**self).backend_name()
    }
}

impl<S: LedgerStorage + ?Sized> LedgerStorage for &mut S {
    fn load(&self, slot: &str) -> Result<Option<String>, StorageError> {
        (**self).load(slot)
    }

    fn store(&mut self, slot: &str, value: &str) -> Result<(), StorageError> {
        (**self).store(slot, value)
    }

    fn backend_name(&self) -> &str {
        (**self).backend_name()
    }
}

/// Map-backed storage. An optional quota mimics the browser's storage limit.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes across all slots may not exceed `quota`.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            slots: HashMap::new(),
            quota: Some(quota),
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.slots.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    /// Raw access for tests and tooling that seed a slot directly.
    pub fn insert_raw(&mut self, slot: &str, value: impl Into<String>) {
        self.slots.insert(slot.to_string(), value.into());
    }
}

impl LedgerStorage for MemoryStorage {
    fn load(&self, slot: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.get(slot).cloned())
    }

    fn store(&mut self, slot: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let existing = self.slots.get(slot).map_or(0, |v| slot.len() + v.len());
            let needed = self.used_bytes() - existing + slot.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        self.slots.insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

/// One JSON file per slot under a root directory.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// failed write leaves the previous value readable.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Creates the root directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            slot: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a slot. `/` in slot keys becomes a subdirectory.
    pub fn path_for(&self, slot: &str) -> PathBuf {
        let mut path = self.root.clone();
        for part in slot.split('/').filter(|p| !p.is_empty() && *p != "." && *p != "..") {
            path.push(part);
        }
        path.set_extension("json");
        path
    }

    fn write_atomic(path: &Path, value: &str) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)
    }
}

impl LedgerStorage for FileStorage {
    fn load(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(slot);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                debug!(slot, path = %path.display(), bytes = contents.len(), "Loaded slot");
                Ok(Some(contents))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                slot: slot.to_string(),
                source,
            }),
        }
    }

    fn store(&mut self, slot: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(slot);
        Self::write_atomic(&path, value).map_err(|source| StorageError::Io {
            slot: slot.to_string(),
            source,
        })?;
        debug!(slot, path = %path.display(), bytes = value.len(), "Stored slot");
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}
