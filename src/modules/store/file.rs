use fs2::FileExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::UserStore;
use crate::modules::auth::store::{Account, NewAccount};
use crate::modules::error::StoreError;

/// On-disk layout of the account document
#[derive(Serialize, Deserialize, Default)]
struct AccountDocument {
    accounts: Vec<Account>,
}

/// Account store backed by a single JSON document on the local filesystem
pub struct FileStore {
    path: PathBuf,
    document: AccountDocument,
    connected: bool,
}

impl FileStore {
    /// Open the document at `path`. A missing file is an empty store; a missing
    /// parent directory means the store is unreachable.
    pub fn connect(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.is_dir() {
            return Err(StoreError::Unreachable(format!(
                "directory {} does not exist",
                parent.display()
            )));
        }

        let document = read_document(&path)?;
        debug!(
            "Opened file store {} with {} accounts",
            path.display(),
            document.accounts.len()
        );

        Ok(Self {
            path,
            document,
            connected: true,
        })
    }

    fn ensure_connected(&self) -> Result<(), StoreError> {
        if self.connected {
            Ok(())
        } else {
            Err(StoreError::Disconnected)
        }
    }

    /// Block until this process holds the exclusive write lock on the document
    fn lock_document(&self) -> Result<DocumentLock, StoreError> {
        let mut lock_path = self.path.clone().into_os_string();
        lock_path.push(".lock");
        let lock_path = PathBuf::from(lock_path);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| {
                StoreError::Unreachable(format!("cannot open {}: {}", lock_path.display(), e))
            })?;
        file.lock_exclusive()?;
        debug!("Acquired write lock {}", lock_path.display());

        Ok(DocumentLock { file })
    }

    /// Write the document next to its final location, then rename it into place
    fn persist(&self, document: &AccountDocument) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let data = serde_json::to_string_pretty(document)
            .map_err(|e| StoreError::Corrupt(format!("failed to serialize accounts: {}", e)))?;

        let mut temp_file = NamedTempFile::new_in(dir)?;
        temp_file.write_all(data.as_bytes())?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

/// Exclusive OS-level lock on `<document>.lock`, released on drop
struct DocumentLock {
    file: File,
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release store write lock: {}", e);
        }
    }
}

fn read_document(path: &Path) -> Result<AccountDocument, StoreError> {
    match fs::read_to_string(path) {
        Ok(data) if data.trim().is_empty() => Ok(AccountDocument::default()),
        Ok(data) => serde_json::from_str(&data)
            .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(AccountDocument::default()),
        Err(e) => Err(StoreError::Unreachable(format!(
            "cannot read {}: {}",
            path.display(),
            e
        ))),
    }
}

impl UserStore for FileStore {
    fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        self.ensure_connected()?;
        Ok(self
            .document
            .accounts
            .iter()
            .find(|account| account.username == username)
            .cloned())
    }

    fn create(&mut self, account: NewAccount) -> Result<Account, StoreError> {
        self.ensure_connected()?;

        // Held from the re-read through the rename so concurrent writers
        // serialize and the later one sees the earlier account
        let _lock = self.lock_document()?;

        // Pick up writes made by other processes since connect
        let mut document = read_document(&self.path)?;
        if document
            .accounts
            .iter()
            .any(|existing| existing.username == account.username)
        {
            self.document = document;
            return Err(StoreError::DuplicateUsername(account.username));
        }

        let account = account.into_account();
        document.accounts.push(account.clone());
        self.persist(&document)?;
        self.document = document;

        info!("Stored account {} in {}", account.id, self.path.display());
        Ok(account)
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.ensure_connected()?;
        Ok(self.document.accounts.len())
    }

    fn disconnect(&mut self) -> Result<(), StoreError> {
        self.ensure_connected()?;
        self.connected = false;
        debug!("Closed file store {}", self.path.display());
        Ok(())
    }
}
