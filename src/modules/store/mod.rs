mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use log::{debug, warn};
use std::ops::{Deref, DerefMut};
use url::Url;

use crate::modules::auth::store::{Account, NewAccount};
use crate::modules::error::StoreError;

/// Operations the provisioner needs from a persistent user store
pub trait UserStore {
    /// Exact, case-sensitive lookup by username
    fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// Insert a new account. Must reject a username that already exists.
    fn create(&mut self, account: NewAccount) -> Result<Account, StoreError>;

    /// Number of stored accounts
    fn count(&self) -> Result<usize, StoreError>;

    /// Release the connection. Later operations fail with `Disconnected`.
    fn disconnect(&mut self) -> Result<(), StoreError>;
}

/// Scoped store connection, disconnected on drop if not released explicitly
pub struct StoreConnection {
    inner: Box<dyn UserStore>,
    released: bool,
}

impl StoreConnection {
    /// Open a connection for a `file://`, bare path, or `memory://` URI
    pub fn open(uri: &str) -> Result<Self, StoreError> {
        let store: Box<dyn UserStore> = match Url::parse(uri) {
            Ok(url) => match url.scheme() {
                "file" => {
                    let path = url.to_file_path().map_err(|_| {
                        StoreError::Unreachable(format!("`{}` is not a local file path", uri))
                    })?;
                    Box::new(FileStore::connect(path)?)
                }
                "memory" => Box::new(MemoryStore::new()),
                other => return Err(StoreError::UnsupportedScheme(other.to_string())),
            },
            // No scheme at all: treat as a relative or absolute filesystem path
            Err(url::ParseError::RelativeUrlWithoutBase) => Box::new(FileStore::connect(uri)?),
            Err(e) => {
                return Err(StoreError::Unreachable(format!(
                    "invalid store URI `{}`: {}",
                    uri, e
                )))
            }
        };

        debug!("Store connection opened");
        Ok(Self::from_store(store))
    }

    /// Wrap an existing store so it gets the same release guarantees
    pub fn from_store(store: Box<dyn UserStore>) -> Self {
        Self {
            inner: store,
            released: false,
        }
    }

    /// Disconnect now and report any failure to the caller
    pub fn release(mut self) -> Result<(), StoreError> {
        self.released = true;
        self.inner.disconnect()
    }
}

impl Deref for StoreConnection {
    type Target = dyn UserStore;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DerefMut for StoreConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

impl Drop for StoreConnection {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match self.inner.disconnect() {
            Ok(()) => debug!("Store connection released on drop"),
            Err(e) => warn!("Failed to release store connection: {}", e),
        }
    }
}
