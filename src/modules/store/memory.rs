use std::collections::HashMap;

use super::UserStore;
use crate::modules::auth::store::{Account, NewAccount};
use crate::modules::error::StoreError;

/// In-process account store keyed by username
pub struct MemoryStore {
    accounts: HashMap<String, Account>,
    connected: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            connected: true,
        }
    }

    /// Start from a set of existing accounts
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .map(|account| (account.username.clone(), account))
                .collect(),
            connected: true,
        }
    }

    /// Reopen after `disconnect`, keeping the stored accounts
    pub fn reconnect(&mut self) {
        self.connected = true;
    }

    fn ensure_connected(&self) -> Result<(), StoreError> {
        if self.connected {
            Ok(())
        } else {
            Err(StoreError::Disconnected)
        }
    }
}

impl UserStore for MemoryStore {
    fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        self.ensure_connected()?;
        Ok(self.accounts.get(username).cloned())
    }

    fn create(&mut self, account: NewAccount) -> Result<Account, StoreError> {
        self.ensure_connected()?;
        if self.accounts.contains_key(&account.username) {
            return Err(StoreError::DuplicateUsername(account.username));
        }

        let account = account.into_account();
        self.accounts.insert(account.username.clone(), account.clone());
        Ok(account)
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.ensure_connected()?;
        Ok(self.accounts.len())
    }

    fn disconnect(&mut self) -> Result<(), StoreError> {
        self.ensure_connected()?;
        self.connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_uniqueness() {
        let mut store = MemoryStore::new();
        store
            .create(NewAccount::admin("admin", "admin@example.com", "hash".into()))
            .unwrap();

        assert!(matches!(
            store.create(NewAccount::admin("admin", "x@example.com", "other".into())),
            Err(StoreError::DuplicateUsername(_))
        ));
        // Usernames differing only in case are distinct accounts
        assert!(store
            .create(NewAccount::admin("ADMIN", "x@example.com", "other".into()))
            .is_ok());
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_default_store_is_connected_and_empty() {
        let store = MemoryStore::default();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_reconnect_keeps_accounts() {
        let existing =
            NewAccount::admin("admin", "admin@example.com", "hash".into()).into_account();
        let mut store = MemoryStore::with_accounts([existing.clone()]);

        store.disconnect().unwrap();
        assert!(matches!(store.count(), Err(StoreError::Disconnected)));

        store.reconnect();
        assert_eq!(store.find_by_username("admin").unwrap(), Some(existing));
    }
}
