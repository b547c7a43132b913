use chrono::Utc;
use log::{info, warn};
use serde::Serialize;

use super::ProvisionConfig;
use crate::modules::auth::password::{hash_password, validate_password};
use crate::modules::auth::store::{Account, NewAccount};
use crate::modules::auth::tokens::{issue_credential, Credential};
use crate::modules::error::ProvisionError;
use crate::modules::store::{StoreConnection, UserStore};
use crate::modules::utils::logging::log_provision_event;

/// Whether the run created the account or found it already present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Created,
    Reused,
}

/// Result of a successful provisioning run
#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    pub account: Account,
    pub credential: Credential,
    pub status: AccountStatus,
}

impl ProvisionOutcome {
    pub fn was_created(&self) -> bool {
        self.status == AccountStatus::Created
    }
}

/// Ensure the admin account exists in the store named by `config.store_uri`
/// and issue a fresh token for it. The connection is released on every path.
pub fn provision(config: &ProvisionConfig) -> Result<ProvisionOutcome, ProvisionError> {
    config.validate()?;

    let mut connection = StoreConnection::open(&config.store_uri)?;
    info!("Connected to account store");

    // An early return drops the connection, which releases it
    let outcome = provision_with(&mut *connection, config)?;

    if let Err(e) = connection.release() {
        warn!("Store connection did not close cleanly: {}", e);
    }
    info!("Disconnected from account store");

    Ok(outcome)
}

/// Run lookup, optional creation and signing against an already open store
pub fn provision_with(
    store: &mut dyn UserStore,
    config: &ProvisionConfig,
) -> Result<ProvisionOutcome, ProvisionError> {
    config.validate()?;

    let (account, status) = match store.find_by_username(&config.username)? {
        Some(existing) => {
            log_provision_event("lookup", &config.username, true, Some("existing account reused"));
            if !existing.role.is_admin() {
                warn!(
                    "Account {} exists with role `{}`; it is reused unchanged",
                    existing.id, existing.role
                );
            }
            (existing, AccountStatus::Reused)
        }
        None => {
            warn_on_weak_password(config);

            let password_hash = match hash_password(&config.password, config.hash_work_factor) {
                Ok(hash) => hash,
                Err(e) => {
                    log_provision_event("hash", &config.username, false, Some(&e.to_string()));
                    return Err(e);
                }
            };

            let new_account = NewAccount::admin(&config.username, &config.email, password_hash);
            let account = match store.create(new_account) {
                Ok(account) => account,
                Err(e) => {
                    let error = ProvisionError::from(e);
                    log_provision_event("create", &config.username, false, Some(&error.to_string()));
                    return Err(error);
                }
            };
            log_provision_event("create", &config.username, true, Some("new admin account"));
            (account, AccountStatus::Created)
        }
    };

    let credential = match issue_credential(
        &account,
        &config.signing_secret,
        config.token_validity()?,
        Utc::now(),
    ) {
        Ok(credential) => credential,
        Err(e) => {
            log_provision_event("sign", &config.username, false, Some(&e.to_string()));
            return Err(e);
        }
    };
    log_provision_event(
        "sign",
        &config.username,
        true,
        Some(&format!("token fingerprint {}", credential.fingerprint())),
    );

    Ok(ProvisionOutcome {
        account,
        credential,
        status,
    })
}

fn warn_on_weak_password(config: &ProvisionConfig) {
    if config.uses_default_password() {
        warn!("Creating the admin account with the built-in placeholder password; change it after first login");
    } else if let Err(e) = validate_password(&config.password) {
        warn!("Admin password is weak ({:?}); continuing anyway", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::password::verify_password;
    use crate::modules::auth::store::Role;
    use crate::modules::auth::tokens::verify_token;
    use crate::modules::error::StoreError;
    use crate::modules::store::MemoryStore;
    use chrono::Duration;

    const SECRET: &str = "test-signing-secret";

    fn test_config() -> ProvisionConfig {
        // Lowest bcrypt cost keeps the tests fast
        ProvisionConfig::new("memory://", SECRET).with_hash_work_factor(4)
    }

    #[test]
    fn test_creates_admin_in_empty_store() {
        let mut store = MemoryStore::new();
        let config = test_config().with_password("ChangeMe123!");

        let outcome = provision_with(&mut store, &config).unwrap();

        assert_eq!(outcome.status, AccountStatus::Created);
        assert!(outcome.was_created());
        assert_eq!(outcome.account.username, "admin");
        assert_eq!(outcome.account.role, Role::Admin);
        assert_eq!(store.count().unwrap(), 1);

        let claims = verify_token(&outcome.credential.token, SECRET).unwrap();
        assert_eq!(claims.sub, outcome.account.id);
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_reuses_existing_account() {
        let existing = NewAccount::admin("admin", "first@example.com", "$2b$04$existing".into())
            .into_account();
        let mut store = MemoryStore::with_accounts([existing.clone()]);

        let outcome = provision_with(&mut store, &test_config()).unwrap();

        assert_eq!(outcome.status, AccountStatus::Reused);
        assert_eq!(outcome.account, existing);
        assert_eq!(store.count().unwrap(), 1);

        let claims = verify_token(&outcome.credential.token, SECRET).unwrap();
        assert_eq!(claims.sub, existing.id);
    }

    #[test]
    fn test_repeated_runs_keep_first_account() {
        let mut store = MemoryStore::new();
        let first = provision_with(
            &mut store,
            &test_config().with_email("first@example.com").with_password("FirstPass1!"),
        )
        .unwrap();

        for i in 0..3 {
            let config = test_config()
                .with_email(format!("other{}@example.com", i))
                .with_password(format!("OtherPass{}!", i));
            let outcome = provision_with(&mut store, &config).unwrap();

            assert_eq!(outcome.status, AccountStatus::Reused);
            assert_eq!(outcome.account, first.account);
        }

        let stored = store.find_by_username("admin").unwrap().unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(stored.email, "first@example.com");
        assert_eq!(stored.password_hash, first.account.password_hash);
        assert!(verify_password("FirstPass1!", &stored.password_hash).unwrap());
    }

    #[test]
    fn test_password_hash_contract() {
        let mut store = MemoryStore::new();
        let config = test_config().with_password("ChangeMe123!");
        let outcome = provision_with(&mut store, &config).unwrap();

        assert_ne!(outcome.account.password_hash, config.password);
        assert!(verify_password(&config.password, &outcome.account.password_hash).unwrap());
    }

    #[test]
    fn test_token_freshness() {
        let mut store = MemoryStore::new();
        let before = Utc::now();
        let outcome = provision_with(&mut store, &test_config()).unwrap();
        let after = Utc::now();

        let credential = &outcome.credential;
        assert!(credential.issued_at.timestamp() >= before.timestamp());
        assert!(credential.issued_at.timestamp() <= after.timestamp());
        assert_eq!(
            credential.expires_at - credential.issued_at,
            Duration::hours(8)
        );
        assert_eq!(credential.claims.exp - credential.claims.iat, 8 * 60 * 60);
    }

    #[test]
    fn test_hashing_failure_leaves_store_unchanged() {
        let mut store = MemoryStore::new();
        let config = test_config().with_hash_work_factor(3);

        let result = provision_with(&mut store, &config);

        assert!(matches!(result, Err(ProvisionError::HashingFailure(_))));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_missing_secret_creates_account_then_fails_signing() {
        let mut store = MemoryStore::new();
        let config = ProvisionConfig::new("memory://", "").with_hash_work_factor(4);

        let result = provision_with(&mut store, &config);

        assert!(matches!(result, Err(ProvisionError::SigningFailure(_))));
        assert_eq!(store.count().unwrap(), 1);
    }

    /// Store whose lookup always misses, as if another run created the
    /// account between lookup and insert
    struct RacingStore {
        inner: MemoryStore,
    }

    impl UserStore for RacingStore {
        fn find_by_username(&self, _username: &str) -> Result<Option<Account>, StoreError> {
            Ok(None)
        }

        fn create(&mut self, account: NewAccount) -> Result<Account, StoreError> {
            self.inner.create(account)
        }

        fn count(&self) -> Result<usize, StoreError> {
            self.inner.count()
        }

        fn disconnect(&mut self) -> Result<(), StoreError> {
            self.inner.disconnect()
        }
    }

    #[test]
    fn test_duplicate_username_race() {
        let existing =
            NewAccount::admin("admin", "admin@example.com", "hash".into()).into_account();
        let mut store = RacingStore {
            inner: MemoryStore::with_accounts([existing]),
        };

        let result = provision_with(&mut store, &test_config());

        assert!(matches!(
            result,
            Err(ProvisionError::ConstraintViolation(name)) if name == "admin"
        ));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_provision_against_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let uri = dir.path().join("users.json").display().to_string();
        let config = ProvisionConfig::new(uri, SECRET).with_hash_work_factor(4);

        let first = provision(&config).unwrap();
        assert_eq!(first.status, AccountStatus::Created);

        let second = provision(&config).unwrap();
        assert_eq!(second.status, AccountStatus::Reused);
        assert_eq!(second.account.id, first.account.id);
        assert_eq!(
            verify_token(&second.credential.token, SECRET).unwrap().sub,
            first.account.id
        );
    }

    #[test]
    fn test_unreachable_store() {
        let dir = tempfile::tempdir().unwrap();
        let uri = dir
            .path()
            .join("no-such-dir")
            .join("users.json")
            .display()
            .to_string();
        let config = ProvisionConfig::new(uri, SECRET).with_hash_work_factor(4);

        assert!(matches!(
            provision(&config),
            Err(ProvisionError::StoreUnreachable(_))
        ));
        assert!(!dir.path().join("no-such-dir").exists());
    }

    #[test]
    fn test_unsupported_store_is_config_error() {
        let config = ProvisionConfig::new("mongodb://localhost/shop", SECRET);
        assert!(matches!(provision(&config), Err(ProvisionError::Config(_))));
    }
}
