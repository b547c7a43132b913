// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{admin, auth, error, store, utils};

// Re-export commonly used types
pub use modules::admin::{provision, provision_with, AccountStatus, ProvisionConfig, ProvisionOutcome};
pub use modules::error::{ProvisionError, StoreError};
pub use modules::store::{StoreConnection, UserStore};

// Defaults for a provisioning run
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "ChangeMe123!";
pub const DEFAULT_HASH_WORK_FACTOR: u32 = 10;
pub const DEFAULT_TOKEN_VALIDITY_SECS: u64 = 8 * 60 * 60;
