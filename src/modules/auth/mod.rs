pub mod store;
pub mod password;
pub mod tokens;

// Re-export the main types and functions
pub use store::{Account, NewAccount, Role};
pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use tokens::{issue_credential, verify_token, Claims, Credential};
