pub mod config;
mod setup;

pub use config::ProvisionConfig;
pub use setup::{provision, provision_with, AccountStatus, ProvisionOutcome};
