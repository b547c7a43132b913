use env_logger::{Builder, Env, Target, WriteStyle};
use log::{info, warn};
use std::fs::OpenOptions;
use std::path::Path;

/// Initialize logging to stderr, or to `log_file` when given. `RUST_LOG`
/// overrides the default `info` level.
pub fn initialize_logging(log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder
        // Enable timestamps
        .format_timestamp_secs()
        // Enable module path in logs
        .format_module_path(true);

    match log_file {
        Some(path) => {
            // Create or append to log file
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .write_style(WriteStyle::Never)
                .target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.write_style(WriteStyle::Auto).target(Target::Stderr);
        }
    }

    builder.try_init()?;
    info!("Logging system initialized");
    Ok(())
}

/// Helper function to format sensitive data for logging
fn format_sensitive(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

/// Structured log line for one step of a provisioning run
pub fn log_provision_event(step: &str, username: &str, success: bool, details: Option<&str>) {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if success {
        info!(
            "Provision event: step={}, user={}, success=true, timestamp={}, details={:?}",
            step,
            format_sensitive(username),
            timestamp,
            details
        );
    } else {
        warn!(
            "Provision event: step={}, user={}, success=false, timestamp={}, details={:?}",
            step,
            format_sensitive(username),
            timestamp,
            details
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sensitive_data_formatting() {
        assert_eq!(format_sensitive("password"), "pa***rd");
        assert_eq!(format_sensitive("key"), "***");
        assert_eq!(format_sensitive("admin"), "ad***in");
        assert_eq!(format_sensitive(""), "");
        // Multi-byte characters are not split
        assert_eq!(format_sensitive("ädmïnö"), "äd***nö");
    }

    #[test]
    fn test_logging_initialization() {
        // Create temporary log file
        let log_file = NamedTempFile::new().unwrap();

        // Configure logging to use temporary file
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file.path())
            .unwrap();

        // Initialize logging
        let result = Builder::new()
            .filter_level(LevelFilter::Info)
            .format_timestamp_secs()
            .target(Target::Pipe(Box::new(file)))
            .try_init();

        // Verify initialization succeeded or logger was already initialized
        assert!(
            result.is_ok()
                || result
                    .unwrap_err()
                    .to_string()
                    .contains("already initialized")
        );
    }
}
