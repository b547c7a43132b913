use clap::{Arg, ArgAction, ArgMatches, Command}; // Builder API for command-line parsing with env fallbacks
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use admin_provisioner::auth::password::read_password;
use admin_provisioner::auth::verify_token;
use admin_provisioner::utils::logging::initialize_logging;
use admin_provisioner::utils::time::{format_duration, format_timestamp, utc_to_local};
use admin_provisioner::{provision, AccountStatus, ProvisionConfig, ProvisionError, ProvisionOutcome};

const TOKEN_DELIMITER: &str = "==================================================";

fn cli() -> Command {
    Command::new("admin-provisioner")
        .about("Ensure an admin account exists and issue a short-lived token for it")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("signing-secret")
                .long("signing-secret")
                .env("JWT_SECRET")
                .hide_env_values(true)
                .global(true)
                .value_name("SECRET")
                .help("Secret used to sign and verify tokens"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .global(true)
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Append logs to this file instead of stderr"),
        )
        .subcommand(
            Command::new("provision")
                .about("Create the admin account if missing, then print a fresh token")
                .arg(
                    Arg::new("store-uri")
                        .long("store-uri")
                        .env("STORE_URI")
                        .required(true)
                        .value_name("URI")
                        .help("Account store: file:///path/users.json, a plain path, or memory://"),
                )
                .arg(
                    Arg::new("username")
                        .long("username")
                        .env("ADMIN_USERNAME")
                        .help("Admin username [default: admin]"),
                )
                .arg(
                    Arg::new("email")
                        .long("email")
                        .env("ADMIN_EMAIL")
                        .help("Email stored on a newly created account [default: admin@example.com]"),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .env("ADMIN_PASSWORD")
                        .hide_env_values(true)
                        .conflicts_with("prompt-password")
                        .help("Password for a newly created account [default: placeholder]"),
                )
                .arg(
                    Arg::new("prompt-password")
                        .long("prompt-password")
                        .action(ArgAction::SetTrue)
                        .help("Read the password from the terminal"),
                )
                .arg(
                    Arg::new("work-factor")
                        .long("work-factor")
                        .env("HASH_WORK_FACTOR")
                        .value_parser(clap::value_parser!(u32))
                        .help("bcrypt cost for hashing the password [default: 10]"),
                )
                .arg(
                    Arg::new("token-validity")
                        .long("token-validity")
                        .env("TOKEN_VALIDITY_SECS")
                        .value_name("SECS")
                        .value_parser(clap::value_parser!(u64))
                        .help("Token lifetime in seconds [default: 28800]"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the result as a single JSON object"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Verify a token and print its claims")
                .arg(Arg::new("token").required(true).help("Token to verify")),
        )
}

fn main() -> ExitCode {
    let matches = cli().get_matches();

    let result = match matches.subcommand() {
        Some((name, sub_matches)) => {
            let log_file = sub_matches.get_one::<PathBuf>("log-file");
            if let Err(e) = initialize_logging(log_file.map(PathBuf::as_path)) {
                eprintln!("Warning: logging is not available: {}", e);
            }

            match name {
                "provision" => run_provision(sub_matches),
                "inspect" => run_inspect(sub_matches),
                other => Err(ProvisionError::Config(format!("unknown command `{}`", other))),
            }
        }
        None => Err(ProvisionError::Config("no command given".to_string())),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_status())
        }
    }
}

/// Assemble the run configuration from arguments and environment
fn build_config(matches: &ArgMatches) -> Result<ProvisionConfig, ProvisionError> {
    let store_uri = matches
        .get_one::<String>("store-uri")
        .cloned()
        .ok_or_else(|| ProvisionError::Config("store URI is required".to_string()))?;
    let signing_secret = matches
        .get_one::<String>("signing-secret")
        .cloned()
        .unwrap_or_default();

    let mut config = ProvisionConfig::new(store_uri, signing_secret);

    if let Some(username) = matches.get_one::<String>("username") {
        config = config.with_username(username);
    }
    if let Some(email) = matches.get_one::<String>("email") {
        config = config.with_email(email);
    }
    if let Some(password) = matches.get_one::<String>("password") {
        config = config.with_password(password);
    }
    if matches.get_flag("prompt-password") {
        config = config.with_password(prompt_password()?);
    }
    if let Some(work_factor) = matches.get_one::<u32>("work-factor") {
        config = config.with_hash_work_factor(*work_factor);
    }
    if let Some(secs) = matches.get_one::<u64>("token-validity") {
        config = config.with_token_validity_secs(*secs);
    }

    Ok(config)
}

fn prompt_password() -> Result<String, ProvisionError> {
    // Prompts go to stderr so stdout stays clean for --json
    eprintln!("Enter admin password:");
    let password = read_password()
        .map_err(|e| ProvisionError::Config(format!("Failed to read password: {}", e)))?;

    eprintln!("Confirm password:");
    let confirm = read_password()
        .map_err(|e| ProvisionError::Config(format!("Failed to read password: {}", e)))?;

    if password != confirm {
        return Err(ProvisionError::Config("Passwords don't match".to_string()));
    }
    Ok(password)
}

fn run_provision(matches: &ArgMatches) -> Result<(), ProvisionError> {
    let config = build_config(matches)?;
    let json = matches.get_flag("json");

    if !json {
        println!("Connecting to account store...");
    }
    let outcome = provision(&config)?;

    let mut stdout = io::stdout().lock();
    let written = if json {
        print_json(&mut stdout, &outcome)
    } else {
        print_human(&mut stdout, &outcome, config.token_validity_secs)
    };
    written.map_err(|e| ProvisionError::Unknown(format!("Failed to write output: {}", e)))
}

fn print_human(
    out: &mut impl Write,
    outcome: &ProvisionOutcome,
    validity_secs: u64,
) -> io::Result<()> {
    writeln!(out, "Connected; store connection released.")?;

    let account = &outcome.account;
    match outcome.status {
        AccountStatus::Reused => writeln!(
            out,
            "Found existing admin account `{}` (id {}); it was left unchanged.",
            account.username, account.id
        )?,
        AccountStatus::Created => writeln!(
            out,
            "Created new admin account `{}` (id {}, role {}).",
            account.username, account.id, account.role
        )?,
    }

    let credential = &outcome.credential;
    writeln!(out)?;
    writeln!(out, "{}", TOKEN_DELIMITER)?;
    writeln!(out, "{}", credential.token)?;
    writeln!(out, "{}", TOKEN_DELIMITER)?;
    writeln!(
        out,
        "Valid for {}, until {} ({})",
        format_duration(validity_secs),
        format_timestamp(credential.expires_at),
        utc_to_local(credential.expires_at)
    )
}

fn print_json(out: &mut impl Write, outcome: &ProvisionOutcome) -> io::Result<()> {
    let account = &outcome.account;
    let credential = &outcome.credential;
    let value = serde_json::json!({
        "status": outcome.status,
        "account": {
            "id": account.id,
            "username": account.username,
            "email": account.email,
            "role": account.role,
        },
        "token": credential.token,
        "issuedAt": credential.issued_at,
        "expiresAt": credential.expires_at,
    });

    serde_json::to_writer_pretty(&mut *out, &value)?;
    writeln!(out)
}

fn run_inspect(matches: &ArgMatches) -> Result<(), ProvisionError> {
    let token = matches
        .get_one::<String>("token")
        .ok_or_else(|| ProvisionError::Config("token is required".to_string()))?;
    let secret = matches
        .get_one::<String>("signing-secret")
        .map(String::as_str)
        .unwrap_or_default();

    let claims = verify_token(token, secret)?;

    println!("Token is valid.");
    println!("Subject: {}", claims.sub);
    println!("Role:    {}", claims.role);
    if let Some(issued) = chrono::DateTime::from_timestamp(claims.iat, 0) {
        println!("Issued:  {}", format_timestamp(issued));
    }
    if let Some(expires) = chrono::DateTime::from_timestamp(claims.exp, 0) {
        println!("Expires: {} ({})", format_timestamp(expires), utc_to_local(expires));
    }
    Ok(())
}
