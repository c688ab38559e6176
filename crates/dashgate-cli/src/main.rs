//! dashgate - login bootstrap for the dashboard.
//!
//! Validates the auth secrets, signs the user in, and loads the dashboard
//! prompts. Any bootstrap failure halts the run with a message on stderr.

mod ui;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use dashgate_core::auth::factory::is_placeholder_key;
use dashgate_core::doctor::{run_probes, ProbeReport};
use dashgate_core::prompts::entry_names;
use dashgate_core::{
    authentication_flow, initialize_authenticator, load_prompts, AuthStatus, Bootstrap, Config,
    CookieKeyFallback, CookieKeyring, FileSecretStore, LoginLocation, SessionState,
};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ui::TerminalLoginForm;

/// Initialize the tracing subscriber for logging
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (writer, guard) = tracing_appender::non_blocking(io::stderr());
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();
    guard
}

fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str);
    match command {
        Some("--doctor") => doctor(&config),
        Some("--set-cookie-key") => set_cookie_key(),
        Some("--clear-cookie-key") => {
            CookieKeyring::delete()?;
            println!("Cookie key removed from keychain.");
            Ok(ExitCode::SUCCESS)
        }
        Some("--logout") => logout(&config),
        Some("--sidebar") => render(&mut config, LoginLocation::Sidebar),
        None => render(&mut config, LoginLocation::Main),
        Some(other) => {
            ui::report_error(&format!("Unknown option: {}", other));
            eprintln!("Usage: dashgate [--sidebar | --doctor | --logout | --set-cookie-key | --clear-cookie-key]");
            Ok(ExitCode::from(2))
        }
    }
}

fn secret_store(config: &Config) -> Result<CookieKeyFallback<FileSecretStore>> {
    let path = config.secrets_path()?;
    let keychain_key = match CookieKeyring::get() {
        Ok(key) => Some(key),
        Err(e) => {
            debug!(error = %e, "No cookie key in keychain");
            None
        }
    };
    Ok(CookieKeyFallback::new(FileSecretStore::new(path), keychain_key))
}

/// Validate secrets and build the authenticator, reporting any failure.
fn bootstrap(config: &Config) -> Result<Option<Bootstrap>> {
    let store = secret_store(config)?;
    let cookie_dir = config.cookie_dir()?;

    match initialize_authenticator(&store, &cookie_dir) {
        Ok(bootstrap) => {
            for advisory in &bootstrap.advisories {
                ui::report_warning(&advisory.to_string());
            }
            Ok(Some(bootstrap))
        }
        Err(e) => {
            debug!(error = %e, config_error = e.is_config(), "Authenticator initialization failed");
            ui::report_failure(&e);
            Ok(None)
        }
    }
}

fn render(config: &mut Config, location: LoginLocation) -> Result<ExitCode> {
    info!("dashgate starting");

    let Some(bootstrap) = bootstrap(config)? else {
        return Ok(ExitCode::FAILURE);
    };

    let mut session = SessionState::new();
    let mut form = TerminalLoginForm::new(config.last_username.clone());
    authentication_flow(Some(&bootstrap.authenticator), location, &mut form, &mut session);

    match session.authentication_status {
        AuthStatus::Succeeded => {
            if session.username != config.last_username {
                config.last_username = session.username.clone();
                if let Err(e) = config.save() {
                    warn!(error = %e, "Failed to save config");
                }
            }
            println!("\nWelcome, {}!\n", session.name.as_deref().unwrap_or("user"));
            show_prompts(config.prompts_path())
        }
        AuthStatus::Failed => Ok(ExitCode::FAILURE),
        AuthStatus::Unknown => {
            ui::report_warning("Please enter your username and password");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn show_prompts(path: PathBuf) -> Result<ExitCode> {
    match load_prompts(&path) {
        Ok(document) => {
            let names = entry_names(&document);
            println!("{} prompts available:", names.len());
            for name in names {
                println!("  - {}", name);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            debug!(error = %e, "Failed to load prompts");
            ui::report_failure(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn doctor(config: &Config) -> Result<ExitCode> {
    eprintln!("Checking dashgate environment...\n");

    let store = secret_store(config)?;
    let cookie_dir = config.cookie_dir()?;
    let mut reports = run_probes(&store, &config.prompts_path(), &cookie_dir);

    reports.push(match CookieKeyring::get() {
        Ok(_) => ProbeReport::pass("keychain", "cookie key stored"),
        Err(e) => ProbeReport::pass("keychain", format!("no stored cookie key ({:#})", e)),
    });

    for report in &reports {
        eprintln!("{}", report);
    }

    if reports.iter().all(ProbeReport::passed) {
        eprintln!("\nAll checks passed.");
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn set_cookie_key() -> Result<ExitCode> {
    let key = rpassword::prompt_password("New cookie key: ")
        .context("Failed to read cookie key")?;
    let confirm = rpassword::prompt_password("Confirm cookie key: ")
        .context("Failed to read cookie key")?;

    if key.is_empty() {
        ui::report_error("Cookie key must not be empty");
        return Ok(ExitCode::FAILURE);
    }
    if key != confirm {
        ui::report_error("Cookie keys do not match");
        return Ok(ExitCode::FAILURE);
    }
    if is_placeholder_key(&key) {
        ui::report_warning("That key is a well-known placeholder. Use a unique, strong secret in production.");
    }

    CookieKeyring::store(&key)?;
    println!("Cookie key stored in keychain.");
    Ok(ExitCode::SUCCESS)
}

fn logout(config: &Config) -> Result<ExitCode> {
    let Some(bootstrap) = bootstrap(config)? else {
        return Ok(ExitCode::FAILURE);
    };
    bootstrap.authenticator.logout()?;
    println!("Logged out.");
    Ok(ExitCode::SUCCESS)
}
