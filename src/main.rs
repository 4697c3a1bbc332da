//! Virtual microphone router.
//!
//! Creates PulseAudio virtual devices so that one application's output can be
//! selected as another application's microphone: a null sink receives the
//! producer's streams, and a loopback copies its monitor into a second null sink
//! whose monitor is offered to the consumer as a recording device.

mod config;
mod engine;
mod pactl;
mod routing;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use parking_lot::Mutex;
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

use config::{AppConfig, Command, Profile};
use engine::{Manager, Report};
use pactl::{Client, PactlError};

/// Exit code when the command ran but some step failed.
const EXIT_STEP_FAILED: i32 = 1;
/// Exit code for invalid settings or a failed server query.
const EXIT_COMMAND_ERROR: i32 = 2;
/// Exit code when a profile could not be loaded.
const EXIT_PROFILE_ERROR: i32 = 3;
/// Exit code when the profiles directory could not be read.
const EXIT_PROFILES_DIR_ERROR: i32 = 4;

/// Print a value as pretty JSON on stdout.
fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => error!("Failed to serialize output: {}", e),
    }
}

/// Print a report as JSON on stdout, or log it step by step.
fn emit_report(report: &Report, json: bool) {
    if json {
        print_json(report);
    } else {
        report.log();
    }
}

/// Log a failed server query and exit.
fn exit_on_query_error(e: &PactlError, program: &str) -> ! {
    error!("❌ {}", e);
    if e.is_execution_failure() {
        warn!("Check that '{}' is installed and the sound server is running", program);
    }
    std::process::exit(EXIT_COMMAND_ERROR);
}

/// Load the profiles named on the command line, exiting on failure.
fn load_profiles_or_exit(config: &AppConfig) -> Vec<Profile> {
    match config.load_profiles() {
        Ok(profiles) => profiles,
        Err(e) => {
            error!("❌ Error loading profile: {:#}", e);
            std::process::exit(EXIT_PROFILE_ERROR);
        }
    }
}

/// Deploy profiles one after another, recording those whose devices are ready.
///
/// # Arguments
/// * `manager` - Profile manager
/// * `profiles` - Profiles to deploy, in order
/// * `deployed` - Shared list of successfully deployed profiles
/// * `shutdown` - Stops before the next profile once set
/// * `json` - Print reports as JSON
fn deploy_all(manager: &Manager, profiles: Vec<Profile>, deployed: &Mutex<Vec<Profile>>, shutdown: &AtomicBool, json: bool) {
    for profile in profiles {
        if shutdown.load(Ordering::SeqCst) {
            debug!("Shutdown requested, not deploying '{}'", profile.name);
            break;
        }

        let report = manager.deploy(&profile);
        emit_report(&report, json);

        if report.devices_ready() {
            info!("✅ Profile '{}' deployed", profile.name);
            deployed.lock().push(profile);
        } else {
            warn!("Profile '{}' was not fully deployed and will not be reset on exit", profile.name);
        }
    }
}

/// Reset deployed profiles in reverse order. Failures are logged, not retried.
fn teardown(manager: &Manager, deployed: &Mutex<Vec<Profile>>, json: bool) {
    let profiles: Vec<Profile> = deployed.lock().drain(..).rev().collect();
    for profile in profiles {
        let report = manager.reset(&profile);
        emit_report(&report, json);
        if report.has_failures() {
            error!("❌ Reset of profile '{}' was incomplete", profile.name);
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn wait_for_shutdown(shutdown: Arc<AtomicBool>) {
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("🛑 Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("🛑 Received SIGTERM, shutting down...");
        }
    }

    shutdown.store(true, Ordering::SeqCst);
}

/// Deploy profiles, stay in the foreground, and reset them on shutdown.
async fn run_foreground(manager: Manager, profiles: Vec<Profile>, json: bool) -> Result<()> {
    let manager = Arc::new(manager);
    let deployed = Arc::new(Mutex::new(Vec::<Profile>::new()));
    let shutdown = Arc::new(AtomicBool::new(false));

    let deploy_handle = {
        let manager = manager.clone();
        let deployed = deployed.clone();
        let shutdown = shutdown.clone();
        tokio::task::spawn_blocking(move || deploy_all(&manager, profiles, &deployed, &shutdown, json))
    };

    info!("Running; press Ctrl+C to remove the virtual devices and exit");
    wait_for_shutdown(shutdown).await;

    // Let the profile being deployed finish so its devices get reset too
    if let Err(e) = deploy_handle.await {
        error!("Deploy task failed: {}", e);
    }

    let count = deployed.lock().len();
    info!("Resetting {} deployed profile(s)", count);
    let teardown_handle = tokio::task::spawn_blocking(move || teardown(&manager, &deployed, json));
    if let Err(e) = teardown_handle.await {
        error!("Teardown task failed: {}", e);
    }

    info!("✅ Router stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let config = AppConfig::from_args();

    // Respect RUST_LOG env var, fallback to verbose flag, default to info.
    // Logs go to stderr so --json output on stdout stays parseable.
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(if config.verbose { "debug" } else { "info" }))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();

    info!("🎚️  vmic-router v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        error!("❌ Configuration error: {}", e);
        std::process::exit(EXIT_COMMAND_ERROR);
    }
    config.log_config();

    let client = Client::new(config.pactl.clone(), config.dry_run);

    match &config.command {
        Command::Status { profiles } if profiles.is_empty() => match client.execute(&["list", "short", "sinks"]) {
            Ok(out) => println!("{}", out.trim_end()),
            Err(e) => exit_on_query_error(&e, &config.pactl),
        },
        Command::Status { .. } => {
            let manager = Manager::new(client);
            for profile in load_profiles_or_exit(&config) {
                match manager.status(&profile) {
                    Ok(status) if config.json => print_json(&status),
                    Ok(status) => status.log(),
                    Err(e) => exit_on_query_error(&e, &config.pactl),
                }
            }
        }
        Command::ListProfiles => match config::list_profiles(&config.profiles_dir) {
            Ok(names) => {
                println!("Available profiles:");
                for name in names {
                    println!(" - {}", name);
                }
            }
            Err(e) => {
                error!("❌ Error reading profiles directory: {}", e);
                std::process::exit(EXIT_PROFILES_DIR_ERROR);
            }
        },
        Command::Setup { .. } | Command::Reset { .. } => {
            let manager = Manager::new(client);
            let mut failed = false;
            for profile in load_profiles_or_exit(&config) {
                let report = match config.command {
                    Command::Reset { .. } => manager.reset(&profile),
                    _ => manager.deploy(&profile),
                };
                emit_report(&report, config.json);
                failed |= report.has_failures();
            }
            if failed {
                std::process::exit(EXIT_STEP_FAILED);
            }
        }
        Command::Run { .. } => {
            let profiles = load_profiles_or_exit(&config);
            if let Err(e) = config::check_unique_sinks(&profiles) {
                error!("❌ {}", e);
                std::process::exit(EXIT_PROFILE_ERROR);
            }
            run_foreground(Manager::new(client), profiles, config.json).await?;
        }
    }

    Ok(())
}
