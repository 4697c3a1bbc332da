//! Application configuration and CLI argument parsing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::profile::{self, Profile};
use crate::pactl::DEFAULT_PROGRAM;

/// Command to run.
#[derive(Subcommand, Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    /// Print the server's sinks, or the devices of the given profiles
    Status {
        /// Profile files, or names inside the profiles directory
        profiles: Vec<String>,
    },
    /// List profile files in the profiles directory
    ListProfiles,
    /// Create the virtual devices of a profile and route its applications
    Setup {
        /// Profile file, or a name inside the profiles directory
        profile: String,
    },
    /// Remove the virtual devices of a profile
    Reset {
        /// Profile file, or a name inside the profiles directory
        profile: String,
    },
    /// Set up profiles, stay in the foreground, and reset them on Ctrl+C/SIGTERM
    Run {
        /// Profile files, or names inside the profiles directory
        #[arg(required = true)]
        profiles: Vec<String>,
    },
}

/// Virtual microphone router configuration.
#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "vmic-router")]
#[command(author, version, about = "Route application audio into a virtual microphone", long_about = None)]
pub struct AppConfig {
    #[command(subcommand)]
    pub command: Command,

    /// Print commands instead of executing them (queries are echoed too)
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Directory containing profile YAML files
    #[arg(long, short = 'd', global = true, env = "VMIC_PROFILES_DIR", default_value_os_t = default_profiles_dir())]
    pub profiles_dir: PathBuf,

    /// Sound server control binary
    #[arg(long, global = true, env = "VMIC_PACTL", default_value = DEFAULT_PROGRAM)]
    pub pactl: String,

    /// Print setup/reset reports as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

impl AppConfig {
    /// Parse configuration from command line arguments.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Profile arguments named by the command, if any.
    pub fn profile_args(&self) -> Vec<&str> {
        match &self.command {
            Command::Setup { profile } | Command::Reset { profile } => vec![profile.as_str()],
            Command::Run { profiles } | Command::Status { profiles } => profiles.iter().map(String::as_str).collect(),
            Command::ListProfiles => Vec::new(),
        }
    }

    /// Resolve and load every profile named by the command.
    pub fn load_profiles(&self) -> Result<Vec<Profile>> {
        self.profile_args()
            .into_iter()
            .map(|arg| {
                let path = profile::resolve_profile_path(&self.profiles_dir, arg)?;
                let abs = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
                info!("Loading profile: {}", abs.display());
                Profile::load(&path)
            })
            .collect()
    }

    /// Validate settings that clap cannot check.
    pub fn validate(&self) -> Result<()> {
        if self.pactl.trim().is_empty() {
            anyhow::bail!("--pactl must not be empty");
        }
        Ok(())
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        info!("Configuration:");
        info!("  Profiles directory: {}", self.profiles_dir.display());
        info!("  Control binary: {}", self.pactl);
        info!("  Dry run: {}", self.dry_run);
        if self.dry_run {
            warn!("Dry run echoes read-only queries as well; existence checks and listings will not reflect the server");
        }
    }
}

/// Reject profiles that share a virtual sink.
///
/// Teardown identifies objects by sink name, so two profiles with the same
/// `virtual_sink` would remove each other's devices.
pub fn check_unique_sinks(profiles: &[Profile]) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for p in profiles {
        if let Some(other) = seen.insert(p.virtual_sink.as_str(), p.name.as_str()) {
            anyhow::bail!("Profiles '{}' and '{}' both use virtual_sink '{}'", other, p.name, p.virtual_sink);
        }
    }
    Ok(())
}

/// Get the default profiles directory.
///
/// `./profiles` when present, otherwise `<config dir>/vmic-router/profiles`.
fn default_profiles_dir() -> PathBuf {
    let local = Path::new("profiles");
    if local.is_dir() {
        return local.to_path_buf();
    }
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("vmic-router").join("profiles")
    } else {
        local.to_path_buf()
    }
}
