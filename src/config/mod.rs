//! Configuration module for the router.
//!
//! Provides CLI argument parsing and routing profile loading.

#[allow(clippy::module_inception)]
mod config;
mod profile;

pub use config::{AppConfig, Command, check_unique_sinks};
pub use profile::{Profile, Role, list_profiles};
