//! Routing profiles loaded from YAML files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Suffix appended to a profile's virtual sink to name its microphone sink.
pub const MIC_SUFFIX: &str = "-mic";

/// Role an application plays in a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Produces audio; its streams are moved to the virtual sink
    Playback,
    /// Consumes audio; selects the virtual microphone as its input
    InputTarget,
}

/// An application named in a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub role: Role,
}

/// A routing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub virtual_sink: String,
    #[serde(default)]
    pub applications: Vec<Application>,
}

impl Profile {
    /// Load and validate a profile from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).with_context(|| format!("Failed to read profile {}", path.display()))?;
        let profile = Self::from_yaml(&data).with_context(|| format!("Failed to parse profile {}", path.display()))?;
        Ok(profile)
    }

    /// Parse and validate a profile from YAML text.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let profile: Profile = serde_yaml::from_str(data)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check fields that end up inside `key=value` module arguments.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Profile name must not be empty");
        }
        if self.virtual_sink.is_empty() {
            anyhow::bail!("Profile '{}' has an empty virtual_sink", self.name);
        }
        if self.virtual_sink.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
            anyhow::bail!("Profile '{}': virtual_sink '{}' must not contain whitespace or quotes", self.name, self.virtual_sink);
        }
        if let Some(app) = self.applications.iter().find(|a| a.name.trim().is_empty()) {
            anyhow::bail!("Profile '{}' has an application with an empty name ({:?})", self.name, app.role);
        }
        Ok(())
    }

    /// Name of the microphone sink, always derived from the virtual sink.
    pub fn mic_sink_name(&self) -> String {
        format!("{}{}", self.virtual_sink, MIC_SUFFIX)
    }

    /// Description shown for the virtual microphone in mixer UIs.
    pub fn mic_description(&self) -> String {
        format!("Virtual Mic ({})", self.name)
    }

    /// Applications with the given role, in declaration order.
    pub fn applications_with(&self, role: Role) -> impl Iterator<Item = &Application> {
        self.applications.iter().filter(move |a| a.role == role)
    }
}

fn is_profile_file(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"))
}

/// List profile file names (`.yaml`/`.yml`) in a directory, sorted.
pub fn list_profiles(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        anyhow::bail!("Profiles directory does not exist: {}", dir.display());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read profiles directory {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file()
            && is_profile_file(&path)
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Check whether a profile file exists in a directory.
pub fn profile_exists(dir: &Path, name: &str) -> bool {
    dir.join(name).is_file()
}

/// Resolve a profile argument to a file path.
///
/// A path that exists is used as given. Otherwise the argument is looked up
/// in `dir`, trying `.yaml` and `.yml` when it has no extension.
pub fn resolve_profile_path(dir: &Path, arg: &str) -> Result<PathBuf> {
    let direct = PathBuf::from(arg);
    if direct.is_file() {
        return Ok(direct);
    }

    if profile_exists(dir, arg) {
        return Ok(dir.join(arg));
    }
    if Path::new(arg).extension().is_none() {
        for ext in ["yaml", "yml"] {
            let candidate = format!("{}.{}", arg, ext);
            if profile_exists(dir, &candidate) {
                return Ok(dir.join(candidate));
            }
        }
    }

    anyhow::bail!("Profile '{}' not found (also looked in {})", arg, dir.display())
}
