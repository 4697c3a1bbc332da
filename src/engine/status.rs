//! Read-only view of a profile's devices on the live server.

use serde::Serialize;
use tracing::info;

use super::manager::{Manager, loopback_args};
use crate::config::Profile;
use crate::pactl::PactlError;

/// What currently exists for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileStatus {
    pub profile: String,
    pub virtual_sink: bool,
    pub mic_sink: bool,
    /// Loopback modules from the virtual sink's monitor into the mic sink
    pub loopback: Vec<u32>,
    /// Every module whose arguments mention the virtual sink name
    pub related_modules: Vec<u32>,
}

impl ProfileStatus {
    /// True when both sinks and the loopback are present.
    pub fn is_deployed(&self) -> bool {
        self.virtual_sink && self.mic_sink && !self.loopback.is_empty()
    }

    pub fn log(&self) {
        let mark = |present: bool| if present { "✅" } else { "❌" };
        info!("📋 Profile '{}': {}", self.profile, if self.is_deployed() { "deployed" } else { "not deployed" });
        info!("  {} virtual sink", mark(self.virtual_sink));
        info!("  {} mic sink", mark(self.mic_sink));
        info!("  {} loopback {:?}", mark(!self.loopback.is_empty()), self.loopback);
        info!("  modules mentioning the sink: {:?}", self.related_modules);
    }
}

/// Treat "nothing matched" as an empty result.
fn or_empty(found: Result<Vec<u32>, PactlError>) -> Result<Vec<u32>, PactlError> {
    match found {
        Err(e) if e.is_not_found() => Ok(Vec::new()),
        other => other,
    }
}

impl Manager {
    /// Inspect the devices of a profile without changing anything.
    ///
    /// # Errors
    /// Any query failure other than "not found".
    pub fn status(&self, profile: &Profile) -> Result<ProfileStatus, PactlError> {
        let mic_sink = profile.mic_sink_name();
        let virtual_sink = self.client().sink_exists(&profile.virtual_sink)?;
        let mic_sink_present = self.client().sink_exists(&mic_sink)?;

        let loopback = match self.client().get_sink_monitor(&profile.virtual_sink) {
            Ok(monitor) => or_empty(self.client().find_modules_matching(&loopback_args(&monitor, &mic_sink)))?,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e),
        };
        let related_modules = or_empty(self.client().find_modules(&profile.virtual_sink))?;

        Ok(ProfileStatus { profile: profile.name.clone(), virtual_sink, mic_sink: mic_sink_present, loopback, related_modules })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::pactl::fake::FakeServer;
    use crate::pactl::{Client, DEFAULT_PROGRAM};

    fn setup() -> (Arc<FakeServer>, Manager, Profile) {
        let server = Arc::new(FakeServer::new());
        let manager = Manager::new(Client::with_executor(server.clone(), DEFAULT_PROGRAM, false));
        (server, manager, Profile::from_yaml("name: p\nvirtual_sink: out\n").unwrap())
    }

    #[test]
    fn test_status_follows_deploy_and_reset() {
        let (server, manager, profile) = setup();
        let before = manager.status(&profile).unwrap();
        assert!(!before.is_deployed());
        assert!(before.related_modules.is_empty());

        manager.deploy(&profile);
        let deployed = manager.status(&profile).unwrap();
        assert!(deployed.is_deployed());
        assert_eq!(deployed.loopback.len(), 1);
        // Both sinks and the loopback mention "out"
        assert_eq!(deployed.related_modules.len(), 3);

        manager.reset(&profile);
        assert_eq!(manager.status(&profile).unwrap(), before);
        assert_eq!(server.mutations().iter().filter(|c| c.starts_with("unload-module")).count(), 3);
    }

    #[test]
    fn test_status_is_read_only_and_reports_query_failures() {
        let (server, manager, profile) = setup();
        server.add_sink("out");
        let status = manager.status(&profile).unwrap();
        assert!(status.virtual_sink && !status.mic_sink && status.loopback.is_empty());
        assert!(server.mutations().is_empty());

        server.fail_on("list short modules");
        assert!(manager.status(&profile).unwrap_err().is_execution_failure());
    }
}
