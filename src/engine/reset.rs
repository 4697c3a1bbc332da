//! Profile teardown in reverse creation order.

use tracing::info;

use super::manager::{Manager, loopback_args, sink_name_arg};
use super::report::{Action, Outcome, Report, Stage};
use crate::config::Profile;
use crate::pactl::PactlError;

impl Manager {
    /// Remove the loopback, the mic sink, and the virtual sink of a profile.
    ///
    /// Modules are found by their arguments on the live server, never from a
    /// record of what was created. Nothing found is not a failure.
    pub fn reset(&self, profile: &Profile) -> Report {
        info!("🧹 Resetting profile '{}'", profile.name);

        let mut report = Report::new(&profile.name, Action::Reset);
        let mic_sink = profile.mic_sink_name();

        match self.client().get_sink_monitor(&profile.virtual_sink) {
            Ok(monitor) => {
                let pattern = loopback_args(&monitor, &mic_sink);
                let found = self.client().find_modules_matching(&pattern);
                self.unload_all(&mut report, Stage::Loopback, found, &format!("loopback {} -> {}", monitor, mic_sink));
            }
            Err(e) => report.warning(Stage::Loopback, format!("could not determine monitor source, loopback lookup skipped: {}", e)),
        }

        let found = self.client().find_modules_with_argument(&sink_name_arg(&mic_sink));
        self.unload_all(&mut report, Stage::MicSink, found, &format!("mic sink '{}'", mic_sink));

        let found = self.client().find_modules_with_argument(&sink_name_arg(&profile.virtual_sink));
        self.unload_all(&mut report, Stage::VirtualSink, found, &format!("virtual sink '{}'", profile.virtual_sink));

        report
    }

    /// Unload every module of a lookup result.
    fn unload_all(&self, report: &mut Report, stage: Stage, found: Result<Vec<u32>, PactlError>, what: &str) {
        let ids = match found {
            Ok(ids) => ids,
            Err(e) if e.is_not_found() => {
                report.skipped(stage, format!("no modules found for {}", what));
                return;
            }
            Err(e) => {
                report.failed(stage, format!("could not look up modules for {}: {}", what, e));
                return;
            }
        };

        for id in ids {
            match self.client().unload_module(id) {
                Ok(()) => report.push(stage, Outcome::Unloaded { module: id }),
                Err(e) => report.failed(stage, format!("failed to unload module {}: {}", id, e)),
            }
        }
    }
}
