//! Profile deployment: create-if-absent for both sinks and the loopback, then route streams.

use tracing::{debug, info};

use super::manager::{LOOPBACK_LATENCY_ARG, LOOPBACK_MODULE, Manager, NULL_SINK_MODULE, loopback_args, mic_properties_arg, sink_name_arg};
use super::report::{Action, Outcome, Report, Stage};
use crate::config::{Profile, Role};
use crate::routing::match_streams;

impl Manager {
    /// Apply a profile.
    ///
    /// Each step checks the live server immediately before acting, so calling
    /// this twice creates nothing the second time. A failing step is recorded
    /// and the remaining steps still run.
    pub fn deploy(&self, profile: &Profile) -> Report {
        info!("📦 Deploying profile '{}'", profile.name);
        if !profile.description.is_empty() {
            debug!("Description: {}", profile.description);
        }

        let mut report = Report::new(&profile.name, Action::Deploy);
        let mic_sink = profile.mic_sink_name();

        self.ensure_sink(&mut report, Stage::VirtualSink, &profile.virtual_sink, &[]);
        self.ensure_sink(&mut report, Stage::MicSink, &mic_sink, &[mic_properties_arg(profile)]);
        self.ensure_loopback(&mut report, profile, &mic_sink);

        for app in profile.applications_with(Role::Playback) {
            self.route_playback(&mut report, &app.name, &profile.virtual_sink);
        }
        for app in profile.applications_with(Role::InputTarget) {
            report.push(
                Stage::InputTarget,
                Outcome::Info { message: format!("in {}, select \"{}\" ({}.monitor) as the microphone", app.name, profile.mic_description(), mic_sink) },
            );
        }

        report
    }

    /// Create a null sink named `name` unless one already exists.
    fn ensure_sink(&self, report: &mut Report, stage: Stage, name: &str, extra_args: &[String]) {
        match self.client().sink_exists(name) {
            Ok(true) => report.skipped(stage, format!("sink '{}' already exists", name)),
            Ok(false) => {
                let mut args = vec![sink_name_arg(name)];
                args.extend_from_slice(extra_args);
                match self.client().load_module(NULL_SINK_MODULE, args.as_slice()) {
                    Ok(module) => report.push(stage, Outcome::Created { name: name.to_string(), module }),
                    Err(e) => report.failed(stage, format!("failed to create sink '{}': {}", name, e)),
                }
            }
            Err(e) => report.failed(stage, format!("could not check for sink '{}': {}", name, e)),
        }
    }

    /// Create the loopback from the virtual sink's monitor into the mic sink unless present.
    fn ensure_loopback(&self, report: &mut Report, profile: &Profile, mic_sink: &str) {
        let monitor = match self.client().get_sink_monitor(&profile.virtual_sink) {
            Ok(monitor) => monitor,
            Err(e) if e.is_not_found() && self.client().is_dry_run() => {
                report.warning(Stage::Loopback, format!("skipped in dry run: {}", e));
                return;
            }
            Err(e) => {
                report.failed(Stage::Loopback, format!("failed to get monitor source for '{}': {}", profile.virtual_sink, e));
                return;
            }
        };

        let pattern = loopback_args(&monitor, mic_sink);
        match self.client().find_modules_matching(&pattern) {
            Ok(ids) => report.skipped(Stage::Loopback, format!("loopback {} -> {} already exists (module {:?})", monitor, mic_sink, ids)),
            Err(e) if e.is_not_found() => {
                let args = [pattern[0].clone(), pattern[1].clone(), LOOPBACK_LATENCY_ARG.to_string()];
                match self.client().load_module(LOOPBACK_MODULE, &args) {
                    Ok(module) => report.push(Stage::Loopback, Outcome::Created { name: format!("{} -> {}", monitor, mic_sink), module }),
                    Err(e) => report.failed(Stage::Loopback, format!("failed to create loopback: {}", e)),
                }
            }
            Err(e) => report.failed(Stage::Loopback, format!("could not look up loopback modules: {}", e)),
        }
    }

    /// Move every stream of `app` to `sink`.
    fn route_playback(&self, report: &mut Report, app: &str, sink: &str) {
        let streams = match self.client().list_sink_inputs() {
            Ok(streams) => streams,
            Err(e) => {
                report.failed(Stage::Playback, format!("failed to list sink inputs for '{}': {}", app, e));
                return;
            }
        };

        let matched = match_streams(app, &streams);
        if matched.is_empty() {
            report.warning(Stage::Playback, format!("no playback stream found for '{}' (is it playing?)", app));
            return;
        }

        for stream in matched {
            let Some(id) = stream.id else {
                report.warning(Stage::Playback, format!("stream of '{}' has no usable index, not moved", stream.application_name));
                continue;
            };
            match self.client().move_sink_input(id, sink) {
                Ok(()) => report.push(Stage::Playback, Outcome::Moved { stream: id, application: stream.application_name.clone(), sink: sink.to_string() }),
                Err(e) => report.failed(Stage::Playback, format!("failed to move sink input #{} ({}): {}", id, stream.application_name, e)),
            }
        }
    }
}
