//! Control client for a PulseAudio-compatible sound server.
//!
//! Every command goes through [`Client::execute`]. In dry-run mode that gate
//! returns an echo of the command instead of running it, for queries and
//! mutations alike, so queries in dry-run mode observe an empty server.

use std::sync::Arc;

use tracing::{debug, info};

use super::error::{PactlError, Result};
use super::executor::{Executor, SystemExecutor};
use super::parse::{self, ModuleEntry, SinkInput};

/// Default control binary.
pub const DEFAULT_PROGRAM: &str = "pactl";

/// Sound server control client.
#[derive(Clone)]
pub struct Client {
    executor: Arc<dyn Executor>, // Command runner
    program: String,             // Control binary name or path
    dry_run: bool,               // Echo commands instead of running them
}

impl Client {
    /// Create a client that runs real processes.
    ///
    /// # Arguments
    /// * `program` - Control binary (usually `pactl`)
    /// * `dry_run` - Echo commands instead of executing them
    pub fn new(program: impl Into<String>, dry_run: bool) -> Self {
        Self::with_executor(Arc::new(SystemExecutor), program, dry_run)
    }

    /// Create a client with a custom executor.
    pub fn with_executor(executor: Arc<dyn Executor>, program: impl Into<String>, dry_run: bool) -> Self {
        Self { executor, program: program.into(), dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run `<program> <args...>` and return its combined output.
    ///
    /// # Errors
    /// `ExecutionFailure` on a nonzero exit, `Launch` if the process could not start.
    pub fn execute<S: AsRef<str>>(&self, args: &[S]) -> Result<String> {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        let command = format!("{} {}", self.program, args.join(" "));

        if self.dry_run {
            let echo = format!("dry-run: {}", command);
            info!("{}", echo);
            return Ok(echo);
        }

        debug!("Running: {}", command);
        let output = self.executor.run(&self.program, &args).map_err(|source| PactlError::Launch { command: command.clone(), source })?;

        if !output.success {
            return Err(PactlError::ExecutionFailure { command, status: output.status, output: output.text.trim().to_string() });
        }
        Ok(output.text)
    }

    /// Check whether a sink with exactly this name exists.
    ///
    /// An empty listing is `false`, not an error.
    pub fn sink_exists(&self, name: &str) -> Result<bool> {
        let out = self.execute(&["list", "short", "sinks"])?;
        Ok(parse::short_sinks_contain(&out, name))
    }

    /// Get the monitor source name of a sink.
    ///
    /// # Errors
    /// `NotFound` if no sink has this name or it reports no monitor source.
    pub fn get_sink_monitor(&self, name: &str) -> Result<String> {
        let out = self.execute(&["list", "sinks"])?;
        parse::parse_sink_monitor(&out, name).ok_or_else(|| PactlError::not_found(format!("monitor source for sink '{}'", name)))
    }

    /// List live playback streams.
    pub fn list_sink_inputs(&self) -> Result<Vec<SinkInput>> {
        let out = self.execute(&["list", "sink-inputs"])?;
        Ok(parse::parse_sink_inputs(&out))
    }

    /// Move a playback stream to another sink.
    pub fn move_sink_input(&self, id: u32, sink_name: &str) -> Result<()> {
        self.execute(&["move-sink-input", &id.to_string(), sink_name])?;
        Ok(())
    }

    fn list_modules(&self) -> Result<Vec<ModuleEntry>> {
        let out = self.execute(&["list", "short", "modules"])?;
        Ok(parse::parse_short_modules(&out))
    }

    /// Find modules whose argument string contains `substring`.
    ///
    /// # Errors
    /// `NotFound` when nothing matches; callers treat that as "nothing to do".
    pub fn find_modules(&self, substring: &str) -> Result<Vec<u32>> {
        self.find_modules_matching(&[substring])
    }

    /// Find modules with an argument exactly equal to `token` (e.g. `sink_name=out`).
    ///
    /// # Errors
    /// `NotFound` when nothing matches.
    pub fn find_modules_with_argument(&self, token: &str) -> Result<Vec<u32>> {
        let ids: Vec<u32> = self.list_modules()?.into_iter().filter(|m| m.has_argument(token)).map(|m| m.id).collect();

        if ids.is_empty() {
            return Err(PactlError::not_found(format!("modules with argument '{}'", token)));
        }
        Ok(ids)
    }

    /// Find modules whose argument string contains every one of `substrings`.
    ///
    /// # Errors
    /// `NotFound` when nothing matches.
    pub fn find_modules_matching<S: AsRef<str>>(&self, substrings: &[S]) -> Result<Vec<u32>> {
        let ids: Vec<u32> = self.list_modules()?.into_iter().filter(|m| m.matches_all(substrings)).map(|m| m.id).collect();

        if ids.is_empty() {
            let pattern: Vec<&str> = substrings.iter().map(|s| s.as_ref()).collect();
            return Err(PactlError::not_found(format!("modules matching {:?}", pattern)));
        }
        Ok(ids)
    }

    /// Load a module and return its index when the server reports one.
    ///
    /// Dry-run echoes carry no index, so `None` is returned there.
    pub fn load_module<S: AsRef<str>>(&self, module: &str, args: &[S]) -> Result<Option<u32>> {
        let mut argv = vec!["load-module".to_string(), module.to_string()];
        argv.extend(args.iter().map(|a| a.as_ref().to_string()));
        let out = self.execute(argv.as_slice())?;
        Ok(parse::parse_module_index(&out))
    }

    /// Unload a module by index.
    pub fn unload_module(&self, id: u32) -> Result<()> {
        self.execute(&["unload-module", &id.to_string()])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pactl::fake::FakeServer;

    fn client(server: &Arc<FakeServer>) -> Client {
        Client::with_executor(server.clone(), DEFAULT_PROGRAM, false)
    }

    #[test]
    fn test_dry_run_echo() {
        let server = Arc::new(FakeServer::new());
        let c = Client::with_executor(server.clone(), DEFAULT_PROGRAM, true);
        let out = c.execute(&["list", "sinks"]).unwrap();
        assert_eq!(out, "dry-run: pactl list sinks");
        assert!(server.calls().is_empty());
    }

    #[test]
    fn test_dry_run_intercepts_queries() {
        let server = Arc::new(FakeServer::new());
        server.add_sink("already-there");
        let c = Client::with_executor(server.clone(), DEFAULT_PROGRAM, true);
        assert!(!c.sink_exists("already-there").unwrap());
        assert!(c.get_sink_monitor("already-there").unwrap_err().is_not_found());
        assert_eq!(c.load_module("module-null-sink", &["sink_name=x"]).unwrap(), None);
        assert!(server.calls().is_empty());
    }

    #[test]
    fn test_execute_forwards_program_and_args() {
        let server = Arc::new(FakeServer::new());
        client(&server).execute(&["list", "short", "sinks"]).unwrap();
        assert_eq!(server.calls(), vec!["list short sinks".to_string()]);
    }

    #[test]
    fn test_execute_failure_wrapped() {
        let server = Arc::new(FakeServer::new());
        let err = client(&server).execute(&["some", "cmd"]).unwrap_err();
        assert!(err.is_execution_failure());
        assert!(err.to_string().contains("pactl some cmd"));
    }

    #[test]
    fn test_launch_failure() {
        let c = Client::new("/nonexistent/definitely-not-pactl", false);
        let err = c.execute(&["list"]).unwrap_err();
        assert!(matches!(err, PactlError::Launch { .. }));
    }

    #[test]
    fn test_sink_exists_and_monitor() {
        let server = Arc::new(FakeServer::new());
        server.add_sink("speakers");
        let c = client(&server);
        assert!(c.sink_exists("speakers").unwrap());
        assert!(!c.sink_exists("speaker").unwrap());
        assert_eq!(c.get_sink_monitor("speakers").unwrap(), "speakers.monitor");
        assert!(c.get_sink_monitor("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_find_modules_matching_and_semantics() {
        let server = Arc::new(FakeServer::new());
        let c = client(&server);
        let a = c.load_module("module-loopback", &["source=a.monitor", "sink=a-mic"]).unwrap().unwrap();
        c.load_module("module-loopback", &["source=a.monitor", "sink=b-mic"]).unwrap();

        assert_eq!(c.find_modules_matching(&["source=a.monitor", "sink=a-mic"]).unwrap(), vec![a]);
        assert_eq!(c.find_modules("source=a.monitor").unwrap().len(), 2);
        assert!(c.find_modules_matching(&["source=z.monitor", "sink=a-mic"]).unwrap_err().is_not_found());
    }

    #[test]
    fn test_find_modules_with_argument() {
        let server = Arc::new(FakeServer::new());
        let c = client(&server);
        let base = c.load_module("module-null-sink", &["sink_name=out"]).unwrap().unwrap();
        c.load_module("module-null-sink", &["sink_name=out-mic"]).unwrap();

        assert_eq!(c.find_modules("sink_name=out").unwrap().len(), 2);
        assert_eq!(c.find_modules_with_argument("sink_name=out").unwrap(), vec![base]);
        assert!(c.find_modules_with_argument("sink_name=other").unwrap_err().is_not_found());
    }

    #[test]
    fn test_unload_and_move_rejections() {
        let server = Arc::new(FakeServer::new());
        let c = client(&server);
        assert!(c.unload_module(999).unwrap_err().is_execution_failure());
        assert!(c.move_sink_input(5, "nowhere").unwrap_err().is_execution_failure());
    }
}
