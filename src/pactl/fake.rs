//! In-memory sound server for tests.
//!
//! Answers the subset of `pactl` commands the client issues, with output
//! shaped like the real tool, and records every call.

use std::io;

use parking_lot::Mutex;

use super::executor::{CommandOutput, Executor};

impl CommandOutput {
    fn ok(text: impl Into<String>) -> Self {
        Self { success: true, status: "exit status: 0".to_string(), text: text.into() }
    }

    fn failed(text: impl Into<String>) -> Self {
        Self { success: false, status: "exit status: 1".to_string(), text: text.into() }
    }
}

#[derive(Debug, Clone)]
struct Sink {
    index: u32,
    name: String,
    owner: Option<u32>, // Module that created the sink
}

#[derive(Debug, Clone)]
struct Module {
    id: u32,
    name: String,
    arguments: String,
}

#[derive(Debug, Clone)]
struct Stream {
    id: Option<u32>, // None renders a non-numeric header index
    application_name: Option<String>,
    sink: String,
}

#[derive(Debug, Default)]
struct State {
    sinks: Vec<Sink>,
    modules: Vec<Module>,
    streams: Vec<Stream>,
    calls: Vec<String>,
    failing: Vec<String>,
    next_index: u32,
}

/// Fake server implementing [`Executor`].
#[derive(Debug, Default)]
pub struct FakeServer {
    state: Mutex<State>,
}

impl FakeServer {
    pub fn new() -> Self {
        let server = Self::default();
        server.state.lock().next_index = 20;
        server
    }

    /// Add a sink that was not created through `load-module`.
    pub fn add_sink(&self, name: &str) {
        let mut state = self.state.lock();
        let index = state.bump();
        state.sinks.push(Sink { index, name: name.to_string(), owner: None });
    }

    /// Add a pre-existing module with the given argument string.
    pub fn add_module(&self, name: &str, arguments: &str) -> u32 {
        let mut state = self.state.lock();
        let id = state.bump();
        state.modules.push(Module { id, name: name.to_string(), arguments: arguments.to_string() });
        id
    }

    /// Add a playback stream connected to `sink`.
    pub fn add_stream(&self, id: u32, application_name: Option<&str>, sink: &str) {
        self.state.lock().streams.push(Stream { id: Some(id), application_name: application_name.map(str::to_string), sink: sink.to_string() });
    }

    /// Add a stream whose listing header carries no numeric index.
    pub fn add_unindexed_stream(&self, application_name: &str) {
        self.state.lock().streams.push(Stream { id: None, application_name: Some(application_name.to_string()), sink: "unknown".to_string() });
    }

    /// Make every command starting with `prefix` fail.
    pub fn fail_on(&self, prefix: &str) {
        self.state.lock().failing.push(prefix.to_string());
    }

    /// Every command received, as space-joined arguments.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Received commands other than listings.
    pub fn mutations(&self) -> Vec<String> {
        self.calls().into_iter().filter(|c| !c.starts_with("list")).collect()
    }

    pub fn sink_names(&self) -> Vec<String> {
        self.state.lock().sinks.iter().map(|s| s.name.clone()).collect()
    }

    /// `(id, module name, arguments)` for every loaded module.
    pub fn modules(&self) -> Vec<(u32, String, String)> {
        self.state.lock().modules.iter().map(|m| (m.id, m.name.clone(), m.arguments.clone())).collect()
    }

    /// Sink a stream is currently connected to.
    pub fn stream_sink(&self, id: u32) -> Option<String> {
        self.state.lock().streams.iter().find(|s| s.id == Some(id)).map(|s| s.sink.clone())
    }
}

impl State {
    fn bump(&mut self) -> u32 {
        let n = self.next_index;
        self.next_index += 1;
        n
    }

    fn handle(&mut self, args: &[String]) -> CommandOutput {
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        match argv.as_slice() {
            ["list", "short", "sinks"] => CommandOutput::ok(
                self.sinks.iter().map(|s| format!("{}\t{}\tmodule-null-sink.c\tfloat32le 2ch 48000Hz\tIDLE\n", s.index, s.name)).collect::<String>(),
            ),
            ["list", "sinks"] => CommandOutput::ok(
                self.sinks
                    .iter()
                    .map(|s| format!("Sink #{}\n\tState: IDLE\n\tName: {}\n\tDescription: {}\n\tMonitor Source: {}.monitor\n\tProperties:\n\t\tdevice.class = \"abstract\"\n\n", s.index, s.name, s.name, s.name))
                    .collect::<String>(),
            ),
            ["list", "short", "modules"] => {
                CommandOutput::ok(self.modules.iter().map(|m| format!("{}\t{}\t{}\t\n", m.id, m.name, m.arguments)).collect::<String>())
            }
            ["list", "sink-inputs"] => CommandOutput::ok(
                self.streams
                    .iter()
                    .map(|s| {
                        let index = s.id.map_or_else(|| "n/a".to_string(), |id| id.to_string());
                        let mut block = format!("Sink Input #{}\n\tDriver: protocol-native.c\n\tSink: {}\n\tProperties:\n", index, s.sink);
                        if let Some(name) = &s.application_name {
                            block.push_str(&format!("\t\tapplication.name = \"{}\"\n", name));
                        }
                        block.push_str("\t\tmedia.name = \"Playback\"\n\n");
                        block
                    })
                    .collect::<String>(),
            ),
            ["load-module", module, rest @ ..] => {
                let id = self.bump();
                let arguments = rest.join(" ");
                if *module == "module-null-sink"
                    && let Some(name) = rest.iter().find_map(|a| a.strip_prefix("sink_name="))
                {
                    let index = self.bump();
                    self.sinks.push(Sink { index, name: name.to_string(), owner: Some(id) });
                }
                self.modules.push(Module { id, name: module.to_string(), arguments });
                CommandOutput::ok(format!("{}\n", id))
            }
            ["unload-module", id] => match id.parse::<u32>().ok().and_then(|id| self.modules.iter().position(|m| m.id == id)) {
                Some(pos) => {
                    let module = self.modules.remove(pos);
                    self.sinks.retain(|s| s.owner != Some(module.id));
                    CommandOutput::ok("")
                }
                None => CommandOutput::failed("Failure: No such entity"),
            },
            ["move-sink-input", id, sink] => {
                let sink_known = self.sinks.iter().any(|s| s.name == *sink);
                match id.parse::<u32>().ok().and_then(|id| self.streams.iter_mut().find(|s| s.id == Some(id))) {
                    Some(stream) if sink_known => {
                        stream.sink = sink.to_string();
                        CommandOutput::ok("")
                    }
                    _ => CommandOutput::failed("Failure: No such entity"),
                }
            }
            _ => CommandOutput::failed("No valid command specified."),
        }
    }
}

impl Executor for FakeServer {
    fn run(&self, _program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let mut state = self.state.lock();
        let line = args.join(" ");
        state.calls.push(line.clone());
        if state.failing.iter().any(|prefix| line.starts_with(prefix.as_str())) {
            return Ok(CommandOutput::failed("Failure: Access denied"));
        }
        Ok(state.handle(args))
    }
}
