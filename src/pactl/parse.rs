//! Parsers for the textual listings printed by `pactl`.
//!
//! Two grammars are understood:
//! - short listings (`list short ...`): one record per line, tab-separated columns
//! - verbose listings (`list sinks`, `list sink-inputs`): blocks introduced by a
//!   header line such as `Sink #3`, containing `Key: Value` lines and indented
//!   `key.path = "value"` properties
//!
//! Unknown keys and blocks are ignored. A malformed record is skipped or left
//! partially filled; it never aborts the whole listing.

use serde::Serialize;
use tracing::debug;

use super::error::PactlError;

/// A live playback stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkInput {
    /// `None` when the header index was not a number; such a stream cannot be moved.
    pub id: Option<u32>,
    /// Empty when the stream did not report `application.name`.
    pub application_name: String,
}

/// A loaded module from `list short modules`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    pub id: u32,
    pub name: String,
    pub arguments: String,
}

impl ModuleEntry {
    /// True when the argument string contains every token.
    ///
    /// An empty token list, or any empty token, matches nothing: an empty
    /// pattern would otherwise select every module on the server.
    pub fn matches_all<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        !tokens.is_empty() && tokens.iter().all(|t| !t.as_ref().is_empty() && self.arguments.contains(t.as_ref()))
    }

    /// True when one whitespace-separated argument equals `token` exactly.
    ///
    /// `sink_name=out` matches `sink_name=out` but not `sink_name=out-mic`.
    pub fn has_argument(&self, token: &str) -> bool {
        !token.is_empty() && self.arguments.split_whitespace().any(|a| a == token)
    }
}

/// Split a short listing line into its tab-separated columns.
fn columns(line: &str) -> Vec<&str> {
    line.split('\t').collect()
}

/// True if `list short sinks` output contains a sink named exactly `name`.
pub fn short_sinks_contain(text: &str, name: &str) -> bool {
    text.lines().map(columns).any(|cols| cols.len() >= 2 && cols[1] == name)
}

/// Parse `list short modules` output.
///
/// Lines with fewer than three columns or a non-numeric id are skipped.
pub fn parse_short_modules(text: &str) -> Vec<ModuleEntry> {
    text.lines()
        .filter_map(|line| {
            let cols = columns(line);
            if cols.len() < 3 {
                return None;
            }
            match cols[0].trim().parse::<u32>() {
                Ok(id) => Some(ModuleEntry { id, name: cols[1].to_string(), arguments: cols[2].to_string() }),
                Err(_) => {
                    debug!("{}", PactlError::ParseFailure { field: "module id", line: line.to_string() });
                    None
                }
            }
        })
        .collect()
}

/// One block of a verbose listing.
struct Block<'a> {
    header: &'a str,      // Text after the header prefix (usually the index)
    lines: Vec<&'a str>,  // Body lines, trimmed
}

/// Split verbose output into blocks starting at lines beginning with `prefix`.
///
/// Text before the first header is ignored.
fn blocks<'a>(text: &'a str, prefix: &str) -> Vec<Block<'a>> {
    let mut out: Vec<Block<'a>> = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if let Some(rest) = line.strip_prefix(prefix) {
            out.push(Block { header: rest.trim(), lines: Vec::new() });
        } else if let Some(block) = out.last_mut() {
            block.lines.push(line);
        }
    }
    out
}

/// Value of a `Key: Value` line, if `line` has that key.
fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.strip_prefix(key)?.strip_prefix(':').map(str::trim)
}

/// Value of a `key.path = "value"` property line, unquoted.
fn property<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(key)?.trim_start();
    let value = rest.strip_prefix('=')?.trim();
    Some(value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value))
}

/// Find the `Monitor Source:` of the sink named exactly `name` in `list sinks` output.
pub fn parse_sink_monitor(text: &str, name: &str) -> Option<String> {
    blocks(text, "Sink #")
        .into_iter()
        .find(|block| block.lines.iter().any(|line| field(line, "Name") == Some(name)))
        .and_then(|block| block.lines.iter().find_map(|line| field(line, "Monitor Source")).map(str::to_string))
        .filter(|monitor| !monitor.is_empty())
}

/// Parse `list sink-inputs` output.
///
/// Every header yields one record, whether or not an `application.name`
/// property follows it. A header whose index is not a number still yields a
/// record, with no id.
pub fn parse_sink_inputs(text: &str) -> Vec<SinkInput> {
    blocks(text, "Sink Input #")
        .into_iter()
        .map(|block| {
            let id = block.header.parse::<u32>().ok();
            if id.is_none() {
                debug!("{}", PactlError::ParseFailure { field: "sink input index", line: block.header.to_string() });
            }
            let application_name = block.lines.iter().find_map(|line| property(line, "application.name")).unwrap_or_default().to_string();
            SinkInput { id, application_name }
        })
        .collect()
}

/// Parse the module index printed by `load-module`.
pub fn parse_module_index(text: &str) -> Option<u32> {
    text.trim().parse().ok()
}
