//! Error types for sound server control commands.

/// Errors returned by the control client.
///
/// `NotFound` is not a failure in the usual sense: callers use it to pick
/// create-vs-skip, or to treat cleanup of an absent object as done.
#[derive(Debug, thiserror::Error)]
pub enum PactlError {
    /// A lookup or pattern match produced zero results.
    #[error("{what} not found")]
    NotFound {
        /// Human-readable description of what was looked up.
        what: String,
    },

    /// The command ran but the server rejected it.
    #[error("`{command}` failed ({status}): {output}")]
    ExecutionFailure {
        /// Command line that was executed.
        command: String,
        /// Exit status description (e.g. "exit status: 1").
        status: String,
        /// Combined stdout/stderr, trimmed.
        output: String,
    },

    /// The command could not be launched at all.
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A response line did not match the expected grammar.
    #[error("unexpected {field} in line: {line:?}")]
    ParseFailure { field: &'static str, line: String },
}

impl PactlError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        PactlError::NotFound { what: what.into() }
    }

    /// True for the non-fatal "nothing matched" class.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PactlError::NotFound { .. })
    }

    /// True when the external command failed or could not be started.
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, PactlError::ExecutionFailure { .. } | PactlError::Launch { .. })
    }
}

pub type Result<T, E = PactlError> = std::result::Result<T, E>;
