//! Process execution seam for the control client.

use std::io;
use std::process::Command;

/// Result of running an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,   // Exit status was zero
    pub status: String,  // Exit status description
    pub text: String,    // Combined stdout + stderr
}

/// Runs commands and returns their combined output.
///
/// `Err` means the command could not be launched; a nonzero exit is reported
/// through [`CommandOutput::success`].
pub trait Executor: Send + Sync {
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;
}

/// Executor backed by `std::process::Command`.
///
/// Commands run under the C locale: the listing parsers match untranslated headers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let output = Command::new(program).args(args).env("LC_ALL", "C").output()?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }

        Ok(CommandOutput { success: output.status.success(), status: output.status.to_string(), text })
    }
}
