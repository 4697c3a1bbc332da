//! Per-step outcomes of a deploy or reset run.

use serde::Serialize;
use tracing::{error, info, warn};

/// Which operation produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Deploy,
    Reset,
}

/// The object a step works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    VirtualSink,
    MicSink,
    Loopback,
    Playback,
    InputTarget,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::VirtualSink => write!(f, "virtual sink"),
            Stage::MicSink => write!(f, "mic sink"),
            Stage::Loopback => write!(f, "loopback"),
            Stage::Playback => write!(f, "playback"),
            Stage::InputTarget => write!(f, "input target"),
        }
    }
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// A module was loaded (`module` is `None` in dry-run mode)
    Created { name: String, module: Option<u32> },
    /// Nothing to do
    Skipped { reason: String },
    /// A playback stream was moved
    Moved { stream: u32, application: String, sink: String },
    /// A module was unloaded
    Unloaded { module: u32 },
    /// Non-fatal condition worth the operator's attention
    Warning { message: String },
    /// The step failed; later steps still ran
    Failed { error: String },
    /// Instructions for the operator
    Info { message: String },
}

/// One recorded step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub stage: Stage,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Everything a deploy or reset did, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub profile: String,
    pub action: Action,
    pub steps: Vec<Step>,
}

impl Report {
    pub fn new(profile: &str, action: Action) -> Self {
        Self { profile: profile.to_string(), action, steps: Vec::new() }
    }

    pub fn push(&mut self, stage: Stage, outcome: Outcome) {
        self.steps.push(Step { stage, outcome });
    }

    pub(crate) fn failed(&mut self, stage: Stage, error: impl std::fmt::Display) {
        self.push(stage, Outcome::Failed { error: error.to_string() });
    }

    pub(crate) fn warning(&mut self, stage: Stage, message: impl Into<String>) {
        self.push(stage, Outcome::Warning { message: message.into() });
    }

    pub(crate) fn skipped(&mut self, stage: Stage, reason: impl Into<String>) {
        self.push(stage, Outcome::Skipped { reason: reason.into() });
    }

    /// True if any step failed.
    pub fn has_failures(&self) -> bool {
        self.steps.iter().any(|s| matches!(s.outcome, Outcome::Failed { .. }))
    }

    /// True if the sinks and loopback were all set up (created or already present).
    ///
    /// Routing failures do not count: the devices exist and need teardown.
    pub fn devices_ready(&self) -> bool {
        self.action == Action::Deploy
            && !self
                .steps
                .iter()
                .any(|s| matches!(s.stage, Stage::VirtualSink | Stage::MicSink | Stage::Loopback) && matches!(s.outcome, Outcome::Failed { .. }))
    }

    /// Steps of one stage.
    #[cfg(test)]
    pub fn stage(&self, stage: Stage) -> impl Iterator<Item = &Outcome> {
        self.steps.iter().filter(move |s| s.stage == stage).map(|s| &s.outcome)
    }

    /// Log every step at a level matching its outcome.
    pub fn log(&self) {
        for step in &self.steps {
            let stage = step.stage;
            match &step.outcome {
                Outcome::Created { name, module: Some(id) } => info!("  ✅ {}: created {} (module {})", stage, name, id),
                Outcome::Created { name, module: None } => info!("  ✅ {}: created {}", stage, name),
                Outcome::Skipped { reason } => info!("  ⏭️  {}: {}", stage, reason),
                Outcome::Moved { stream, application, sink } => info!("  🔀 {}: moved sink input #{} ({}) to {}", stage, stream, application, sink),
                Outcome::Unloaded { module } => info!("  🗑️  {}: unloaded module {}", stage, module),
                Outcome::Warning { message } => warn!("  ⚠️  {}: {}", stage, message),
                Outcome::Failed { error: e } => error!("  ❌ {}: {}", stage, e),
                Outcome::Info { message } => info!("  🎤 {}: {}", stage, message),
            }
        }
    }
}
