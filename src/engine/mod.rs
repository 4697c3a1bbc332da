//! Deployment and reset of routing profiles.
//!
//! Both operations are best-effort sequences: every step runs, and each
//! step's outcome lands in a [`Report`] instead of aborting the sequence.

mod deploy;
mod manager;
mod report;
mod reset;
mod status;

pub use manager::Manager;
pub use report::Report;
