use std::sync::Arc;

use anyhow::Result;
use log::debug;

use crate::controller::{AppliedChange, CommitReport, ProgressCallback};

mod apply;
pub mod config;
mod install;
mod list;
mod remove;

pub use apply::apply;
pub use install::install;
pub use list::list;
pub use remove::remove;

/// Splits `name@version` into its parts; a bare `name` has no version.
pub(crate) fn parse_request(spec: &str) -> (&str, Option<&str>) {
    match spec.split_once('@') {
        Some((name, version)) => (name, Some(version)),
        None => (spec, None),
    }
}

/// Prints `[n/total] name` to stderr before each package of a batch.
pub(crate) fn progress_printer() -> ProgressCallback {
    Arc::new(|name: &str, index: usize, total: usize| {
        eprintln!("[{}/{}] {}", index + 1, total, name);
    })
}

pub(crate) fn describe(change: &AppliedChange) -> String {
    match change {
        AppliedChange::Installed {
            name,
            version,
            previous: Some(previous),
        } => format!("Changed {} {} -> {}", name, previous, version),
        AppliedChange::Installed { name, version, .. } => format!("Installed {} {}", name, version),
        AppliedChange::Removed { name, version } => format!("Removed {} {}", name, version),
    }
}

/// Prints what was applied, then surfaces the batch failure (if any) as the
/// command's error.
pub(crate) fn finish(report: CommitReport) -> Result<()> {
    if report.changes.is_empty() && report.is_success() {
        println!("Nothing to do.");
        return Ok(());
    }

    for change in &report.changes {
        println!("{}", describe(change));
    }

    if let Some(failure) = report.failure {
        debug!("{} change(s) saved before the failure", report.changes.len());
        return Err(failure.into());
    }
    Ok(())
}
