use crate::error::{Error, Result};

/// A change that reached the persisted manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedChange {
    Installed {
        name: String,
        version: String,
        previous: Option<String>,
    },
    Removed {
        name: String,
        version: String,
    },
}

impl AppliedChange {
    pub fn name(&self) -> &str {
        match self {
            AppliedChange::Installed { name, .. } | AppliedChange::Removed { name, .. } => name,
        }
    }
}

/// Outcome of one commit batch.
///
/// `changes` are durable even when `failure` is set: the batch stops at the
/// first failing package and everything before it is persisted.
#[derive(Debug, Default)]
pub struct CommitReport {
    pub changes: Vec<AppliedChange>,
    pub failure: Option<Error>,
}

impl CommitReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failed_package(&self) -> Option<&str> {
        self.failure.as_ref().and_then(Error::package)
    }

    pub fn into_result(self) -> Result<Vec<AppliedChange>> {
        match self.failure {
            Some(error) => Err(error),
            None => Ok(self.changes),
        }
    }
}
