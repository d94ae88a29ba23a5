use std::fmt;

use crate::legacy::SkippedRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The legacy file was not found; nothing to migrate.
    SourceMissing,
    Completed,
    /// The file exists but could not be read or parsed at all.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRecord {
    pub key: String,
    pub error: String,
}

/// Outcome of migrating one legacy file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub source: String,
    pub outcome: PassOutcome,
    /// Candidate elements found in the document.
    pub seen: usize,
    pub migrated: usize,
    pub skipped: Vec<SkippedRecord>,
    pub failed: Vec<FailedRecord>,
}

impl PassReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            outcome: PassOutcome::Completed,
            seen: 0,
            migrated: 0,
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn source_missing(source: impl Into<String>) -> Self {
        Self {
            outcome: PassOutcome::SourceMissing,
            ..Self::new(source)
        }
    }

    pub fn failed(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            outcome: PassOutcome::Failed(reason.into()),
            ..Self::new(source)
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, PassOutcome::Failed(_))
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            PassOutcome::SourceMissing => write!(f, "{}: not found, nothing migrated", self.source),
            PassOutcome::Failed(reason) => write!(f, "{}: failed: {}", self.source, reason),
            PassOutcome::Completed => write!(
                f,
                "{}: {} of {} migrated, {} skipped, {} failed",
                self.source,
                self.migrated,
                self.seen,
                self.skipped.len(),
                self.failed.len()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub users: PassReport,
    pub godpacks: PassReport,
}

impl MigrationReport {
    /// Only a pass that could not read its document counts as failure;
    /// skipped and failed records do not.
    pub fn succeeded(&self) -> bool {
        !self.users.is_failed() && !self.godpacks.is_failed()
    }

    pub fn passes(&self) -> [&PassReport; 2] {
        [&self.users, &self.godpacks]
    }
}
