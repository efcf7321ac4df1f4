/// Core types and structures for the robograde system
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Score every report starts from before penalties are applied.
pub const MAX_SCORE: i32 = 100;

/// Checker stage that produced a finding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Missing manifest or build descriptor
    Structure,
    /// Output of the external lint tool
    Syntax,
    /// Unbounded loop without a sleep-like call
    Safety,
}

/// One (category, message, penalty) triple produced by a checker stage
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,
    pub message: String,
    /// Points subtracted from the score; zero for advisories
    pub penalty: u32,
}

impl Finding {
    pub fn new(category: Category, message: impl Into<String>, penalty: u32) -> Self {
        Self {
            category,
            message: message.into(),
            penalty,
        }
    }

    /// Zero-penalty finding, used when a file could not be analyzed at all
    pub fn advisory(category: Category, message: impl Into<String>) -> Self {
        Self::new(category, message, 0)
    }
}

/// Scored grading report handed back to callers as JSON.
///
/// Findings are appended through [`Report::record`], which only ever lowers
/// the score. [`Report::finalize`] clamps the score at zero and consumes the
/// builder so the returned value cannot be changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub score: i32,
    pub structure_errors: Vec<String>,
    pub syntax_warnings: Vec<String>,
    pub safety_warnings: Vec<String>,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            score: MAX_SCORE,
            structure_errors: Vec::new(),
            syntax_warnings: Vec::new(),
            safety_warnings: Vec::new(),
        }
    }
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finding to its category list and subtract its penalty
    pub fn record(&mut self, finding: Finding) {
        self.score -= finding.penalty as i32;
        match finding.category {
            Category::Structure => self.structure_errors.push(finding.message),
            Category::Syntax => self.syntax_warnings.push(finding.message),
            Category::Safety => self.safety_warnings.push(finding.message),
        }
    }

    pub fn record_all<I>(&mut self, findings: I)
    where
        I: IntoIterator<Item = Finding>,
    {
        for finding in findings {
            self.record(finding);
        }
    }

    /// Clamp the score to `[0, 100]` and freeze the report
    pub fn finalize(mut self) -> Report {
        self.score = self.score.clamp(0, MAX_SCORE);
        self
    }

    /// Report returned when no directory in the upload carries a manifest
    pub fn no_package(manifest: &str) -> Report {
        Report {
            score: 0,
            structure_errors: vec![format!(
                "No {} found. Is this a valid ROS 2 package?",
                manifest
            )],
            syntax_warnings: Vec::new(),
            safety_warnings: Vec::new(),
        }
    }

    pub fn total_findings(&self) -> usize {
        self.structure_errors.len() + self.syntax_warnings.len() + self.safety_warnings.len()
    }
}

/// Error types for robograde
#[derive(Error, Debug)]
pub enum GradeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Submission error: {0}")]
    Submission(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error("Build failed: {0}")]
    Build(String),

    #[error("Workspace {0} is held by another session")]
    WorkspaceBusy(String),
}

pub type Result<T> = std::result::Result<T, GradeError>;
