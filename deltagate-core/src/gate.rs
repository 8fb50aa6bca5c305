//! Risk gating: per-unit results and the build outcome they imply.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::GatePolicy;
use crate::domain::{Commit, RiskClassification, Warning};
use crate::error::{DeltaGateError, ErrorKind};
use crate::response::AnalysisResult;

/// Build verdict, ordered `Success < Unstable < Failed`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    /// Nothing to report.
    Success,
    /// The build completes but is flagged.
    Unstable,
    /// The build fails.
    Failed,
}

impl BuildOutcome {
    /// Most severe of the two; never de-escalates.
    pub fn combine(self, other: Self) -> Self {
        self.max(other)
    }

    /// Human-readable outcome label.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildOutcome::Success => "success",
            BuildOutcome::Unstable => "unstable",
            BuildOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildOutcome {
    type Err = DeltaGateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(BuildOutcome::Success),
            "unstable" => Ok(BuildOutcome::Unstable),
            "failed" | "failure" => Ok(BuildOutcome::Failed),
            other => Err(DeltaGateError::Configuration(format!(
                "unknown build status: {other}"
            ))),
        }
    }
}

/// How revisions are grouped into analysis units.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// One unit per new commit.
    IndividualCommits,
    /// One unit for the whole branch range.
    BranchDiff,
}

impl AnalysisMode {
    /// Report section title.
    pub fn title(&self) -> &'static str {
        match self {
            AnalysisMode::IndividualCommits => "Delta - Individual Commits",
            AnalysisMode::BranchDiff => "Delta - By Branch",
        }
    }
}

/// User-facing summary of one analyzed unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    /// Commit hash or branch name.
    pub title: String,
    /// Whether the commits should be listed under the title.
    pub show_commits: bool,
    /// Analyzed commits.
    pub commits: Vec<Commit>,
    /// Risk reported by the service.
    pub risk: RiskClassification,
    /// Findings reported by the service.
    pub warnings: Vec<Warning>,
    /// Result page in the service UI.
    pub view_url: String,
    /// Risk threshold in force.
    pub threshold: u8,
    /// Whether `risk >= threshold`.
    pub hits_threshold: bool,
}

impl ReportEntry {
    /// Summarize an analysis result.
    pub fn new(
        title: impl Into<String>,
        show_commits: bool,
        result: AnalysisResult,
        threshold: u8,
    ) -> Self {
        let hits_threshold = result.risk.value() >= threshold;
        Self {
            title: title.into(),
            show_commits,
            commits: result.commits.commits().to_vec(),
            risk: result.risk,
            warnings: result.warnings,
            view_url: result.view,
            threshold,
            hits_threshold,
        }
    }

    /// Whether the service reported any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A unit that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitFailure {
    /// Mode the unit belongs to.
    pub mode: AnalysisMode,
    /// Commit, branch or range label.
    pub unit: String,
    /// Error classification.
    pub kind: ErrorKind,
    /// Error message.
    pub message: String,
}

impl UnitFailure {
    /// Record a failed unit.
    pub fn new(mode: AnalysisMode, unit: impl Into<String>, error: &DeltaGateError) -> Self {
        Self {
            mode,
            unit: unit.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// A mode that ran but found nothing to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedMode {
    /// Mode that was skipped.
    pub mode: AnalysisMode,
    /// Why nothing was analyzed.
    pub reason: String,
}

impl SkippedMode {
    /// Record a skipped mode.
    pub fn new(mode: AnalysisMode, reason: impl Into<String>) -> Self {
        Self {
            mode,
            reason: reason.into(),
        }
    }
}

/// Result of one analysis unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitResult {
    /// The service returned a verdict.
    Analyzed(AnalysisMode, ReportEntry),
    /// The unit failed.
    Failed(UnitFailure),
    /// The mode had nothing to analyze.
    Skipped(SkippedMode),
}

/// Outcome contributed by a single unit.
pub fn unit_outcome(unit: &UnitResult, policy: &GatePolicy) -> BuildOutcome {
    match unit {
        UnitResult::Analyzed(_, entry) => {
            if policy.mark_unstable_on_threshold && entry.hits_threshold {
                BuildOutcome::Unstable
            } else {
                BuildOutcome::Success
            }
        }
        UnitResult::Skipped(_) => BuildOutcome::Success,
        UnitResult::Failed(failure) => match failure.kind {
            ErrorKind::RemoteAnalysis | ErrorKind::Transport => {
                if policy.fail_build_on_failed_analysis {
                    BuildOutcome::Failed
                } else {
                    BuildOutcome::Unstable
                }
            }
            ErrorKind::Validation
            | ErrorKind::Configuration
            | ErrorKind::MalformedResponse
            | ErrorKind::UnsupportedSchemaVersion
            | ErrorKind::RevisionRange
            | ErrorKind::Interrupted => BuildOutcome::Failed,
        },
    }
}

/// Aggregate build outcome of all units under `policy`.
///
/// No units means `Success`.
pub fn outcome(units: &[UnitResult], policy: &GatePolicy) -> BuildOutcome {
    units
        .iter()
        .map(|unit| unit_outcome(unit, policy))
        .fold(BuildOutcome::Success, BuildOutcome::combine)
}
