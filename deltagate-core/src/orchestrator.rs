//! Gate runner: resolves revision ranges, analyzes each unit and aggregates.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

use crate::client::DeltaAnalyzer;
use crate::config::{GatePolicy, RunPlan};
use crate::domain::{Commit, CommitSet};
use crate::error::{DeltaGateError, ErrorKind, Result};
use crate::gate::{AnalysisMode, ReportEntry, SkippedMode, UnitFailure, UnitResult};
use crate::git::RevisionRangeProvider;
use crate::report::GateReport;

/// Where the build sits in history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionContext {
    /// Last successfully built revision, if known.
    pub previous_commit: Option<String>,
    /// Revision being built.
    pub current_commit: String,
    /// Branch being built, if known.
    pub branch: Option<String>,
}

impl RevisionContext {
    /// Context for `current_commit` with no history or branch.
    pub fn new(current_commit: impl Into<String>) -> Self {
        Self {
            previous_commit: None,
            current_commit: current_commit.into(),
            branch: None,
        }
    }

    /// Set the last successfully built revision.
    pub fn with_previous_commit(mut self, previous: impl Into<String>) -> Self {
        self.previous_commit = Some(previous.into());
        self
    }

    /// Set the branch name.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }
}

/// Runs the configured analysis modes against one analyzer.
pub struct DeltaGate<'a> {
    analyzer: &'a dyn DeltaAnalyzer,
    revisions: &'a dyn RevisionRangeProvider,
    plan: RunPlan,
    policy: GatePolicy,
    interrupt: Option<&'a AtomicBool>,
}

impl<'a> DeltaGate<'a> {
    /// Build a gate; the plan is validated before anything runs.
    pub fn new(
        analyzer: &'a dyn DeltaAnalyzer,
        revisions: &'a dyn RevisionRangeProvider,
        plan: RunPlan,
        policy: GatePolicy,
    ) -> Result<Self> {
        plan.validate()?;
        Ok(Self {
            analyzer,
            revisions,
            plan,
            policy,
            interrupt: None,
        })
    }

    /// Stop starting new units once `flag` is set.
    pub fn with_interrupt(mut self, flag: &'a AtomicBool) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Run every enabled mode and aggregate the results.
    ///
    /// Per-unit errors are recorded in the report, never returned.
    pub fn run(&self, context: &RevisionContext) -> GateReport {
        let mut units = Vec::new();
        if self.plan.analyze_individually {
            self.run_individual(context, &mut units);
        }
        if self.plan.analyze_branch_diff && !interrupted(&units) {
            self.run_branch_diff(context, &mut units);
        }
        GateReport::from_units(units, &self.policy)
    }

    fn run_individual(&self, context: &RevisionContext, units: &mut Vec<UnitResult>) {
        let mode = AnalysisMode::IndividualCommits;
        let Some(previous) = context.previous_commit.as_deref() else {
            skip(
                mode,
                "No previous successful commit is known; skipping individual commit analysis.",
                units,
            );
            return;
        };
        let revisions = match self.revisions.revisions(previous, &context.current_commit) {
            Ok(revisions) => revisions,
            Err(err) => {
                let unit = format!("{previous}..{}", context.current_commit);
                warn!("Failed to list revisions {unit}: {err}");
                units.push(UnitResult::Failed(UnitFailure::new(mode, unit, &err)));
                return;
            }
        };
        if revisions.is_empty() {
            skip(mode, "No new commits to analyze individually for this build.", units);
            return;
        }
        for revision in revisions {
            if self.check_interrupt(mode, &revision, units) {
                return;
            }
            let result = Commit::new(revision.as_str()).and_then(|commit| {
                let commits = CommitSet::single(commit);
                self.analyze_unit(mode, revision.clone(), false, &commits)
            });
            units.push(result.unwrap_or_else(|err| {
                UnitResult::Failed(UnitFailure::new(mode, revision.as_str(), &err))
            }));
        }
    }

    fn run_branch_diff(&self, context: &RevisionContext, units: &mut Vec<UnitResult>) {
        let mode = AnalysisMode::BranchDiff;
        let base = self.plan.base_revision.as_deref().unwrap_or_default().trim();
        let range_label = format!("{base}..{}", context.current_commit);
        let revisions = match self.revisions.revisions(base, &context.current_commit) {
            Ok(revisions) => revisions,
            Err(err) => {
                warn!("Failed to list revisions {range_label}: {err}");
                units.push(UnitResult::Failed(UnitFailure::new(mode, range_label, &err)));
                return;
            }
        };
        if revisions.is_empty() {
            skip(mode, "No new commits to analyze on the branch for this build.", units);
            return;
        }
        let label = context.branch.clone().unwrap_or_else(|| range_label.clone());
        if self.check_interrupt(mode, &label, units) {
            return;
        }
        let result = CommitSet::from_range(&revisions).and_then(|commits| {
            let title = context
                .branch
                .clone()
                .unwrap_or_else(|| commits.joined());
            self.analyze_unit(mode, title, true, &commits)
        });
        units.push(
            result.unwrap_or_else(|err| UnitResult::Failed(UnitFailure::new(mode, label, &err))),
        );
    }

    fn analyze_unit(
        &self,
        mode: AnalysisMode,
        title: String,
        show_commits: bool,
        commits: &CommitSet,
    ) -> Result<UnitResult> {
        info!(
            "Starting delta analysis on {} commit(s): {}",
            commits.len(),
            commits.joined()
        );
        let result = self.analyzer.analyze(commits).inspect_err(|err| {
            warn!("Delta analysis of {title} failed: {err}");
        })?;
        let entry = ReportEntry::new(title, show_commits, result, self.policy.risk_threshold());
        if entry.hits_threshold {
            warn!(
                "Delta analysis of {}: risk {} hits the threshold {}",
                entry.title,
                entry.risk.value(),
                entry.threshold
            );
        } else {
            info!(
                "Delta analysis of {}: risk {}",
                entry.title,
                entry.risk.value()
            );
        }
        Ok(UnitResult::Analyzed(mode, entry))
    }

    fn check_interrupt(
        &self,
        mode: AnalysisMode,
        unit: &str,
        units: &mut Vec<UnitResult>,
    ) -> bool {
        let Some(flag) = self.interrupt else {
            return false;
        };
        if !flag.load(Ordering::SeqCst) {
            return false;
        }
        if !interrupted(units) {
            warn!("Interrupted before analyzing {unit}; remaining units are skipped.");
            units.push(UnitResult::Failed(UnitFailure::new(
                mode,
                unit,
                &DeltaGateError::Interrupted,
            )));
        }
        true
    }
}

fn skip(mode: AnalysisMode, reason: &str, units: &mut Vec<UnitResult>) {
    info!("{reason}");
    units.push(UnitResult::Skipped(SkippedMode::new(mode, reason)));
}

fn interrupted(units: &[UnitResult]) -> bool {
    units.iter().any(|unit| {
        matches!(unit, UnitResult::Failed(failure) if failure.kind == ErrorKind::Interrupted)
    })
}
