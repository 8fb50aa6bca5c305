//! Build status sink: where the gate's verdict ends up.

use crate::error::Result;
use crate::gate::BuildOutcome;
use crate::report::ReportSection;

/// Receives the aggregated outcome and report sections of a run.
pub trait BuildStatusSink {
    /// Combine `outcome` into the build status and keep `sections` for display.
    fn publish(&mut self, outcome: BuildOutcome, sections: &[ReportSection]) -> Result<()>;
}

/// In-memory build status that only ever escalates.
#[derive(Debug, Clone, Default)]
pub struct BuildStatus {
    current: Option<BuildOutcome>,
    sections: Vec<ReportSection>,
}

impl BuildStatus {
    /// Start from a pre-existing status, if any.
    pub fn new(prior: Option<BuildOutcome>) -> Self {
        Self {
            current: prior,
            sections: Vec::new(),
        }
    }

    /// Current status; `Success` when nothing has been published.
    pub fn outcome(&self) -> BuildOutcome {
        self.current.unwrap_or(BuildOutcome::Success)
    }

    /// Every section published so far.
    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }
}

impl BuildStatusSink for BuildStatus {
    fn publish(&mut self, outcome: BuildOutcome, sections: &[ReportSection]) -> Result<()> {
        let combined = match self.current {
            Some(current) => current.combine(outcome),
            None => outcome,
        };
        self.current = Some(combined);
        self.sections.extend_from_slice(sections);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::AnalysisMode;

    #[test]
    fn starts_from_prior_status() {
        assert_eq!(BuildStatus::new(None).outcome(), BuildOutcome::Success);
        assert_eq!(
            BuildStatus::new(Some(BuildOutcome::Unstable)).outcome(),
            BuildOutcome::Unstable
        );
    }

    #[test]
    fn never_downgrades_prior_failure() {
        let mut status = BuildStatus::new(Some(BuildOutcome::Failed));
        status
            .publish(BuildOutcome::Success, &[])
            .expect("publish");
        assert_eq!(status.outcome(), BuildOutcome::Failed);
    }

    #[test]
    fn escalates_and_keeps_sections() {
        let mut status = BuildStatus::default();
        let section = ReportSection::new(AnalysisMode::BranchDiff, Vec::new());
        status
            .publish(BuildOutcome::Unstable, std::slice::from_ref(&section))
            .expect("publish");
        status
            .publish(BuildOutcome::Success, &[])
            .expect("publish");
        assert_eq!(status.outcome(), BuildOutcome::Unstable);
        assert_eq!(status.sections(), &[section]);
    }
}
