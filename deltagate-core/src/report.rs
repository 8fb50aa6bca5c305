//! Report types and formatting for gate runs.

use std::fmt::Write;

use serde::Serialize;

use crate::config::GatePolicy;
use crate::gate::{
    AnalysisMode, BuildOutcome, ReportEntry, SkippedMode, UnitFailure, UnitResult, outcome,
};

/// Entries produced by one analysis mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSection {
    /// Mode that produced the entries.
    pub mode: AnalysisMode,
    /// Section heading.
    pub title: String,
    /// Analyzed units in processing order.
    pub entries: Vec<ReportEntry>,
}

impl ReportSection {
    /// Create a section titled after `mode`.
    pub fn new(mode: AnalysisMode, entries: Vec<ReportEntry>) -> Self {
        Self {
            mode,
            title: mode.title().to_string(),
            entries,
        }
    }
}

/// Everything a gate run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateReport {
    /// Aggregated outcome of all units.
    pub outcome: BuildOutcome,
    /// Analyzed units grouped by mode.
    pub sections: Vec<ReportSection>,
    /// Units that could not be analyzed.
    pub failures: Vec<UnitFailure>,
    /// Modes that had nothing to analyze.
    pub skipped: Vec<SkippedMode>,
}

impl GateReport {
    /// Aggregate unit results under `policy`.
    pub fn from_units(units: Vec<UnitResult>, policy: &GatePolicy) -> Self {
        let outcome = outcome(&units, policy);
        let mut sections: Vec<ReportSection> = Vec::new();
        let mut failures = Vec::new();
        let mut skipped = Vec::new();
        for unit in units {
            match unit {
                UnitResult::Analyzed(mode, entry) => {
                    match sections.iter_mut().find(|section| section.mode == mode) {
                        Some(section) => section.entries.push(entry),
                        None => sections.push(ReportSection::new(mode, vec![entry])),
                    }
                }
                UnitResult::Failed(failure) => failures.push(failure),
                UnitResult::Skipped(skip) => skipped.push(skip),
            }
        }
        Self {
            outcome,
            sections,
            failures,
            skipped,
        }
    }

    /// Whether no unit was analyzed or failed.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.failures.is_empty()
    }
}

/// Render a gate report as Markdown.
pub fn render_gate_markdown(report: &GateReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Delta Analysis Report\n");
    let _ = writeln!(output, "- Outcome: {}\n", report.outcome);
    if report.is_empty() {
        let _ = writeln!(output, "No commits were analyzed.\n");
    }
    for skip in &report.skipped {
        let _ = writeln!(output, "- {}: {}", skip.mode.title(), skip.reason);
    }
    if !report.skipped.is_empty() {
        let _ = writeln!(output);
    }
    for section in &report.sections {
        let _ = writeln!(output, "## {}\n", section.title);
        for entry in &section.entries {
            append_entry_markdown(&mut output, entry);
        }
    }
    if !report.failures.is_empty() {
        let _ = writeln!(output, "## Failed analyses\n");
        for failure in &report.failures {
            let _ = writeln!(
                output,
                "- [{}] {}: {} ({})",
                failure.mode.title(),
                failure.unit,
                failure.message,
                failure.kind.as_str()
            );
        }
        let _ = writeln!(output);
    }
    output
}

/// Render a gate report as plain text.
pub fn render_gate_text(report: &GateReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Outcome: {}", report.outcome);
    if report.is_empty() {
        let _ = writeln!(output, "No commits were analyzed.");
    }
    for skip in &report.skipped {
        let _ = writeln!(output, "{}: {}", skip.mode.title(), skip.reason);
    }
    for section in &report.sections {
        let _ = writeln!(output);
        let _ = writeln!(output, "{}", section.title);
        for entry in &section.entries {
            let marker = if entry.hits_threshold {
                " (hits risk threshold)"
            } else {
                ""
            };
            let _ = writeln!(
                output,
                "  {}: risk {}/{}{marker}",
                entry.title,
                entry.risk.value(),
                entry.threshold
            );
            if entry.show_commits {
                for commit in &entry.commits {
                    let _ = writeln!(output, "    commit {commit}");
                }
            }
            for warning in &entry.warnings {
                let _ = writeln!(output, "    warning: {}", warning.category);
                for detail in warning.details.lines() {
                    let _ = writeln!(output, "      - {detail}");
                }
            }
            let _ = writeln!(output, "    details: {}", entry.view_url);
        }
    }
    if !report.failures.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Failed analyses");
        for failure in &report.failures {
            let _ = writeln!(
                output,
                "  {} [{}]: {}",
                failure.unit,
                failure.mode.title(),
                failure.message
            );
        }
    }
    output
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

fn append_entry_markdown(output: &mut String, entry: &ReportEntry) {
    let _ = writeln!(output, "### {}\n", entry.title);
    let _ = writeln!(
        output,
        "- Risk: {} (threshold {})",
        entry.risk.value(),
        entry.threshold
    );
    if entry.hits_threshold {
        let _ = writeln!(output, "- Hits the risk threshold");
    }
    let _ = writeln!(output, "- Details: <{}>", entry.view_url);
    if entry.show_commits {
        let commits: Vec<String> = entry
            .commits
            .iter()
            .map(|commit| format!("`{commit}`"))
            .collect();
        let _ = writeln!(output, "- Commits: {}", commits.join(", "));
    }
    let _ = writeln!(output);
    if !entry.has_warnings() {
        let _ = writeln!(output, "No warnings.\n");
        return;
    }
    let _ = writeln!(output, "#### Warnings");
    for warning in &entry.warnings {
        let _ = writeln!(output, "- {}", warning.category);
        for detail in warning.details.lines() {
            let _ = writeln!(output, "  - {detail}");
        }
    }
    let _ = writeln!(output);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommitSet, RiskClassification, Warning, WarningCategory, WarningDetails};
    use crate::error::DeltaGateError;
    use crate::response::AnalysisResult;

    fn entry(title: &str, risk: i64, show_commits: bool) -> ReportEntry {
        let result = AnalysisResult {
            commits: CommitSet::from_range(&["b75943ac5", "9822ac"]).expect("commits"),
            risk: RiskClassification::new(risk).expect("risk"),
            warnings: vec![Warning::new(
                WarningCategory::new("Degrades in Code Health").expect("category"),
                WarningDetails::new(vec!["src/app.rs".to_string()]).expect("details"),
            )],
            view: "https://codescene.example.com/1/delta/3".to_string(),
        };
        ReportEntry::new(title, show_commits, result, 7)
    }

    fn sample_report() -> GateReport {
        let units = vec![
            UnitResult::Analyzed(AnalysisMode::IndividualCommits, entry("b75943ac5", 3, false)),
            UnitResult::Failed(UnitFailure::new(
                AnalysisMode::IndividualCommits,
                "9822ac",
                &DeltaGateError::Transport("connection refused".to_string()),
            )),
            UnitResult::Analyzed(AnalysisMode::BranchDiff, entry("feature/login", 8, true)),
        ];
        GateReport::from_units(units, &GatePolicy::new(7, true, false).expect("policy"))
    }

    #[test]
    fn groups_entries_by_mode() {
        let report = sample_report();
        assert_eq!(report.outcome, BuildOutcome::Unstable);
        assert_eq!(report.sections.len(), 2);
        assert_eq!(report.sections[0].title, "Delta - Individual Commits");
        assert_eq!(report.sections[1].title, "Delta - By Branch");
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn renders_markdown() {
        let output = render_gate_markdown(&sample_report());
        assert!(output.contains("# Delta Analysis Report"));
        assert!(output.contains("Outcome: unstable"));
        assert!(output.contains("### feature/login"));
        assert!(output.contains("Hits the risk threshold"));
        assert!(output.contains("`b75943ac5`, `9822ac`"));
        assert!(output.contains("- Degrades in Code Health"));
        assert!(output.contains("connection refused"));
    }

    #[test]
    fn renders_text() {
        let output = render_gate_text(&sample_report());
        assert!(output.contains("b75943ac5: risk 3/7\n"));
        assert!(output.contains("feature/login: risk 8/7 (hits risk threshold)"));
        assert!(output.contains("commit 9822ac"));
        assert!(output.contains("details: https://codescene.example.com/1/delta/3"));
    }

    #[test]
    fn renders_skipped_modes() {
        let units = vec![UnitResult::Skipped(SkippedMode::new(
            AnalysisMode::IndividualCommits,
            "No new commits to analyze individually for this build.",
        ))];
        let report = GateReport::from_units(units, &GatePolicy::default());
        assert!(report.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert!(render_gate_text(&report).contains(
            "Delta - Individual Commits: No new commits to analyze individually for this build."
        ));
        assert!(render_gate_markdown(&report).contains("- Delta - Individual Commits: No new"));
        let parsed: serde_json::Value =
            serde_json::from_str(&render_json(&report).expect("json")).expect("parse");
        assert_eq!(parsed["skipped"][0]["mode"], "individual_commits");
    }

    #[test]
    fn renders_empty_report() {
        let report = GateReport::from_units(Vec::new(), &GatePolicy::default());
        assert!(render_gate_text(&report).contains("No commits were analyzed."));
        assert!(render_gate_markdown(&report).contains("Outcome: success"));
    }

    #[test]
    fn renders_json_payload() {
        let json = render_json(&sample_report()).expect("json");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed["outcome"], "unstable");
        assert_eq!(parsed["sections"][1]["entries"][0]["hitsThreshold"], true);
        assert_eq!(parsed["sections"][1]["entries"][0]["risk"], 8);
        assert_eq!(parsed["failures"][0]["kind"], "transport");
        assert_eq!(
            parsed["sections"][0]["entries"][0]["warnings"][0]["details"][0],
            "src/app.rs"
        );
    }
}
