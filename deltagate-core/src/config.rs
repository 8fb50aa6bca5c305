//! Immutable configuration values passed into every gate operation.

use std::time::Duration;

use reqwest::Url;

use crate::credentials::Credentials;
use crate::domain::RepositoryRef;
use crate::error::{DeltaGateError, Result};

/// Coupling threshold used when the configured value is out of range.
pub const DEFAULT_COUPLING_THRESHOLD_PERCENT: u8 = 80;
/// Risk threshold used when none is configured.
pub const DEFAULT_RISK_THRESHOLD: u8 = 7;

/// Tunables sent with every analysis request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    coupling_threshold_percent: u8,
    use_biomarkers: bool,
}

impl AnalysisOptions {
    /// Build options; a coupling threshold outside 1-100 falls back to 80.
    pub fn new(coupling_threshold_percent: i64, use_biomarkers: bool) -> Self {
        let coupling_threshold_percent = if (1..=100).contains(&coupling_threshold_percent) {
            coupling_threshold_percent as u8
        } else {
            DEFAULT_COUPLING_THRESHOLD_PERCENT
        };
        Self {
            coupling_threshold_percent,
            use_biomarkers,
        }
    }

    /// Coupling threshold in percent, 1-100.
    pub fn coupling_threshold_percent(&self) -> u8 {
        self.coupling_threshold_percent
    }

    /// Whether the service should use biomarkers.
    pub fn use_biomarkers(&self) -> bool {
        self.use_biomarkers
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            coupling_threshold_percent: DEFAULT_COUPLING_THRESHOLD_PERCENT,
            use_biomarkers: true,
        }
    }
}

/// Everything a single remote analysis call needs.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Delta-analysis endpoint, validated when the call is made.
    pub endpoint: String,
    /// Service user.
    pub credentials: Credentials,
    /// Repository to analyze.
    pub repository: RepositoryRef,
    /// Request tunables.
    pub options: AnalysisOptions,
    /// Request timeout; `None` keeps the transport default.
    pub timeout: Option<Duration>,
}

impl AnalysisConfig {
    /// Build a config with default options and no explicit timeout.
    pub fn new(
        endpoint: impl Into<String>,
        credentials: Credentials,
        repository: RepositoryRef,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            credentials,
            repository,
            options: AnalysisOptions::default(),
            timeout: None,
        }
    }

    /// Replace the request options.
    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    /// Set an explicit request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Parse the configured endpoint.
    pub fn endpoint_url(&self) -> Result<Url> {
        let trimmed = self.endpoint.trim();
        if trimmed.is_empty() {
            return Err(DeltaGateError::Configuration(
                "analysis endpoint url is required".to_string(),
            ));
        }
        let url = Url::parse(trimmed).map_err(|err| {
            DeltaGateError::Configuration(format!(
                "the configured analysis url '{trimmed}' isn't valid: {err}"
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DeltaGateError::Configuration(format!(
                "the configured analysis url '{trimmed}' must use http or https"
            )));
        }
        Ok(url)
    }

    /// Fail fast on configuration that cannot produce a request.
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url().map(|_| ())
    }
}

/// Policy flags deciding how unit results map to a build outcome.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GatePolicy {
    risk_threshold: u8,
    /// Mark the build unstable when a unit reaches the risk threshold.
    pub mark_unstable_on_threshold: bool,
    /// Fail the build (rather than mark it unstable) when an analysis fails.
    pub fail_build_on_failed_analysis: bool,
}

impl GatePolicy {
    /// Build a policy; the risk threshold must lie in 1-10.
    pub fn new(
        risk_threshold: i64,
        mark_unstable_on_threshold: bool,
        fail_build_on_failed_analysis: bool,
    ) -> Result<Self> {
        if !(1..=10).contains(&risk_threshold) {
            return Err(DeltaGateError::Configuration(format!(
                "risk threshold must be between 1 and 10, got {risk_threshold}"
            )));
        }
        Ok(Self {
            risk_threshold: risk_threshold as u8,
            mark_unstable_on_threshold,
            fail_build_on_failed_analysis,
        })
    }

    /// Risk threshold, 1-10.
    pub fn risk_threshold(&self) -> u8 {
        self.risk_threshold
    }
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            mark_unstable_on_threshold: false,
            fail_build_on_failed_analysis: true,
        }
    }
}

/// Which analysis modes run, and from where.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunPlan {
    /// Analyze each new commit on its own.
    pub analyze_individually: bool,
    /// Analyze the whole branch range as one unit.
    pub analyze_branch_diff: bool,
    /// Lower bound of the branch-diff range.
    pub base_revision: Option<String>,
}

impl RunPlan {
    /// Reject a branch-diff plan without a base revision.
    pub fn validate(&self) -> Result<()> {
        let missing_base = self
            .base_revision
            .as_deref()
            .map(|base| base.trim().is_empty())
            .unwrap_or(true);
        if self.analyze_branch_diff && missing_base {
            return Err(DeltaGateError::Configuration(
                "base revision cannot be empty when analyzing the branch diff".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether any mode is enabled.
    pub fn is_enabled(&self) -> bool {
        self.analyze_individually || self.analyze_branch_diff
    }
}
