//! Wire request for the delta-analysis endpoint.

use serde::{Deserialize, Serialize};

use crate::config::AnalysisOptions;
use crate::domain::{CommitSet, RepositoryRef};
use crate::error::{DeltaGateError, Result};

/// JSON body posted to the analysis service.
///
/// Field order is the wire key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    commits: Vec<String>,
    repository: String,
    coupling_threshold_percent: u8,
    use_biomarkers: bool,
}

impl AnalysisRequest {
    /// Build the request for one analysis unit.
    pub fn new(
        commits: &CommitSet,
        repository: &RepositoryRef,
        options: &AnalysisOptions,
    ) -> Self {
        Self {
            commits: commits
                .commits()
                .iter()
                .map(|commit| commit.value().to_string())
                .collect(),
            repository: repository.value().to_string(),
            coupling_threshold_percent: options.coupling_threshold_percent(),
            use_biomarkers: options.use_biomarkers(),
        }
    }

    /// Commit hashes in request order.
    pub fn commits(&self) -> &[String] {
        &self.commits
    }

    /// Repository name.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Serialize to the compact wire form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|err| {
            DeltaGateError::Validation(format!("request serialization failed: {err}"))
        })
    }
}
