//! Decoding of delta-analysis responses into typed results.
//!
//! Raw JSON stops here: callers only see [`AnalysisResult`].

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{CommitSet, RiskClassification, Warning, WarningCategory, WarningDetails};
use crate::error::{DeltaGateError, Result};

/// The only response schema version this client understands.
pub const SUPPORTED_SCHEMA_VERSION: &str = "1";

/// The service's verdict for one analysis unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Commits the verdict applies to.
    pub commits: CommitSet,
    /// Risk classification.
    pub risk: RiskClassification,
    /// Findings, in the order the service reported them.
    pub warnings: Vec<Warning>,
    /// Result page in the service UI; absolute once returned by the client.
    pub view: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    view: String,
    result: WireResult,
}

#[derive(Debug, Deserialize)]
struct WireResult {
    risk: i64,
    warnings: Vec<WireWarning>,
}

#[derive(Debug, Deserialize)]
struct WireWarning {
    category: String,
    details: Vec<String>,
}

/// Parse a successful response body for `commits`.
///
/// The schema version is checked before anything else, so an unknown
/// version is reported as [`DeltaGateError::UnsupportedSchemaVersion`] even
/// when the rest of the payload is unreadable.
pub fn parse_analysis_result(body: &str, commits: CommitSet) -> Result<AnalysisResult> {
    let value: Value = serde_json::from_str(body).map_err(|err| {
        DeltaGateError::MalformedResponse(format!("response is not valid JSON: {err}"))
    })?;
    if !value.is_object() {
        return Err(DeltaGateError::MalformedResponse(
            "response is not a JSON object".to_string(),
        ));
    }
    let version = match value.get("version") {
        Some(Value::String(version)) => version.clone(),
        Some(other) => {
            return Err(DeltaGateError::MalformedResponse(format!(
                "response version must be a string, got {other}"
            )));
        }
        None => {
            return Err(DeltaGateError::MalformedResponse(
                "response missing version".to_string(),
            ));
        }
    };
    if version != SUPPORTED_SCHEMA_VERSION {
        return Err(DeltaGateError::UnsupportedSchemaVersion(version));
    }

    let wire: WireResponse = serde_json::from_value(value).map_err(|err| {
        DeltaGateError::MalformedResponse(format!("response decode failed: {err}"))
    })?;

    let risk = RiskClassification::new(wire.result.risk)?;
    let warnings = wire
        .result
        .warnings
        .into_iter()
        .map(|warning| {
            Ok(Warning::new(
                WarningCategory::new(warning.category)?,
                WarningDetails::new(warning.details)?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AnalysisResult {
        commits,
        risk,
        warnings,
        view: wire.view,
    })
}

/// Resolve `view` to an absolute URL on the endpoint's scheme, host and port.
///
/// Credentials embedded in the endpoint are not carried over. An absolute
/// `view` URL is returned unchanged.
pub fn resolve_view_url(endpoint: &Url, view: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(view) {
        return Ok(url);
    }
    let path = if view.starts_with('/') {
        view.to_string()
    } else {
        format!("/{view}")
    };
    let mut origin = endpoint.clone();
    origin.set_query(None);
    origin.set_fragment(None);
    origin.set_path("/");
    // drop userinfo
    let _ = origin.set_username("");
    let _ = origin.set_password(None);
    origin.join(&path).map_err(|err| {
        DeltaGateError::MalformedResponse(format!("invalid result view '{view}': {err}"))
    })
}
