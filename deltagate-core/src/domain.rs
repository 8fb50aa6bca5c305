//! Domain value types for delta analysis.
//!
//! Every constructor validates its input and returns either a valid value or
//! [`DeltaGateError::Validation`]. Values are immutable once built.

use std::fmt;

use serde::Serialize;

use crate::error::{DeltaGateError, Result};

/// A single revision identifier, a lowercase hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Commit(String);

impl Commit {
    /// Validate a raw revision string as a commit hash.
    pub fn new(hash: impl Into<String>) -> Result<Self> {
        let hash = hash.into();
        if hash.is_empty() {
            return Err(DeltaGateError::Validation(
                "a commit hash cannot be empty".to_string(),
            ));
        }
        if !hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(DeltaGateError::Validation(format!(
                "the given commit '{hash}' does not represent a valid git hash"
            )));
        }
        Ok(Self(hash))
    }

    /// The commit hash.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered commits analyzed together as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommitSet(Vec<Commit>);

impl CommitSet {
    /// Build a set from one or more explicit commits.
    pub fn new(commits: Vec<Commit>) -> Result<Self> {
        if commits.is_empty() {
            return Err(DeltaGateError::Validation(
                "at least one commit is required".to_string(),
            ));
        }
        Ok(Self(commits))
    }

    /// Build a set holding exactly one commit.
    pub fn single(commit: Commit) -> Self {
        Self(vec![commit])
    }

    /// Build a set from an externally supplied revision range.
    ///
    /// An empty range is valid and means there is nothing to analyze.
    pub fn from_range<S: AsRef<str>>(revisions: &[S]) -> Result<Self> {
        let commits = revisions
            .iter()
            .map(|revision| Commit::new(revision.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(commits))
    }

    /// Commits in their original order.
    pub fn commits(&self) -> &[Commit] {
        &self.0
    }

    /// Number of commits in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty (only possible via [`CommitSet::from_range`]).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Commit hashes joined with `", "`.
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(Commit::value)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Name of a repository known to the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RepositoryRef(String);

impl RepositoryRef {
    /// Validate a repository name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(DeltaGateError::Validation(
                "a repository name must be a non-empty string".to_string(),
            ));
        }
        Ok(Self(name))
    }

    /// The repository name.
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Risk score reported by the service, 0-10 inclusive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RiskClassification(u8);

impl RiskClassification {
    /// Highest risk the service reports.
    pub const MAX: i64 = 10;

    /// Validate a risk score.
    pub fn new(risk: i64) -> Result<Self> {
        if !(0..=Self::MAX).contains(&risk) {
            return Err(DeltaGateError::Validation(format!(
                "risk has to be an ordinal between 0 and {}, got {risk}",
                Self::MAX
            )));
        }
        Ok(Self(risk as u8))
    }

    /// The risk score.
    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Classification tag of a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WarningCategory(String);

impl WarningCategory {
    /// Validate a warning category.
    pub fn new(category: impl Into<String>) -> Result<Self> {
        let category = category.into();
        if category.is_empty() {
            return Err(DeltaGateError::Validation(
                "a warning category must be a non-empty string".to_string(),
            ));
        }
        Ok(Self(category))
    }

    /// The category name.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WarningCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supporting evidence lines for a warning.
///
/// Only the list itself must be non-empty; individual lines pass through
/// unchanged, empty strings included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WarningDetails(Vec<String>);

impl WarningDetails {
    /// Validate a list of warning details.
    pub fn new(details: Vec<String>) -> Result<Self> {
        if details.is_empty() {
            return Err(DeltaGateError::Validation(
                "at least one warning detail is required".to_string(),
            ));
        }
        Ok(Self(details))
    }

    /// Detail lines in order.
    pub fn lines(&self) -> &[String] {
        &self.0
    }
}

/// One finding reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Finding category.
    pub category: WarningCategory,
    /// Evidence for the finding.
    pub details: WarningDetails,
}

impl Warning {
    /// Pair a category with its details.
    pub fn new(category: WarningCategory, details: WarningDetails) -> Self {
        Self { category, details }
    }
}
