#![deny(missing_docs)]
//! Delta-analysis build gate core library.
//!
//! This crate contains the domain types, the remote analysis client and the
//! gating rules that decide whether a build succeeds, turns unstable or fails.

pub mod client;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod gate;
/// Revision range lookup.
pub mod git;
pub mod orchestrator;
pub mod report;
pub mod request;
pub mod response;
pub mod status;

pub use client::{DeltaAnalysisClient, DeltaAnalyzer, analyze};
pub use config::{AnalysisConfig, AnalysisOptions, GatePolicy, RunPlan};
pub use credentials::{
    CredentialResolver, Credentials, DEFAULT_CREDENTIALS_PREFIX, EnvCredentialStore,
};
pub use domain::{
    Commit, CommitSet, RepositoryRef, RiskClassification, Warning, WarningCategory,
    WarningDetails,
};
pub use error::{DeltaGateError, ErrorKind, Result};
pub use gate::{
    AnalysisMode, BuildOutcome, ReportEntry, SkippedMode, UnitFailure, UnitResult, outcome,
};
pub use git::{GitLogRangeProvider, RevisionRangeProvider, parse_revision_lines};
pub use orchestrator::{DeltaGate, RevisionContext};
pub use report::{GateReport, ReportSection, render_gate_markdown, render_gate_text, render_json};
pub use request::AnalysisRequest;
pub use response::{AnalysisResult, parse_analysis_result, resolve_view_url};
pub use status::{BuildStatus, BuildStatusSink};
