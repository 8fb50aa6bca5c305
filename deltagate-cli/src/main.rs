#![deny(missing_docs)]
//! Delta-analysis build gate command-line interface.
//!
//! Runs delta analyses for the commits of a build and exits with the
//! resulting build status.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use deltagate_core::{
    AnalysisConfig, AnalysisOptions, AnalysisRequest, BuildOutcome, BuildStatus, BuildStatusSink,
    CommitSet, CredentialResolver, Credentials, DeltaAnalysisClient, DeltaGate, DeltaGateError,
    EnvCredentialStore, GatePolicy, GateReport, GitLogRangeProvider, RepositoryRef,
    RevisionContext, RunPlan, render_gate_markdown, render_gate_text, render_json,
};
use dotenvy::dotenv;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "deltagate", version, about = "Delta-analysis build gate")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug)]
struct RequestOptionArgs {
    /// Repository name known to the analysis service.
    #[arg(long, env = "DELTAGATE_REPOSITORY")]
    repository: String,
    /// Change coupling threshold in percent (1-100; out of range falls back to 80).
    #[arg(long, env = "DELTAGATE_COUPLING_THRESHOLD_PERCENT", default_value_t = 80)]
    coupling_threshold_percent: i64,
    /// Ask the service to use biomarkers.
    #[arg(
        long,
        env = "DELTAGATE_USE_BIOMARKERS",
        action = ArgAction::Set,
        default_value_t = true
    )]
    use_biomarkers: bool,
}

#[derive(Args, Clone, Debug)]
struct ServiceArgs {
    /// Delta-analysis endpoint URL.
    #[arg(long, env = "DELTAGATE_URL")]
    url: String,
    /// Service user name.
    #[arg(long, env = "DELTAGATE_USERNAME")]
    username: Option<String>,
    /// Service user password.
    #[arg(long, env = "DELTAGATE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Credential id resolved from DELTAGATE_CREDENTIALS_<ID>_USERNAME/PASSWORD.
    #[arg(long, env = "DELTAGATE_CREDENTIALS_ID", conflicts_with_all = ["username", "password"])]
    credentials_id: Option<String>,
    /// Request timeout in seconds.
    #[arg(long, env = "DELTAGATE_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

#[derive(Args, Clone, Debug)]
struct GateArgs {
    /// Risk threshold (1-10).
    #[arg(long, env = "DELTAGATE_RISK_THRESHOLD", default_value_t = 7)]
    risk_threshold: i64,
    /// Mark the build unstable when a unit reaches the risk threshold.
    #[arg(long, env = "DELTAGATE_MARK_UNSTABLE")]
    mark_unstable_on_threshold: bool,
    /// Fail the build when an analysis fails; otherwise mark it unstable.
    #[arg(
        long = "fail-on-failed-analysis",
        env = "DELTAGATE_FAIL_ON_FAILED_ANALYSIS",
        action = ArgAction::Set,
        default_value_t = true
    )]
    fail_build_on_failed_analysis: bool,
    /// Analyze each new commit on its own.
    #[arg(long, env = "DELTAGATE_ANALYZE_INDIVIDUALLY")]
    analyze_individually: bool,
    /// Analyze the whole branch range as one unit.
    #[arg(long, env = "DELTAGATE_ANALYZE_BRANCH_DIFF")]
    analyze_branch_diff: bool,
    /// Lower bound of the branch-diff range.
    #[arg(long, env = "DELTAGATE_BASE_REVISION")]
    base_revision: Option<String>,
    /// Stop starting new analyses after this many seconds.
    #[arg(long, env = "DELTAGATE_MAX_DURATION_SECS")]
    max_duration_secs: Option<u64>,
}

#[derive(Args, Clone, Debug)]
struct RevisionArgs {
    /// Last successfully built revision.
    #[arg(long, env = "GIT_PREVIOUS_SUCCESSFUL_COMMIT")]
    previous_commit: Option<String>,
    /// Revision being built.
    #[arg(long, env = "GIT_COMMIT", default_value = "HEAD")]
    current_commit: String,
    /// Branch being built.
    #[arg(long, env = "GIT_BRANCH")]
    branch: Option<String>,
    /// Repository checkout used to list revisions.
    #[arg(long, default_value = ".")]
    repo_path: PathBuf,
    /// Build status before this step (success, unstable, failed).
    #[arg(long, env = "DELTAGATE_PRIOR_STATUS")]
    prior_status: Option<String>,
}

#[derive(Args, Clone, Debug)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the delta-analysis gate and exit with the build outcome.
    Analyze {
        #[command(flatten)]
        service: ServiceArgs,
        #[command(flatten)]
        request: RequestOptionArgs,
        #[command(flatten)]
        gate: GateArgs,
        #[command(flatten)]
        revisions: RevisionArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Print the analysis request for explicit commits without sending it.
    Request {
        #[command(flatten)]
        request: RequestOptionArgs,
        /// Commit to include (repeatable or comma-separated).
        #[arg(long = "commit", required = true, value_delimiter = ',')]
        commits: Vec<String>,
    },
}

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(outcome) => exit_code(outcome),
        Err(err) => {
            error!("{err}");
            ExitCode::from(1)
        }
    }
}

fn run(command: Commands) -> CliResult<BuildOutcome> {
    match command {
        Commands::Analyze {
            service,
            request,
            gate,
            revisions,
            report,
        } => run_analyze(&service, &request, &gate, &revisions, &report),
        Commands::Request { request, commits } => {
            println!("{}", build_request(&request, &commits)?.to_json()?);
            Ok(BuildOutcome::Success)
        }
    }
}

fn run_analyze(
    service: &ServiceArgs,
    request: &RequestOptionArgs,
    gate: &GateArgs,
    revisions: &RevisionArgs,
    output: &OutputArgs,
) -> CliResult<BuildOutcome> {
    let prior = parse_prior_status(revisions.prior_status.as_deref())?;
    let credentials = resolve_credentials(service, &EnvCredentialStore::default())?;
    let config = analysis_config(service, request, credentials)?;
    let policy = GatePolicy::new(
        gate.risk_threshold,
        gate.mark_unstable_on_threshold,
        gate.fail_build_on_failed_analysis,
    )?;
    let plan = run_plan(gate);
    if !plan.is_enabled() {
        info!("No analysis mode is enabled; pass --analyze-individually or --analyze-branch-diff.");
    }

    let client = DeltaAnalysisClient::new(config)?;
    let provider = GitLogRangeProvider::new(&revisions.repo_path);
    let interrupt = Arc::new(AtomicBool::new(false));
    if let Some(secs) = gate.max_duration_secs {
        arm_deadline(Arc::clone(&interrupt), Duration::from_secs(secs));
    }
    let runner = DeltaGate::new(&client, &provider, plan, policy)?.with_interrupt(&interrupt);
    let report = runner.run(&revision_context(revisions));

    let mut status = BuildStatus::new(prior);
    status.publish(report.outcome, &report.sections)?;
    emit_output(output, render_report(&report, output.format)?)?;
    info!("Build status: {}", status.outcome());
    Ok(status.outcome())
}

fn arm_deadline(flag: Arc<AtomicBool>, limit: Duration) {
    thread::spawn(move || {
        thread::sleep(limit);
        flag.store(true, Ordering::SeqCst);
    });
}

fn build_request(args: &RequestOptionArgs, commits: &[String]) -> CliResult<AnalysisRequest> {
    let commits = CommitSet::from_range(commits)?;
    if commits.is_empty() {
        return Err(DeltaGateError::Validation("at least one commit is required".to_string()).into());
    }
    let repository = RepositoryRef::new(args.repository.as_str())?;
    Ok(AnalysisRequest::new(
        &commits,
        &repository,
        &request_options(args),
    ))
}

fn request_options(args: &RequestOptionArgs) -> AnalysisOptions {
    AnalysisOptions::new(args.coupling_threshold_percent, args.use_biomarkers)
}

fn resolve_credentials(
    service: &ServiceArgs,
    resolver: &dyn CredentialResolver,
) -> CliResult<Credentials> {
    if let Some(id) = service.credentials_id.as_deref() {
        return Ok(resolver.resolve(id)?);
    }
    match (service.username.as_deref(), service.password.as_deref()) {
        (Some(username), Some(password)) => Ok(Credentials::new(username, password)?),
        _ => Err(DeltaGateError::Configuration(
            "credentials are required: pass --username and --password, or --credentials-id"
                .to_string(),
        )
        .into()),
    }
}

fn analysis_config(
    service: &ServiceArgs,
    request: &RequestOptionArgs,
    credentials: Credentials,
) -> CliResult<AnalysisConfig> {
    let repository = RepositoryRef::new(request.repository.as_str())?;
    let mut config = AnalysisConfig::new(service.url.as_str(), credentials, repository)
        .with_options(request_options(request));
    if let Some(secs) = service.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    config.validate()?;
    Ok(config)
}

fn run_plan(gate: &GateArgs) -> RunPlan {
    RunPlan {
        analyze_individually: gate.analyze_individually,
        analyze_branch_diff: gate.analyze_branch_diff,
        base_revision: non_empty(gate.base_revision.as_deref()),
    }
}

fn revision_context(args: &RevisionArgs) -> RevisionContext {
    RevisionContext {
        previous_commit: non_empty(args.previous_commit.as_deref()),
        current_commit: args.current_commit.trim().to_string(),
        branch: non_empty(args.branch.as_deref()),
    }
}

fn parse_prior_status(value: Option<&str>) -> CliResult<Option<BuildOutcome>> {
    match non_empty(value) {
        Some(value) => Ok(Some(value.parse::<BuildOutcome>()?)),
        None => Ok(None),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn render_report(report: &GateReport, format: OutputFormat) -> CliResult<String> {
    let contents = match format {
        OutputFormat::Text => render_gate_text(report),
        OutputFormat::Markdown => render_gate_markdown(report),
        OutputFormat::Json => format!("{}\n", render_json(report)?),
    };
    Ok(contents)
}

fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
    } else {
        print!("{contents}");
    }
    Ok(())
}

fn exit_code(outcome: BuildOutcome) -> ExitCode {
    match outcome {
        BuildOutcome::Success => ExitCode::SUCCESS,
        BuildOutcome::Failed => ExitCode::from(1),
        BuildOutcome::Unstable => ExitCode::from(2),
    }
}
