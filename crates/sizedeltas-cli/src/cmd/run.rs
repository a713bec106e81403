use crate::output::print_json_line;
use anyhow::Context;
use clap::Args;
use sizedeltas_core::{
    config::{ActionInputs, RunContext},
    paths::{DEFAULT_API_URL, DEFAULT_REPORTS_SOURCE},
    retry::RetryPolicy,
    runner::{ReportSizeDeltas, RunOutcome},
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Action inputs arrive as `INPUT_<NAME>` variables; runner context as `GITHUB_*`.
#[derive(Args)]
pub struct RunArgs {
    /// Artifact name or workspace-relative folder holding sketches reports
    #[arg(long, env = "INPUT_SKETCHES-REPORTS-SOURCE", default_value = DEFAULT_REPORTS_SOURCE)]
    sketches_reports_source: String,

    /// Token for GitHub API access
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Pull request event payload, used by workflow_run triggered runs
    #[arg(long, env = "INPUT_PR-EVENT-PATH")]
    pr_event_path: Option<String>,

    /// Write the report here on schedule and push events
    #[arg(long, env = "INPUT_DESTINATION-FILE")]
    destination_file: Option<String>,

    /// Deprecated alias of --sketches-reports-source
    #[arg(long, env = "INPUT_SIZE-DELTAS-REPORTS-ARTIFACT-NAME", hide = true)]
    size_deltas_reports_artifact_name: Option<String>,

    /// owner/name of the repository under test
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: String,

    /// Name of the triggering event
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    event_name: String,

    /// Payload of the triggering event
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Seconds between retries of a failed API request
    #[arg(long, env = "REPORT_SIZE_DELTAS_RETRY_DELAY", default_value_t = 30)]
    retry_delay: u64,
}

pub fn run(workspace: &Path, args: RunArgs, json: bool) -> anyhow::Result<()> {
    let inputs = ActionInputs::new(
        Some(args.sketches_reports_source),
        args.github_token,
        args.pr_event_path,
        args.destination_file,
    )
    .with_deprecated_artifact_name(args.size_deltas_reports_artifact_name);

    let mut ctx = RunContext::new(args.repository, &args.event_name, workspace.to_path_buf());
    ctx.event_path = args.event_path.filter(|p| !p.as_os_str().is_empty());
    ctx.api_url = args.api_url;
    ctx.retry = RetryPolicy::with_delay(Duration::from_secs(args.retry_delay));

    let action = ReportSizeDeltas::new(inputs, ctx).context("invalid run configuration")?;
    let outcome = action.run().context("size deltas report failed")?;

    // Workflow commands go to stdout during the run, so the outcome record
    // is always the last line.
    if json {
        print_json_line(&outcome)?;
    } else {
        println!("{}", describe(&outcome));
    }
    Ok(())
}

fn describe(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Commented { pr_number } => format!("Commented report on PR #{pr_number}"),
        RunOutcome::Written { path } => format!("Wrote report to {}", path.display()),
        RunOutcome::NoReports => "No sketches reports found".to_string(),
        RunOutcome::Scanned { commented } if commented.is_empty() => {
            "Scanned open PRs: none needed a report".to_string()
        }
        RunOutcome::Scanned { commented } => {
            let prs: Vec<String> = commented.iter().map(|n| format!("#{n}")).collect();
            format!("Scanned open PRs: commented on {}", prs.join(", "))
        }
        RunOutcome::QuotaReached => "Stopped early: API quota reached".to_string(),
    }
}
