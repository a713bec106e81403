use crate::output::{flag, print_json, print_table};
use anyhow::Context as _;
use clap::Args;
use serde::Serialize;
use sizedeltas_core::{
    expr::Context,
    paths,
    workflow::{JobPlan, Workflow},
};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct JobsArgs {
    /// Triggering event name
    #[arg(long)]
    event: String,

    /// Path changed by the push or pull request (repeatable)
    #[arg(long = "changed", value_name = "PATH")]
    changed: Vec<String>,

    /// Repository the workflow runs in
    #[arg(long, default_value = "arduino/report-size-deltas")]
    repository: String,

    /// Pull request head comes from a fork
    #[arg(long)]
    fork: bool,

    /// Workflow file (default: <workspace>/.github/workflows/test-action.yml)
    #[arg(long)]
    workflow: Option<PathBuf>,
}

#[derive(Serialize)]
struct JobsReport {
    event: String,
    triggered: bool,
    jobs: Vec<JobPlan>,
}

pub fn run(workspace: &Path, args: JobsArgs, json: bool) -> anyhow::Result<()> {
    let path = args
        .workflow
        .unwrap_or_else(|| paths::test_workflow_path(workspace));
    let workflow = Workflow::load(&path)
        .with_context(|| format!("cannot load workflow {}", path.display()))?;

    let changed: Vec<&str> = args.changed.iter().map(String::as_str).collect();
    let triggered = workflow.is_triggered(&args.event, &changed)?;

    let head_repo = if args.fork {
        let name = args
            .repository
            .split_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&args.repository);
        format!("fork-owner/{name}")
    } else {
        args.repository.clone()
    };

    let mut ctx = Context::new()
        .with("github.event_name", args.event.as_str())
        .with("github.repository", args.repository.as_str());
    if args.event == "pull_request" {
        ctx.set("github.event.pull_request.head.repo.full_name", head_repo);
    }

    let jobs = if triggered {
        workflow.plan(&ctx)?
    } else {
        Vec::new()
    };

    if json {
        return print_json(&JobsReport {
            event: args.event,
            triggered,
            jobs,
        });
    }

    if !triggered {
        println!("Workflow is not triggered by '{}'.", args.event);
        return Ok(());
    }

    let rows = jobs
        .iter()
        .map(|p| {
            vec![
                p.job.clone(),
                flag(p.runs),
                flag(p.failure_tolerated),
                p.action_inputs
                    .get("sketches-reports-source")
                    .cloned()
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["JOB", "RUNS", "MAY FAIL", "REPORTS SOURCE"], rows);
    Ok(())
}
