use crate::annotation;
use crate::artifact::{fetch_artifact, find_artifact_for_sha};
use crate::config::{ActionInputs, RunContext};
use crate::error::{Result, SizeDeltasError};
use crate::event::{pr_number_from_event, PrNumberSource, ReportMode};
use crate::github::{GitHubClient, IssueComment, PullRequest};
use crate::io::atomic_write;
use crate::paths::local_reports_dir;
use crate::report::{load_sketches_reports, SketchesReport};
use crate::table::{generate_report, report_heading};
use serde::Serialize;
use std::ops::ControlFlow;
use std::path::PathBuf;

pub const QUOTA_REACHED_WARNING: &str =
    "GitHub API request quota has been reached. Giving up for now.";

/// What a run ended up doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Commented { pr_number: u64 },
    Written { path: PathBuf },
    NoReports,
    Scanned { commented: Vec<u64> },
    /// The API quota ran out; the run stops without failing.
    QuotaReached,
}

pub struct ReportSizeDeltas {
    inputs: ActionInputs,
    ctx: RunContext,
    client: GitHubClient,
}

impl ReportSizeDeltas {
    pub fn new(inputs: ActionInputs, ctx: RunContext) -> Result<Self> {
        let client = GitHubClient::new(
            &ctx.api_url,
            &ctx.repository,
            inputs.github_token.clone(),
            ctx.retry.clone(),
        )?;
        Ok(Self {
            inputs,
            ctx,
            client,
        })
    }

    /// Report memory usage changes according to the triggering event.
    pub fn run(&self) -> Result<RunOutcome> {
        tracing::info!(
            event = %self.ctx.event,
            repository = %self.ctx.repository,
            source = %self.inputs.sketches_reports_source,
            "reporting size deltas"
        );
        let result = match self.ctx.event.mode() {
            ReportMode::LocalComment(source) => self.report_local_to_pr(source),
            ReportMode::LocalFile => self.report_local_to_file(),
            ReportMode::ArtifactScan => self.report_from_artifacts(),
        };
        match result {
            Err(SizeDeltasError::RateLimited) => {
                annotation::warning(QUOTA_REACHED_WARNING);
                Ok(RunOutcome::QuotaReached)
            }
            other => other,
        }
    }

    fn local_reports(&self) -> Result<Vec<SketchesReport>> {
        let dir = local_reports_dir(&self.ctx.workspace, &self.inputs.sketches_reports_source);
        load_sketches_reports(&dir)
    }

    fn report_local_to_pr(&self, source: PrNumberSource) -> Result<RunOutcome> {
        let reports = self.local_reports()?;
        if reports.is_empty() {
            return Ok(RunOutcome::NoReports);
        }
        let report = generate_report(&reports, self.ctx.event.compares_previous());

        let event_path = match source {
            PrNumberSource::GithubEvent => self
                .ctx
                .event_path
                .as_ref()
                .ok_or(SizeDeltasError::MissingInput("GITHUB_EVENT_PATH"))?,
            PrNumberSource::PrEventInput => self
                .inputs
                .pr_event_path
                .as_ref()
                .ok_or(SizeDeltasError::MissingInput("pr-event-path"))?,
        };
        let pr_number = pr_number_from_event(&self.ctx.workspace.join(event_path))?;

        self.client.comment(pr_number, &report)?;
        Ok(RunOutcome::Commented { pr_number })
    }

    fn report_local_to_file(&self) -> Result<RunOutcome> {
        let reports = self.local_reports()?;
        if reports.is_empty() {
            return Ok(RunOutcome::NoReports);
        }
        let destination = self
            .inputs
            .destination_file
            .as_ref()
            .ok_or(SizeDeltasError::MissingInput("destination-file"))?;
        let path = self.ctx.workspace.join(destination);

        let generated_on = chrono::Local::now().format("%b-%d-%Y %H:%M:%S");
        let mut content = generate_report(&reports, self.ctx.event.compares_previous());
        content.push_str(&format!("\nGenerated on: {generated_on}\n"));

        atomic_write(&path, content.as_bytes())?;
        tracing::info!(path = %path.display(), %generated_on, "report written");
        Ok(RunOutcome::Written { path })
    }

    /// Scan the repository's open pull requests and comment a report on each
    /// one whose head commit has a report artifact but no report comment yet.
    fn report_from_artifacts(&self) -> Result<RunOutcome> {
        tracing::debug!(repository = %self.ctx.repository, "getting PRs");
        let mut commented = Vec::new();
        let pulls = self.client.repo_url("pulls");
        self.client
            .for_each_page(&pulls, &[], |prs: Vec<PullRequest>| {
                for pr in &prs {
                    if self.report_pull_request(pr)? {
                        commented.push(pr.number);
                    }
                }
                Ok(ControlFlow::<()>::Continue(()))
            })?;
        Ok(RunOutcome::Scanned { commented })
    }

    fn report_pull_request(&self, pr: &PullRequest) -> Result<bool> {
        annotation::debug(&format!("Processing pull request number: {}", pr.number));

        // Only collaborators may comment on a locked thread, and the default
        // workflow token belongs to the github-actions bot.
        if pr.locked {
            annotation::debug("PR locked, skipping");
            return Ok(false);
        }

        if self.report_exists(pr.number, &pr.head.sha)? {
            annotation::debug("Report already exists");
            return Ok(false);
        }

        let Some(download_url) = find_artifact_for_sha(
            &self.client,
            &self.inputs.sketches_reports_source,
            &pr.user.login,
            &pr.head.ref_name,
            &pr.head.sha,
        )?
        else {
            annotation::debug("No sketches report artifact found");
            return Ok(false);
        };

        let artifact_dir = fetch_artifact(&self.client, &download_url)?;
        let reports = load_sketches_reports(artifact_dir.path())?;
        let Some(first) = reports.first() else {
            return Ok(false);
        };

        // The comment key comes from the report while report_exists() looks
        // for the API's head SHA; a mismatch would repost on every run.
        if first.commit_hash.as_deref() != Some(pr.head.sha.as_str()) {
            annotation::warning("Report commit hash doesn't match PR's head commit hash, skipping");
            return Ok(false);
        }

        let report = generate_report(&reports, self.ctx.event.compares_previous());
        self.client.comment(pr.number, &report)?;
        Ok(true)
    }

    /// Whether a report for `head_sha` was already commented on the PR.
    pub fn report_exists(&self, pr_number: u64, head_sha: &str) -> Result<bool> {
        let key = report_heading(Some(head_sha));
        let url = self.client.repo_url(&format!("issues/{pr_number}/comments"));
        let found = self
            .client
            .for_each_page(&url, &[], |comments: Vec<IssueComment>| {
                let hit = comments
                    .iter()
                    .filter_map(|c| c.body.as_deref())
                    .any(|body| body.starts_with(&key));
                Ok(if hit {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                })
            })?;
        Ok(found.is_some())
    }
}
