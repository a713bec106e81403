use crate::error::{Result, SizeDeltasError};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// The workflow trigger the program runs under (`GITHUB_EVENT_NAME`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PullRequest,
    /// Fork PR workaround: a privileged follow-up workflow reports for the PR.
    WorkflowRun,
    Schedule,
    Push,
    Other(String),
}

impl EventKind {
    pub fn parse(name: &str) -> Self {
        match name {
            "pull_request" => EventKind::PullRequest,
            "workflow_run" => EventKind::WorkflowRun,
            "schedule" => EventKind::Schedule,
            "push" => EventKind::Push,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::PullRequest => "pull_request",
            EventKind::WorkflowRun => "workflow_run",
            EventKind::Schedule => "schedule",
            EventKind::Push => "push",
            EventKind::Other(name) => name,
        }
    }

    /// PR-scoped runs show the base branch result next to the PR result.
    pub fn compares_previous(&self) -> bool {
        matches!(self, EventKind::PullRequest | EventKind::WorkflowRun)
    }

    pub fn mode(&self) -> ReportMode {
        match self {
            EventKind::PullRequest => ReportMode::LocalComment(PrNumberSource::GithubEvent),
            EventKind::WorkflowRun => ReportMode::LocalComment(PrNumberSource::PrEventInput),
            EventKind::Schedule | EventKind::Push => ReportMode::LocalFile,
            EventKind::Other(_) => ReportMode::ArtifactScan,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where reports come from and where the result goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Local reports, commented on one PR.
    LocalComment(PrNumberSource),
    /// Local reports, written to the destination file.
    LocalFile,
    /// Workflow artifacts, commented on every open PR that needs a report.
    ArtifactScan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrNumberSource {
    /// `GITHUB_EVENT_PATH`
    GithubEvent,
    /// The `pr-event-path` input
    PrEventInput,
}

/// `pull_request.number` from a webhook event payload.
pub fn pr_number_from_event(path: &Path) -> Result<u64> {
    let data = std::fs::read_to_string(path)?;
    let event: serde_json::Value = serde_json::from_str(&data)?;
    event
        .pointer("/pull_request/number")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| SizeDeltasError::EventField {
            path: path.to_path_buf(),
            field: "pull_request.number",
        })
}
