use crate::annotation;
use crate::event::EventKind;
use crate::paths::{DEFAULT_API_URL, DEFAULT_REPORTS_SOURCE};
use crate::retry::RetryPolicy;
use serde::Serialize;
use std::path::PathBuf;

/// Warning printed when the old artifact-name input is still in use.
pub const DEPRECATED_SOURCE_WARNING: &str = "The size-deltas-report-artifact-name input is deprecated. \
     Use the equivalent input: sketches-reports-source instead.";

// ---------------------------------------------------------------------------
// ActionInputs
// ---------------------------------------------------------------------------

/// The action inputs after resolution. Empty strings mean "not supplied".
#[derive(Debug, Clone, Serialize)]
pub struct ActionInputs {
    pub sketches_reports_source: String,
    #[serde(skip_serializing)]
    pub github_token: Option<String>,
    pub pr_event_path: Option<PathBuf>,
    pub destination_file: Option<PathBuf>,
}

impl Default for ActionInputs {
    fn default() -> Self {
        Self {
            sketches_reports_source: DEFAULT_REPORTS_SOURCE.to_string(),
            github_token: None,
            pr_event_path: None,
            destination_file: None,
        }
    }
}

impl ActionInputs {
    pub fn new(
        sketches_reports_source: Option<String>,
        github_token: Option<String>,
        pr_event_path: Option<String>,
        destination_file: Option<String>,
    ) -> Self {
        Self {
            sketches_reports_source: non_empty(sketches_reports_source)
                .unwrap_or_else(|| DEFAULT_REPORTS_SOURCE.to_string()),
            github_token: non_empty(github_token),
            pr_event_path: non_empty(pr_event_path).map(PathBuf::from),
            destination_file: non_empty(destination_file).map(PathBuf::from),
        }
    }

    /// Apply the deprecated `size-deltas-reports-artifact-name` input, which
    /// wins over `sketches-reports-source` when set.
    pub fn with_deprecated_artifact_name(mut self, artifact_name: Option<String>) -> Self {
        if let Some(name) = non_empty(artifact_name) {
            annotation::warning(DEPRECATED_SOURCE_WARNING);
            self.sketches_reports_source = name;
        }
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// RunContext
// ---------------------------------------------------------------------------

/// Runner-provided environment for one invocation.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub repository: String,
    pub event: EventKind,
    pub workspace: PathBuf,
    pub event_path: Option<PathBuf>,
    pub api_url: String,
    pub retry: RetryPolicy,
}

impl RunContext {
    pub fn new(repository: impl Into<String>, event_name: &str, workspace: PathBuf) -> Self {
        Self {
            repository: repository.into(),
            event: EventKind::parse(event_name),
            workspace,
            event_path: None,
            api_url: DEFAULT_API_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}
