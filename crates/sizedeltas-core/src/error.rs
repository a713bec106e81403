use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SizeDeltasError {
    #[error("missing required input: {0}")]
    MissingInput(&'static str),

    #[error("invalid repository '{0}': expected owner/name")]
    InvalidRepository(String),

    #[error("sketches reports folder not found: {}", .0.display())]
    ReportsFolderNotFound(PathBuf),

    #[error("failed to parse sketches report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("event payload {} has no {field}", path.display())]
    EventField { path: PathBuf, field: &'static str },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("maximum number of URL load retries exceeded: {0}")]
    RetriesExhausted(String),

    #[error("GitHub API request quota has been reached")]
    RateLimited,

    #[error("invalid expression '{expr}': {reason}")]
    Expression { expr: String, reason: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SizeDeltasError>;
