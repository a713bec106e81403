//! Blocking GitHub REST client: pagination, rate-limit checks and URL-load
//! retries.

use crate::annotation;
use crate::error::{Result, SizeDeltasError};
use crate::retry::{is_retryable_status, is_retryable_transport, RetryPolicy};
use regex::Regex;
use reqwest::blocking::{Client, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::OnceLock;

const PER_PAGE: &str = "100";

const UNAUTHORIZED_HINT: &str =
    "HTTP Error 401 may be caused by providing an incorrect GitHub personal access token.";

// ---------------------------------------------------------------------------
// API payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub locked: bool,
    pub head: GitRef,
    pub user: User,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GitRef {
    pub sha: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IssueComment {
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkflowRuns {
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub head_sha: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Artifacts {
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Artifact {
    pub name: String,
    #[serde(default)]
    pub expired: bool,
    pub archive_download_url: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RateLimit {
    pub resources: RateLimitResources,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RateLimitResources {
    pub core: RateLimitBucket,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RateLimitBucket {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}

/// One page of a JSON response.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: T,
    /// Total pages, 0 when the response was empty.
    pub page_count: u32,
}

// ---------------------------------------------------------------------------
// Link header
// ---------------------------------------------------------------------------

static PAGE_PARAM_RE: OnceLock<Regex> = OnceLock::new();

fn page_param_re() -> &'static Regex {
    PAGE_PARAM_RE.get_or_init(|| Regex::new(r"[?&]page=(\d+)").unwrap())
}

/// Number of pages advertised by a `Link` header's `rel="last"` entry.
/// A response without one is a single page.
pub fn page_count(link_header: Option<&str>) -> u32 {
    let Some(header) = link_header else {
        return 1;
    };
    for link in header.split(',') {
        let link = link.trim();
        let Some(url) = link.strip_suffix(r#">; rel="last""#) else {
            continue;
        };
        return page_param_re()
            .captures(url)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(1);
    }
    1
}

fn is_empty_json(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Array(a) => a.is_empty(),
        serde_json::Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

struct HttpRequest<'a> {
    method: Method,
    url: &'a str,
    query: &'a [(String, String)],
    body: Option<&'a serde_json::Value>,
}

pub struct GitHubClient {
    http: Client,
    api_url: String,
    repository: String,
    token: Option<String>,
    retry: RetryPolicy,
}

impl GitHubClient {
    /// `repository` is `owner/name`; the owner doubles as the User-Agent.
    pub fn new(
        api_url: &str,
        repository: &str,
        token: Option<String>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let owner = match repository.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => owner,
            _ => return Err(SizeDeltasError::InvalidRepository(repository.to_string())),
        };
        let http = Client::builder().user_agent(owner).build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
            token: token.filter(|t| !t.is_empty()),
            retry,
        })
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Absolute URL for a path under `repos/<owner>/<name>/`.
    pub fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.repository, path)
    }

    /// Fetch one page of a list endpoint.
    pub fn api_page<T>(&self, url: &str, params: &[(&str, &str)], page: u32) -> Result<Page<T>>
    where
        T: DeserializeOwned + Default,
    {
        let mut query: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        query.push(("page".to_string(), page.to_string()));
        query.push(("per_page".to_string(), PER_PAGE.to_string()));
        self.get_json(url, &query)
    }

    /// Walk every page of a list endpoint, stopping early when `visit` breaks.
    pub fn for_each_page<T, R, F>(
        &self,
        url: &str,
        params: &[(&str, &str)],
        mut visit: F,
    ) -> Result<Option<R>>
    where
        T: DeserializeOwned + Default,
        F: FnMut(T) -> Result<ControlFlow<R>>,
    {
        let mut page_number = 1;
        let mut page_count = 1;
        while page_number <= page_count {
            let page: Page<T> = self.api_page(url, params, page_number)?;
            page_count = page.page_count;
            if let ControlFlow::Break(found) = visit(page.data)? {
                return Ok(Some(found));
            }
            page_number += 1;
        }
        Ok(None)
    }

    pub fn get_json<T>(&self, url: &str, query: &[(String, String)]) -> Result<Page<T>>
    where
        T: DeserializeOwned + Default,
    {
        let response = self.send(&HttpRequest {
            method: Method::GET,
            url,
            query,
            body: None,
        })?;
        let link = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text()?;
        let value: serde_json::Value = serde_json::from_str(&body).inspect_err(|e| {
            tracing::warn!(url, "response is not valid JSON: {e}");
        })?;

        if is_empty_json(&value) {
            return Ok(Page {
                data: T::default(),
                page_count: 0,
            });
        }
        Ok(Page {
            data: serde_json::from_value(value)?,
            page_count: page_count(link.as_deref()),
        })
    }

    /// Raw response body, e.g. an artifact archive.
    pub fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.send(&HttpRequest {
            method: Method::GET,
            url,
            query: &[],
            body: None,
        })?;
        Ok(response.bytes()?.to_vec())
    }

    /// Post `markdown` as a comment on the pull request thread.
    pub fn comment(&self, pr_number: u64, markdown: &str) -> Result<()> {
        annotation::debug("Adding deltas report comment to pull request");
        let url = self.repo_url(&format!("issues/{pr_number}/comments"));
        let body = serde_json::json!({ "body": markdown });
        self.send(&HttpRequest {
            method: Method::POST,
            url: &url,
            query: &[],
            body: Some(&body),
        })?;
        tracing::info!(pr_number, "report comment posted");
        Ok(())
    }

    /// Fail with [`SizeDeltasError::RateLimited`] when the core API quota is spent.
    pub fn check_rate_limit(&self) -> Result<()> {
        let url = format!("{}/rate_limit", self.api_url);
        let page: Page<RateLimit> = self.get_json(&url, &[])?;
        let core = page.data.resources.core;
        tracing::debug!(
            limit = core.limit,
            remaining = core.remaining,
            reset = core.reset,
            "GitHub core API request allotment"
        );
        if core.remaining == 0 {
            return Err(SizeDeltasError::RateLimited);
        }
        Ok(())
    }

    /// The rate limit endpoint itself is not subject to rate limiting.
    fn counts_against_quota(&self, url: &str) -> bool {
        url.starts_with(&self.api_url) && !url.starts_with(&format!("{}/rate_limit", self.api_url))
    }

    fn build(&self, request: &HttpRequest<'_>) -> reqwest::blocking::RequestBuilder {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if !request.query.is_empty() {
            builder = builder.query(request.query);
        }
        if let Some(token) = &self.token {
            builder = builder.header(reqwest::header::AUTHORIZATION, format!("token {token}"));
        }
        if let Some(body) = request.body {
            builder = builder.json(body);
        }
        builder
    }

    fn send(&self, request: &HttpRequest<'_>) -> Result<Response> {
        tracing::info!(url = request.url, "Opening URL");
        let attempts = self.retry.max_attempts();
        for attempt in 1..=attempts {
            if self.counts_against_quota(request.url) {
                self.check_rate_limit()?;
            }
            let failure = match self.build(request).send() {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    if !is_retryable_status(status) {
                        if status == 401 {
                            annotation::error(UNAUTHORIZED_HINT);
                        }
                        return Err(SizeDeltasError::HttpStatus {
                            status,
                            url: request.url.to_string(),
                        });
                    }
                    format!("HTTP {status}")
                }
                Err(err) if is_retryable_transport(&err) => err.to_string(),
                Err(err) => return Err(err.into()),
            };
            tracing::warn!(
                attempt,
                url = request.url,
                "Temporarily unable to open URL ({failure}), retrying"
            );
            if attempt < attempts {
                std::thread::sleep(self.retry.delay);
            }
        }
        Err(SizeDeltasError::RetriesExhausted(request.url.to_string()))
    }
}
