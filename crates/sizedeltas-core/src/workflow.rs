use crate::error::Result;
use crate::expr::{self, Context};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Events whose runs can be narrowed by `paths` / `paths-ignore`.
const PATH_FILTERED_EVENTS: &[&str] = &["pull_request", "pull_request_target", "push"];

// ---------------------------------------------------------------------------
// Workflow file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub name: Option<String>,
    pub on: Triggers,
    #[serde(default)]
    pub jobs: BTreeMap<String, Job>,
}

/// `on:` as a single event, a list of events, or event name → configuration
/// (null for bare triggers such as `workflow_dispatch:`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Triggers {
    Event(String),
    Events(Vec<String>),
    Configured(BTreeMap<String, serde_yaml::Value>),
}

static UNCONFIGURED: serde_yaml::Value = serde_yaml::Value::Null;

impl Triggers {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Triggers::Event(name) => vec![name.as_str()],
            Triggers::Events(names) => names.iter().map(String::as_str).collect(),
            Triggers::Configured(map) => map.keys().map(String::as_str).collect(),
        }
    }

    /// Configuration of `event`, `None` when it is not a trigger.
    pub fn config(&self, event: &str) -> Option<&serde_yaml::Value> {
        match self {
            Triggers::Event(name) => (name == event).then_some(&UNCONFIGURED),
            Triggers::Events(names) => names.iter().any(|n| n == event).then_some(&UNCONFIGURED),
            Triggers::Configured(map) => map.get(event),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Job {
    #[serde(rename = "if", default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub runs_on: Option<String>,
    #[serde(default)]
    pub continue_on_error: Option<ExprOrBool>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uses: Option<String>,
    #[serde(default)]
    pub run: Option<String>,
    #[serde(default)]
    pub with: BTreeMap<String, String>,
    #[serde(default)]
    pub continue_on_error: Option<ExprOrBool>,
}

/// `continue-on-error` takes a literal boolean or an expression.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExprOrBool {
    Bool(bool),
    Expr(String),
}

impl ExprOrBool {
    pub fn evaluate(&self, ctx: &Context) -> Result<bool> {
        match self {
            ExprOrBool::Bool(b) => Ok(*b),
            ExprOrBool::Expr(e) => expr::evaluate_bool(e, ctx),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PathFilter {
    #[serde(default)]
    paths: Vec<String>,
    #[serde(default)]
    paths_ignore: Vec<String>,
}

/// Outcome of evaluating one job for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPlan {
    pub job: String,
    pub runs: bool,
    pub failure_tolerated: bool,
    /// `with:` of the step that invokes the local action (`uses: ./`).
    pub action_inputs: BTreeMap<String, String>,
}

impl Workflow {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::parse(&data)
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn triggers(&self) -> Vec<&str> {
        self.on.names()
    }

    /// Whether `event` starts a run given the paths changed by the push or PR.
    /// Path filters only apply to push and pull request events.
    pub fn is_triggered(&self, event: &str, changed_paths: &[&str]) -> Result<bool> {
        let Some(config) = self.on.config(event) else {
            return Ok(false);
        };
        if !PATH_FILTERED_EVENTS.contains(&event) || config.is_null() {
            return Ok(true);
        }
        let filter: PathFilter = serde_yaml::from_value(config.clone())?;
        if !filter.paths.is_empty() {
            let patterns = compile_patterns(&filter.paths)?;
            return Ok(changed_paths.iter().any(|p| filter_includes(&patterns, p)));
        }
        if !filter.paths_ignore.is_empty() {
            let patterns = compile_patterns(&filter.paths_ignore)?;
            return Ok(changed_paths.iter().any(|p| !filter_includes(&patterns, p)));
        }
        Ok(true)
    }

    /// Evaluate every job's `if:` and `continue-on-error:` against `ctx`.
    pub fn plan(&self, ctx: &Context) -> Result<Vec<JobPlan>> {
        self.jobs
            .iter()
            .map(|(name, job)| {
                let runs = match &job.condition {
                    Some(condition) => expr::evaluate_bool(condition, ctx)?,
                    None => true,
                };
                let failure_tolerated = match &job.continue_on_error {
                    Some(c) => c.evaluate(ctx)?,
                    None => false,
                };
                Ok(JobPlan {
                    job: name.clone(),
                    runs,
                    failure_tolerated,
                    action_inputs: job.local_action_inputs(),
                })
            })
            .collect()
    }

    /// Names of the jobs that run for `ctx`.
    pub fn selected_jobs(&self, ctx: &Context) -> Result<Vec<String>> {
        Ok(self
            .plan(ctx)?
            .into_iter()
            .filter(|p| p.runs)
            .map(|p| p.job)
            .collect())
    }
}

impl Job {
    fn local_action_inputs(&self) -> BTreeMap<String, String> {
        self.steps
            .iter()
            .find(|s| s.uses.as_deref() == Some("./"))
            .map(|s| s.with.clone())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Path filter globs
// ---------------------------------------------------------------------------

struct Pattern {
    negated: bool,
    regex: Regex,
}

fn compile_patterns(globs: &[String]) -> Result<Vec<Pattern>> {
    globs
        .iter()
        .map(|g| {
            let (negated, glob) = match g.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, g.as_str()),
            };
            Ok(Pattern {
                negated,
                regex: glob_regex(glob)?,
            })
        })
        .collect()
}

/// Later patterns override earlier ones, so `!` can carve out exceptions.
fn filter_includes(patterns: &[Pattern], path: &str) -> bool {
    let mut included = false;
    for pattern in patterns {
        if pattern.regex.is_match(path) {
            included = !pattern.negated;
        }
    }
    included
}

/// Translate a workflow path glob: `**` crosses directories, `*` and `?`
/// stay within one path segment.
pub fn glob_regex(glob: &str) -> Result<Regex> {
    let mut re = String::from("^");
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    re.push_str("(?:.*/)?");
                } else {
                    re.push_str(".*");
                }
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Ok(Regex::new(&re)?)
}
