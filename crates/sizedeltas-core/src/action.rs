use crate::error::Result;
use crate::expr::{self, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// action.yml
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionManifest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub inputs: BTreeMap<String, ActionInput>,
    pub runs: ActionRuns,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionInput {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRuns {
    pub using: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

/// A resolved input: its value and whether the caller supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedInput {
    pub name: String,
    pub value: String,
    pub supplied: bool,
}

impl ResolvedInput {
    /// Environment variable the runner binds the input to.
    pub fn env_var(&self) -> String {
        input_env_var(&self.name)
    }
}

/// `INPUT_<NAME>`: upper-cased, spaces become underscores, hyphens stay.
pub fn input_env_var(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

impl ActionManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::parse(&data)
    }

    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn runs_in_container(&self) -> bool {
        self.runs.using == "docker"
    }

    /// Resolve every declared input: a supplied value wins, otherwise the
    /// declared default, with `${{ }}` defaults evaluated against `ctx`.
    /// Values are passed through unvalidated.
    pub fn resolve_inputs(
        &self,
        supplied: &BTreeMap<String, String>,
        ctx: &Context,
    ) -> Result<Vec<ResolvedInput>> {
        self.inputs
            .iter()
            .map(|(name, input)| {
                if let Some(value) = supplied.get(name) {
                    return Ok(ResolvedInput {
                        name: name.clone(),
                        value: value.clone(),
                        supplied: true,
                    });
                }
                let default = input.default.as_deref().unwrap_or("");
                let value = if expr::is_expression(default) {
                    expr::evaluate(default, ctx)?.into_string()
                } else {
                    default.to_string()
                };
                Ok(ResolvedInput {
                    name: name.clone(),
                    value,
                    supplied: false,
                })
            })
            .collect()
    }

    /// Supplied keys the manifest does not declare. GitHub only warns about
    /// these, so they are reported rather than rejected.
    pub fn undeclared_inputs<'a>(&self, supplied: &'a BTreeMap<String, String>) -> Vec<&'a str> {
        supplied
            .keys()
            .filter(|k| !self.inputs.contains_key(*k))
            .map(String::as_str)
            .collect()
    }
}
