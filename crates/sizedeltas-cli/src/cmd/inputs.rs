use crate::output::{flag, print_json, print_table};
use anyhow::Context as _;
use clap::Args;
use sizedeltas_core::{action::ActionManifest, annotation, expr::Context, paths};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SECRET_INPUTS: &[&str] = &["github-token"];

#[derive(Args)]
pub struct InputsArgs {
    /// Supplied input as key=value (repeatable), like a step's `with:`
    #[arg(long = "with", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    with: Vec<(String, String)>,

    /// Value of `github.token` for expression defaults
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, default_value = "")]
    token: String,

    /// Action manifest (default: <workspace>/action.yml)
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Print secret values instead of masking them
    #[arg(long)]
    show_secrets: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty input name in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

pub fn run(workspace: &Path, args: InputsArgs, json: bool) -> anyhow::Result<()> {
    let path = args
        .manifest
        .unwrap_or_else(|| paths::action_manifest_path(workspace));
    let manifest = ActionManifest::load(&path)
        .with_context(|| format!("cannot load action manifest {}", path.display()))?;

    let supplied: BTreeMap<String, String> = args.with.into_iter().collect();
    for name in manifest.undeclared_inputs(&supplied) {
        annotation::warning(&format!("Unexpected input '{name}'"));
    }

    let ctx = Context::new().with("github.token", args.token);
    let mut resolved = manifest.resolve_inputs(&supplied, &ctx)?;
    if !args.show_secrets {
        for input in &mut resolved {
            if SECRET_INPUTS.contains(&input.name.as_str()) && !input.value.is_empty() {
                input.value = "***".to_string();
            }
        }
    }

    if json {
        return print_json(&resolved);
    }

    let rows = resolved
        .iter()
        .map(|i| {
            vec![
                i.name.clone(),
                i.value.clone(),
                i.env_var(),
                flag(i.supplied),
            ]
        })
        .collect();
    print_table(&["INPUT", "VALUE", "ENV", "SUPPLIED"], rows);
    Ok(())
}
