use sizedeltas_core::paths::ACTION_MANIFEST;
use std::path::{Path, PathBuf};

/// Resolve the workspace directory.
///
/// Priority:
/// 1. `--workspace` flag / `GITHUB_WORKSPACE` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `action.yml`
/// 3. Fall back to `cwd`
pub fn resolve_workspace(explicit: Option<&Path>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_from(explicit, &cwd)
}

fn resolve_from(explicit: Option<&Path>, cwd: &Path) -> PathBuf {
    if let Some(p) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return p.to_path_buf();
    }

    let mut dir = cwd.to_path_buf();
    loop {
        if dir.join(ACTION_MANIFEST).is_file() {
            return dir;
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => break,
        }
    }

    cwd.to_path_buf()
}
