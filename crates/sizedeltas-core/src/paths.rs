use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Repository file constants
// ---------------------------------------------------------------------------

pub const ACTION_MANIFEST: &str = "action.yml";
pub const TEST_WORKFLOW: &str = ".github/workflows/test-action.yml";
pub const FIXTURE_REPORTS_DIR: &str = ".github/workflows/testdata/sketches-reports";

pub const DEFAULT_REPORTS_SOURCE: &str = "sketches-reports";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

pub fn action_manifest_path(workspace: &Path) -> PathBuf {
    workspace.join(ACTION_MANIFEST)
}

pub fn test_workflow_path(workspace: &Path) -> PathBuf {
    workspace.join(TEST_WORKFLOW)
}

/// Local reports live relative to the checked-out workspace.
pub fn local_reports_dir(workspace: &Path, source: &str) -> PathBuf {
    workspace.join(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_reports_dir_joins_relative_source() {
        let dir = local_reports_dir(Path::new("/work"), FIXTURE_REPORTS_DIR);
        assert_eq!(
            dir,
            PathBuf::from("/work/.github/workflows/testdata/sketches-reports")
        );
    }

    #[test]
    fn manifest_and_workflow_live_at_workspace_root() {
        let root = Path::new("/repo");
        assert_eq!(action_manifest_path(root), PathBuf::from("/repo/action.yml"));
        assert!(test_workflow_path(root).ends_with("workflows/test-action.yml"));
    }
}
