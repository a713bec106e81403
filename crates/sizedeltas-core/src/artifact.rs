use crate::error::Result;
use crate::github::{Artifacts, GitHubClient, WorkflowRuns};
use std::io::Cursor;
use std::ops::ControlFlow;
use std::path::Path;
use tempfile::TempDir;

/// Download URL of the sketches report artifact produced for `head_sha`.
///
/// Runs are filtered server-side by PR author and head branch to keep the
/// number of API requests down; several runs may share the head SHA.
pub fn find_artifact_for_sha(
    client: &GitHubClient,
    artifact_name: &str,
    pr_user_login: &str,
    pr_head_ref: &str,
    pr_head_sha: &str,
) -> Result<Option<String>> {
    let params = [
        ("actor", pr_user_login),
        ("branch", pr_head_ref),
        ("event", "pull_request"),
        ("status", "completed"),
    ];
    client.for_each_page(&client.repo_url("actions/runs"), &params, |runs: WorkflowRuns| {
        for run in runs.workflow_runs.iter().filter(|r| r.head_sha == pr_head_sha) {
            if let Some(url) = find_artifact_for_run(client, artifact_name, run.id)? {
                return Ok(ControlFlow::Break(url));
            }
        }
        Ok(ControlFlow::Continue(()))
    })
}

/// Download URL of the first unexpired artifact named `artifact_name` on a run.
pub fn find_artifact_for_run(
    client: &GitHubClient,
    artifact_name: &str,
    run_id: u64,
) -> Result<Option<String>> {
    let url = client.repo_url(&format!("actions/runs/{run_id}/artifacts"));
    client.for_each_page(&url, &[], |page: Artifacts| {
        let found = page
            .artifacts
            .into_iter()
            .find(|a| !a.expired && a.name == artifact_name);
        Ok(match found {
            Some(artifact) => ControlFlow::Break(artifact.archive_download_url),
            None => ControlFlow::Continue(()),
        })
    })
}

/// Download an artifact archive and unpack it into a fresh temporary
/// directory. The directory is removed when the returned handle drops.
pub fn fetch_artifact(client: &GitHubClient, download_url: &str) -> Result<TempDir> {
    let archive = client.download(download_url)?;
    let dir = tempfile::Builder::new().prefix("reportsizedeltas-").tempdir()?;
    extract_archive(&archive, dir.path())?;
    Ok(dir)
}

pub fn extract_archive(archive: &[u8], dest: &Path) -> Result<()> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))?;
    tracing::debug!(files = zip.len(), dest = %dest.display(), "extracting artifact");
    zip.extract(dest)?;
    Ok(())
}
