use crate::error::{Result, SizeDeltasError};
use crate::io::sorted_files;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Sketches report schema
// ---------------------------------------------------------------------------

/// One sketches report file, as produced by the compile step for a set of boards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SketchesReport {
    #[serde(default)]
    pub commit_hash: Option<String>,
    #[serde(default)]
    pub commit_url: Option<String>,
    #[serde(default)]
    pub boards: Vec<BoardReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardReport {
    /// Fully qualified board name.
    #[serde(default)]
    pub board: Option<String>,
    pub target: String,
    #[serde(default)]
    pub sketches: Vec<SketchReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SketchReport {
    #[serde(default)]
    pub name: Option<String>,
    pub library: String,
    pub compilation_success: Snapshot<bool>,
    #[serde(default)]
    pub warnings: Option<Snapshot<WarningCount>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub current: Absolute<T>,
    pub previous: Option<Absolute<T>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Absolute<T> {
    pub absolute: T,
}

/// Compiler warning count. The compile step writes `"N/A"` when it could not
/// determine one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WarningCount {
    Count(u64),
    Unknown(String),
}

impl WarningCount {
    pub fn is_zero(&self) -> bool {
        matches!(self, WarningCount::Count(0))
    }
}

// ---------------------------------------------------------------------------
// Outcome classification
// ---------------------------------------------------------------------------

/// Which counter a sketch compile result lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Warning,
    Error,
}

impl SketchReport {
    pub fn current_outcome(&self) -> Outcome {
        classify(
            self.compilation_success.current.absolute,
            self.warnings.as_ref().map(|w| &w.current.absolute),
        )
    }

    /// `None` when the report carries no previous compile result.
    pub fn previous_outcome(&self) -> Option<Outcome> {
        let success = self.compilation_success.previous.as_ref()?.absolute;
        let warnings = self
            .warnings
            .as_ref()
            .and_then(|w| w.previous.as_ref())
            .map(|p| &p.absolute);
        Some(classify(success, warnings))
    }
}

fn classify(compiled: bool, warnings: Option<&WarningCount>) -> Outcome {
    if !compiled {
        Outcome::Error
    } else if warnings.is_some_and(|w| !w.is_zero()) {
        Outcome::Warning
    } else {
        Outcome::Success
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

pub fn parse_report(path: &Path) -> Result<SketchesReport> {
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|source| SizeDeltasError::Report {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every sketches report in `dir`, in file name order. Reports without
/// board data are dropped.
pub fn load_sketches_reports(dir: &Path) -> Result<Vec<SketchesReport>> {
    if !dir.is_dir() {
        return Err(SizeDeltasError::ReportsFolderNotFound(dir.to_path_buf()));
    }

    let mut reports = Vec::new();
    for path in sorted_files(dir)? {
        let report = parse_report(&path)?;
        if report.boards.is_empty() {
            tracing::debug!(path = %path.display(), "report has no board data, skipping");
            continue;
        }
        reports.push(report);
    }

    if reports.is_empty() {
        tracing::info!(
            "No size deltas data found in workflow artifact for this PR. The compile-examples \
             action's enable-size-deltas-report input must be set to true to produce size deltas data."
        );
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REPORT: &str = r#"{
        "commit_hash": "abc123",
        "commit_url": "https://github.com/o/r/commit/abc123",
        "boards": [
            {
                "board": "esp32:esp32:esp32",
                "target": "esp32",
                "sketches": [
                    {
                        "name": "examples/Blink",
                        "library": "Blink",
                        "compilation_success": {"current": {"absolute": true}, "previous": {"absolute": false}},
                        "warnings": {"current": {"absolute": 2}, "previous": {"absolute": "N/A"}}
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_report_with_previous_snapshot() {
        let report: SketchesReport = serde_json::from_str(REPORT).unwrap();
        assert_eq!(report.commit_hash.as_deref(), Some("abc123"));
        let sketch = &report.boards[0].sketches[0];
        assert_eq!(sketch.current_outcome(), Outcome::Warning);
        assert_eq!(sketch.previous_outcome(), Some(Outcome::Error));
    }

    #[test]
    fn unknown_warning_count_is_not_zero() {
        assert!(!WarningCount::Unknown("N/A".into()).is_zero());
        assert!(WarningCount::Count(0).is_zero());
        assert_eq!(
            classify(true, Some(&WarningCount::Unknown("N/A".into()))),
            Outcome::Warning
        );
    }

    #[test]
    fn missing_warnings_counts_as_success() {
        let sketch: SketchReport = serde_json::from_str(
            r#"{"library": "Lib", "compilation_success": {"current": {"absolute": true}}}"#,
        )
        .unwrap();
        assert_eq!(sketch.current_outcome(), Outcome::Success);
        assert_eq!(sketch.previous_outcome(), None);
    }

    #[test]
    fn warnings_without_previous_snapshot() {
        let sketch: SketchReport = serde_json::from_str(
            r#"{
                "library": "Lib",
                "compilation_success": {"current": {"absolute": true}},
                "warnings": {"current": {"absolute": "N/A"}}
            }"#,
        )
        .unwrap();
        let warnings = sketch.warnings.as_ref().unwrap();
        assert_eq!(
            warnings.current.absolute,
            WarningCount::Unknown("N/A".into())
        );
        assert!(warnings.previous.is_none());
        assert_eq!(sketch.current_outcome(), Outcome::Warning);
        assert_eq!(sketch.previous_outcome(), None);
    }

    #[test]
    fn load_reports_sorted_and_skips_boardless() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.json"), REPORT).unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            REPORT.replace("esp32\"", "esp8266\"").replace("abc123", "first"),
        )
        .unwrap();
        std::fs::write(dir.path().join("c.json"), r#"{"boards": []}"#).unwrap();

        let reports = load_sketches_reports(dir.path()).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].commit_hash.as_deref(), Some("first"));
        assert_eq!(reports[0].boards[0].target, "esp8266");
    }

    #[test]
    fn load_reports_missing_folder_fails() {
        let dir = TempDir::new().unwrap();
        let err = load_sketches_reports(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, SizeDeltasError::ReportsFolderNotFound(_)));
    }

    #[test]
    fn load_reports_reports_bad_json_with_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        let err = load_sketches_reports(dir.path()).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
