use crate::report::{Outcome, SketchesReport};

/// First line of every report comment. Also the prefix used to detect a
/// report that was already posted for a given head commit.
///
/// Headings append ` @ <commit_hash>` (see [`report_heading`]) so the
/// artifact scan can tell a report on the current head commit from one on an
/// older push. With the bare key, a report on an earlier push would count as
/// already posted and new pushes would never be reported.
pub const REPORT_KEY: &str = "### External libraries build test";

/// GitHub stores comment bodies in a 262,144 byte column.
pub const MAX_REPORT_LENGTH: usize = 262_144;

const TRUNCATION_NOTICE: &str = "\n\n**Report truncated: too long for a GitHub comment.**\n";

const LIBRARY_HEADING: &str = "Library";
const OK_EMOJI: &str = ":white_check_mark:";
const WARNING_EMOJI: &str = ":warning:";
const FAIL_EMOJI: &str = ":x:";

// ---------------------------------------------------------------------------
// CellCounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellCounts {
    pub prev_success: u32,
    pub prev_warning: u32,
    pub prev_error: u32,
    pub success: u32,
    pub warning: u32,
    pub error: u32,
}

impl CellCounts {
    fn record_current(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.success += 1,
            Outcome::Warning => self.warning += 1,
            Outcome::Error => self.error += 1,
        }
    }

    fn record_previous(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.prev_success += 1,
            Outcome::Warning => self.prev_warning += 1,
            Outcome::Error => self.prev_error += 1,
        }
    }

    /// Render as e.g. `1 :warning: -> 1 :white_check_mark: `, or `N/A` for
    /// a board that built nothing from this library.
    pub fn render(&self, compare_previous: bool) -> String {
        let mut out = String::new();
        if compare_previous {
            push_count(&mut out, self.prev_success, OK_EMOJI);
            push_count(&mut out, self.prev_warning, WARNING_EMOJI);
            push_count(&mut out, self.prev_error, FAIL_EMOJI);
            if !out.is_empty() {
                out.push_str("-> ");
            }
        }
        push_count(&mut out, self.success, OK_EMOJI);
        push_count(&mut out, self.warning, WARNING_EMOJI);
        push_count(&mut out, self.error, FAIL_EMOJI);
        if out.is_empty() {
            out.push_str("N/A");
        }
        out
    }
}

fn push_count(out: &mut String, count: u32, emoji: &str) {
    if count > 0 {
        out.push_str(&format!("{count} {emoji} "));
    }
}

// ---------------------------------------------------------------------------
// SummaryTable
// ---------------------------------------------------------------------------

/// Library × board summary of compile results.
#[derive(Debug, Clone, Default)]
pub struct SummaryTable {
    /// Column headings, one per board, upper-cased target names.
    pub targets: Vec<String>,
    /// `(library, cells)` in first-appearance order; `cells.len() == targets.len()`.
    pub rows: Vec<(String, Vec<CellCounts>)>,
}

impl SummaryTable {
    pub fn build(reports: &[SketchesReport], compare_previous: bool) -> Self {
        let board_count: usize = reports.iter().map(|r| r.boards.len()).sum();
        let mut table = SummaryTable {
            targets: Vec::with_capacity(board_count),
            rows: Vec::new(),
        };

        let boards = reports.iter().flat_map(|r| r.boards.iter());
        for (column, board) in boards.enumerate() {
            table.targets.push(board.target.to_uppercase());
            for sketch in &board.sketches {
                let row = table.row_index(&sketch.library, board_count);
                let cell = &mut table.rows[row].1[column];
                if compare_previous {
                    if let Some(previous) = sketch.previous_outcome() {
                        cell.record_previous(previous);
                    }
                }
                cell.record_current(sketch.current_outcome());
            }
        }

        table
    }

    fn row_index(&mut self, library: &str, board_count: usize) -> usize {
        if let Some(i) = self.rows.iter().position(|(name, _)| name == library) {
            return i;
        }
        self.rows
            .push((library.to_string(), vec![CellCounts::default(); board_count]));
        self.rows.len() - 1
    }

    /// Rendered cells, heading row first.
    pub fn to_rows(&self, compare_previous: bool) -> Vec<Vec<String>> {
        let mut heading = vec![LIBRARY_HEADING.to_string()];
        heading.extend(self.targets.iter().cloned());

        let mut rows = vec![heading];
        for (library, cells) in &self.rows {
            let mut row = vec![library.clone()];
            row.extend(cells.iter().map(|c| c.render(compare_previous)));
            rows.push(row);
        }
        rows
    }
}

/// Markdown table from rendered rows; the first row is the heading.
pub fn render_markdown_table(rows: &[Vec<String>]) -> String {
    let Some((heading, data)) = rows.split_first() else {
        return String::new();
    };

    let mut out = heading.join("|");
    out.push('\n');

    let dividers = vec![":-:"; heading.len().saturating_sub(1)];
    out.push_str("-|");
    out.push_str(&dividers.join("|"));
    out.push('\n');

    for row in data {
        out.push_str(&row.join("|"));
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Heading line for a report on `commit_hash`.
pub fn report_heading(commit_hash: Option<&str>) -> String {
    match commit_hash {
        Some(sha) => format!("{REPORT_KEY} @ {sha}"),
        None => REPORT_KEY.to_string(),
    }
}

/// Full Markdown report body for a set of sketches reports.
pub fn generate_report(reports: &[SketchesReport], compare_previous: bool) -> String {
    let commit_hash = reports.first().and_then(|r| r.commit_hash.as_deref());
    let table = SummaryTable::build(reports, compare_previous);

    let mut markdown = report_heading(commit_hash);
    markdown.push_str("\n\n");
    markdown.push_str(&render_markdown_table(&table.to_rows(compare_previous)));
    markdown.push('\n');

    let markdown = truncate_report(markdown);
    tracing::debug!("Report:\n{markdown}");
    markdown
}

fn truncate_report(mut markdown: String) -> String {
    if markdown.len() <= MAX_REPORT_LENGTH {
        return markdown;
    }
    let mut cut = MAX_REPORT_LENGTH - TRUNCATION_NOTICE.len();
    while !markdown.is_char_boundary(cut) {
        cut -= 1;
    }
    markdown.truncate(cut);
    markdown.push_str(TRUNCATION_NOTICE);
    markdown
}
