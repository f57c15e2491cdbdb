//! Report fragment store.
//!
//! The report is split across numbered markdown files so each section can be
//! appended by a separate invocation:
//!
//! - `00_report.md`: title and hypothesis
//! - `10_trace.md`: debugging trace table, one row per call
//! - `20_evidence.md`: one evidence block per breakpoint stop
//! - `90_conclusion.md`: root cause, fix and post-fix verification
//!
//! Name order is document order. Sections are only ever appended; `init`
//! prepends the title to a report that lacks one, after reading it in full.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::assets::{self, AssetGroup};
use crate::{ReportError, Result};

pub const REPORT_FILE: &str = "00_report.md";
pub const TRACE_FILE: &str = "10_trace.md";
pub const EVIDENCE_FILE: &str = "20_evidence.md";
pub const CONCLUSION_FILE: &str = "90_conclusion.md";

const TITLE_MARKER: &str = "# Debug Report";
const TRACE_HEADING: &str = "## Debugging Trace";
const TRACE_TABLE_HEADER: &str =
    "| # | Action | Location | Reasoning |\n| - | ------ | -------- | --------- |\n";
const EVIDENCE_HEADING: &str = "## Breakpoints & Evidence";

pub const DEFAULT_PACKAGE: &str = "unknown";
pub const DEFAULT_CONTEXT_LINES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hypothesis {
    pub loc: String,
    pub expected: String,
    pub actual: String,
}

impl Default for Hypothesis {
    fn default() -> Self {
        Self {
            loc: "file:line".to_string(),
            expected: "<what should happen>".to_string(),
            actual: "<what was observed>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceRow {
    pub n: u32,
    pub action: String,
    pub loc: String,
    pub reason: String,
}

/// Captured state at one breakpoint stop. Empty strings count as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub loc: String,
    pub src_file: Option<PathBuf>,
    pub highlight: usize,
    pub ctx: usize,
    pub args: Option<String>,
    pub locals: Option<String>,
    pub stack: Option<String>,
    pub print_expr: Option<String>,
    pub print_val: Option<String>,
    pub obs: Option<String>,
}

impl Default for Evidence {
    fn default() -> Self {
        Self {
            loc: String::new(),
            src_file: None,
            highlight: 0,
            ctx: DEFAULT_CONTEXT_LINES,
            args: None,
            locals: None,
            stack: None,
            print_expr: None,
            print_val: None,
            obs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitSummary {
    pub package: String,
    pub date: String,
    pub title_written: bool,
}

/// An artifact directory holding the fragments of one report.
#[derive(Debug, Clone)]
pub struct ReportDir {
    dir: PathBuf,
}

impl ReportDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn fragment(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Creates the directory, copies the LaTeX and Lua assets and writes the
    /// title unless one is already there. Safe to re-run.
    pub fn init(&self, package: Option<&str>, date: Option<&str>) -> Result<InitSummary> {
        let package = non_empty(package).unwrap_or(DEFAULT_PACKAGE).to_string();
        let date = match non_empty(date) {
            Some(d) => d.to_string(),
            None => chrono::Local::now().format("%Y-%m-%d").to_string(),
        };

        std::fs::create_dir_all(&self.dir).map_err(|e| ReportError::io("mkdir", &self.dir, e))?;
        assets::install(&self.dir, &[AssetGroup::Tex, AssetGroup::Lua])?;

        let path = self.fragment(REPORT_FILE);
        let existing = read_existing(&path)?;
        let title_written = !existing.contains(TITLE_MARKER);
        if title_written {
            let content = format!("{TITLE_MARKER} — {package} — {date}\n\n{existing}");
            std::fs::write(&path, content).map_err(|e| ReportError::io("write", &path, e))?;
        } else {
            tracing::debug!("{} already has a title", path.display());
        }

        Ok(InitSummary {
            package,
            date,
            title_written,
        })
    }

    pub fn append_hypothesis(&self, h: &Hypothesis) -> Result<()> {
        let section = format!(
            "\n## Hypothesis\n\nSuspected location: `{}`\n\nExpected: {}\n\nActual: {}\n",
            h.loc, h.expected, h.actual
        );
        append(&self.fragment(REPORT_FILE), &section)
    }

    /// Appends one table row; the section heading and table header are
    /// written only with the first row.
    pub fn append_trace_row(&self, row: &TraceRow) -> Result<()> {
        let path = self.fragment(TRACE_FILE);
        let mut out = String::new();
        if !file_contains(&path, TRACE_HEADING)? {
            out.push_str(TRACE_HEADING);
            out.push_str("\n\n");
            out.push_str(TRACE_TABLE_HEADER);
        }
        out.push_str(&format!(
            "| {} | {} | `{}` | {} |\n",
            row.n, row.action, row.loc, row.reason
        ));
        append(&path, &out)
    }

    pub fn append_evidence(&self, ev: &Evidence) -> Result<()> {
        let path = self.fragment(EVIDENCE_FILE);
        let mut out = String::new();
        if !file_contains(&path, EVIDENCE_HEADING)? {
            out.push_str(EVIDENCE_HEADING);
            out.push('\n');
        }
        out.push_str(&render_evidence(ev));
        append(&path, &out)
    }

    pub fn append_root_cause(&self, text: &str) -> Result<()> {
        append(
            &self.fragment(CONCLUSION_FILE),
            &format!("\n## Root Cause\n\n{text}\n"),
        )
    }

    pub fn append_fix(&self, text: &str, diff: Option<&str>) -> Result<()> {
        let mut out = format!("\n## Fix Applied\n\n{text}\n");
        if let Some(diff) = non_empty(diff) {
            out.push_str(&format!("\n```diff\n{}\n```\n", diff.trim_end_matches('\n')));
        }
        append(&self.fragment(CONCLUSION_FILE), &out)
    }

    pub fn append_verification(&self, text: &str) -> Result<()> {
        append(
            &self.fragment(CONCLUSION_FILE),
            &format!("\n## Post-fix Verification\n\n{text}\n"),
        )
    }
}

fn render_evidence(ev: &Evidence) -> String {
    let mut out = format!("\n### {}\n\n", ev.loc);

    if let Some(src) = &ev.src_file {
        if ev.highlight > 0 {
            match read_source_context(src, ev.highlight, ev.ctx) {
                Ok((lines, first)) if !lines.is_empty() => {
                    out.push_str("**Source context:**\n\n");
                    out.push_str(&fmt_source_block(&lines, first, ev.highlight));
                    out.push('\n');
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("skipping source context from {}: {e}", src.display()),
            }
        }
    }

    let mut block = |label: &str, text: Option<&str>| {
        if let Some(text) = non_empty(text) {
            out.push_str(&format!(
                "**{label}:**\n\n```text\n{}\n```\n\n",
                text.trim_end_matches('\n')
            ));
        }
    };
    block("Args", ev.args.as_deref());
    block("Locals", ev.locals.as_deref());
    block("Stack", ev.stack.as_deref());
    match (non_empty(ev.print_expr.as_deref()), non_empty(ev.print_val.as_deref())) {
        (Some(expr), Some(val)) => block(format!("Print `{expr}`").as_str(), Some(val)),
        (None, Some(val)) => block("Print", Some(val)),
        _ => {}
    }

    if let Some(obs) = non_empty(ev.obs.as_deref()) {
        out.push_str(&format!("**Observation:** {obs}\n"));
    }
    out
}

/// Lines `[line-ctx, line+ctx]` of `file` (1-based `line`) and the 1-based
/// number of the first returned line.
pub fn read_source_context(
    file: &Path,
    line: usize,
    ctx: usize,
) -> std::io::Result<(Vec<String>, usize)> {
    let data = std::fs::read_to_string(file)?;
    let all: Vec<&str> = data.split('\n').collect();
    let first = line.saturating_sub(ctx + 1);
    let last = (line + ctx).min(all.len());
    if first >= last {
        return Ok((Vec::new(), first + 1));
    }
    let lines = all[first..last].iter().map(|l| l.to_string()).collect();
    Ok((lines, first + 1))
}

pub fn fmt_source_block(lines: &[String], first_line: usize, highlight_line: usize) -> String {
    let mut out = format!(
        "```go {{highlightlines={highlight_line} firstnumber={first_line} highlightcolor=yellow!40}}\n"
    );
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("```\n");
    out
}

fn append(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ReportError::io("open", path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| ReportError::io("write", path, e))
}

fn file_contains(path: &Path, needle: &str) -> Result<bool> {
    Ok(read_existing(path)?.contains(needle))
}

/// A missing fragment reads as empty. Any other failure, including content
/// that is not UTF-8, is an error so the caller never writes over it.
fn read_existing(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(ReportError::io("read", path, e)),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PIPELINE_SRC: &str = "package main\n\nfunc Window(xs []int, size, step int) [][]int {\n\tvar out [][]int\n\tfor start := 0; start < len(xs); start += step {\n\t\tend := start + size\n\t\tif end > len(xs)-1 {\n\t\t\tend = len(xs) - 1\n\t\t}\n\t\tout = append(out, xs[start:end])\n\t}\n\treturn out\n}\n";

    fn report() -> (TempDir, ReportDir) {
        let tmp = TempDir::new().unwrap();
        let dir = ReportDir::new(tmp.path().join(".debug_2026-02-27T09-08-40"));
        (tmp, dir)
    }

    fn read(dir: &ReportDir, name: &str) -> String {
        std::fs::read_to_string(dir.fragment(name)).unwrap()
    }

    #[test]
    fn test_init_writes_title_and_assets() {
        let (_tmp, dir) = report();
        let summary = dir.init(Some("example.com/pipeline"), Some("2026-02-27")).unwrap();

        assert!(summary.title_written);
        assert_eq!(
            read(&dir, REPORT_FILE),
            "# Debug Report — example.com/pipeline — 2026-02-27\n\n"
        );
        assert!(dir.fragment("debug_report_preamble.tex").exists());
        assert!(dir.fragment("styles.tex").exists());
        assert!(dir.fragment("minted.lua").exists());
        assert!(!dir.fragment("99_checklist.md").exists());
    }

    #[test]
    fn test_init_defaults() {
        let (_tmp, dir) = report();
        let summary = dir.init(None, Some("")).unwrap();
        assert_eq!(summary.package, "unknown");
        assert_eq!(summary.date.len(), 10);
        assert!(read(&dir, REPORT_FILE).starts_with("# Debug Report — unknown — "));
    }

    #[test]
    fn test_init_twice_keeps_single_title() {
        let (_tmp, dir) = report();
        dir.init(Some("pkg"), Some("2026-02-27")).unwrap();
        dir.append_hypothesis(&Hypothesis::default()).unwrap();

        let second = dir.init(Some("pkg"), Some("2026-02-28")).unwrap();
        assert!(!second.title_written);

        let content = read(&dir, REPORT_FILE);
        assert_eq!(content.matches("# Debug Report").count(), 1);
        assert!(content.contains("## Hypothesis"));
    }

    #[test]
    fn test_init_prepends_title_to_earlier_sections() {
        let (_tmp, dir) = report();
        std::fs::create_dir_all(dir.path()).unwrap();
        dir.append_hypothesis(&Hypothesis::default()).unwrap();

        assert!(dir.init(Some("pkg"), Some("2026-02-27")).unwrap().title_written);
        let content = read(&dir, REPORT_FILE);
        assert!(content.starts_with("# Debug Report — pkg — 2026-02-27\n\n\n## Hypothesis\n"));
    }

    #[test]
    fn test_init_leaves_unreadable_report_untouched() {
        let (_tmp, dir) = report();
        std::fs::create_dir_all(dir.path()).unwrap();
        let original: &[u8] = b"## Hypothesis H1\ncaf\xE9\n";
        std::fs::write(dir.fragment(REPORT_FILE), original).unwrap();

        let err = dir.init(Some("pkg"), Some("2026-10-17")).unwrap_err();
        assert!(err.to_string().starts_with("read "), "{err}");
        assert_eq!(std::fs::read(dir.fragment(REPORT_FILE)).unwrap(), original);
    }

    #[test]
    fn test_trace_row_fails_on_unreadable_fragment() {
        let (_tmp, dir) = report();
        std::fs::create_dir_all(dir.path()).unwrap();
        let mut original = format!("{TRACE_HEADING}\n\n{TRACE_TABLE_HEADER}").into_bytes();
        original.extend_from_slice(b"| 1 | set | `caf\xE9.go:3` | latin-1 |\n");
        std::fs::write(dir.fragment(TRACE_FILE), &original).unwrap();

        let row = TraceRow {
            n: 2,
            action: "hit".into(),
            ..TraceRow::default()
        };
        assert!(dir.append_trace_row(&row).is_err());
        assert_eq!(std::fs::read(dir.fragment(TRACE_FILE)).unwrap(), original);
    }

    #[test]
    fn test_hypothesis_format() {
        let (_tmp, dir) = report();
        dir.init(Some("pkg"), Some("2026-02-27")).unwrap();
        dir.append_hypothesis(&Hypothesis {
            loc: "pipeline.go:28".into(),
            expected: "last window ends at 16".into(),
            actual: "ends at 15".into(),
        })
        .unwrap();

        assert_eq!(
            read(&dir, REPORT_FILE),
            "# Debug Report — pkg — 2026-02-27\n\n\n## Hypothesis\n\nSuspected location: `pipeline.go:28`\n\nExpected: last window ends at 16\n\nActual: ends at 15\n"
        );
    }

    #[test]
    fn test_trace_rows_share_one_header() {
        let (_tmp, dir) = report();
        std::fs::create_dir_all(dir.path()).unwrap();
        for (n, action) in [(1, "set"), (2, "hit"), (3, "clear")] {
            dir.append_trace_row(&TraceRow {
                n,
                action: action.into(),
                loc: "pipeline.go:28".into(),
                reason: format!("row {n}"),
            })
            .unwrap();
        }

        let content = read(&dir, TRACE_FILE);
        assert_eq!(content.matches(TRACE_HEADING).count(), 1);
        assert_eq!(content.matches("| - | ------ |").count(), 1);
        let rows: Vec<&str> = content
            .lines()
            .filter(|l| l.starts_with("| ") && l.contains("pipeline.go"))
            .collect();
        assert_eq!(
            rows,
            vec![
                "| 1 | set | `pipeline.go:28` | row 1 |",
                "| 2 | hit | `pipeline.go:28` | row 2 |",
                "| 3 | clear | `pipeline.go:28` | row 3 |",
            ]
        );
    }

    #[test]
    fn test_evidence_block_with_source_and_print() {
        let (tmp, dir) = report();
        std::fs::create_dir_all(dir.path()).unwrap();
        let src = tmp.path().join("pipeline.go");
        std::fs::write(&src, PIPELINE_SRC).unwrap();

        dir.append_evidence(&Evidence {
            loc: "pipeline.go:7".into(),
            src_file: Some(src),
            highlight: 7,
            locals: Some("start = 12\nend = 16\n".into()),
            print_expr: Some("end".into()),
            print_val: Some("end = 16".into()),
            obs: Some("end is 16 before the guard".into()),
            ..Evidence::default()
        })
        .unwrap();

        let content = read(&dir, EVIDENCE_FILE);
        assert!(content.starts_with("## Breakpoints & Evidence\n\n### pipeline.go:7\n\n"));
        assert!(content.contains(
            "```go {highlightlines=7 firstnumber=5 highlightcolor=yellow!40}\n\tfor start"
        ));
        assert!(content.contains("\t\t\tend = len(xs) - 1\n\t\t}\n```\n"));
        assert!(content.contains("**Locals:**\n\n```text\nstart = 12\nend = 16\n```\n\n"));
        assert!(content.contains("**Print `end`:**\n\n```text\nend = 16\n```\n\n"));
        assert!(content.ends_with("**Observation:** end is 16 before the guard\n"));
        assert!(!content.contains("**Args:**"));
    }

    #[test]
    fn test_evidence_heading_once_and_missing_source_skipped() {
        let (tmp, dir) = report();
        std::fs::create_dir_all(dir.path()).unwrap();
        for loc in ["a.go:1", "b.go:2"] {
            dir.append_evidence(&Evidence {
                loc: loc.into(),
                src_file: Some(tmp.path().join("missing.go")),
                highlight: 3,
                print_val: Some("x = 1".into()),
                ..Evidence::default()
            })
            .unwrap();
        }

        let content = read(&dir, EVIDENCE_FILE);
        assert_eq!(content.matches(EVIDENCE_HEADING).count(), 1);
        assert!(!content.contains("Source context"));
        assert_eq!(content.matches("**Print:**").count(), 2);
    }

    #[test]
    fn test_conclusion_sections() {
        let (_tmp, dir) = report();
        std::fs::create_dir_all(dir.path()).unwrap();
        dir.append_root_cause("guard uses len(xs)-1").unwrap();
        dir.append_fix("use len(xs)", Some("-a\n+b\n")).unwrap();
        dir.append_verification("3 failing tests now pass").unwrap();

        assert_eq!(
            read(&dir, CONCLUSION_FILE),
            "\n## Root Cause\n\nguard uses len(xs)-1\n\
             \n## Fix Applied\n\nuse len(xs)\n\n```diff\n-a\n+b\n```\n\
             \n## Post-fix Verification\n\n3 failing tests now pass\n"
        );
    }

    #[test]
    fn test_read_source_context_clamps() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("x.go");
        std::fs::write(&src, "a\nb\nc\n").unwrap();

        let (lines, first) = read_source_context(&src, 1, 2).unwrap();
        assert_eq!(first, 1);
        assert_eq!(lines, vec!["a", "b", "c"]);

        let (lines, first) = read_source_context(&src, 3, 1).unwrap();
        assert_eq!(first, 2);
        assert_eq!(lines, vec!["b", "c", ""]);
    }
}
