//! Document assembler: fragments → markdown → LaTeX → PDF.
//!
//! pandoc does the markdown conversion and pdflatex the compilation; both are
//! external tools looked up on `PATH`. Between them sit a few textual repairs
//! that pandoc does not offer switches for.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::assets::{self, BODY_PLACEHOLDER, DATE_PLACEHOLDER, PACKAGE_PLACEHOLDER};
use crate::{ReportError, Result};

pub const TEX_FILE: &str = "debug_report.tex";
pub const PDF_FILE: &str = "debug_report.pdf";

const CHECKLIST_FILE: &str = "99_checklist.md";
const TEMPLATE_FRAGMENT_PREFIX: &str = "frag_";
const FRAGMENT_SEPARATOR: &str = "\n\n";
const COMPILE_PASSES: usize = 2;
const FALLBACK_COLUMNS: usize = 4;

static LTCAPTYPE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\s*\\def\\LTcaptype\{none\} % do not increment counter\s*\n")
        .expect("must compile")
});
static LTCAPTYPE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\\end\{longtable\}\s*\n)\}").expect("must compile"));
static COLUMN_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\begin\{longtable\}\[\]\{@\{\}\s*(?s:.*?)\}\}\s*\\toprule\\noalign\{\}")
        .expect("must compile")
});
static COLUMN_LETTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\]\{@\{\}(.*?)@\{\}\}").expect("must compile"));
static MINIPAGE_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\\begin\{minipage\}\[b\]\{\\linewidth\}\\raggedright\s*\n\s*([^\n]+)\s*\n\s*\\end\{minipage\}",
    )
    .expect("must compile")
});
static ROOT_CAUSE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\(?:section|subsection)\{Root Cause\}[^\n]*\n").expect("must compile")
});
static FIX_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\(?:section|subsection)\{Fix(?: Applied)?\}[^\n]*\n").expect("must compile")
});
static NEXT_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\\(?:section|subsection)\{").expect("must compile"));
static DIR_STAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2})").expect("must compile")
});

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub package: Option<String>,
    pub date: Option<String>,
    pub pdf: bool,
    /// Where to copy the PDF; derived from the directory name when unset.
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub tex_path: PathBuf,
    pub tex: String,
    pub fragment_count: usize,
    pub pdf_path: Option<PathBuf>,
    pub copied_to: Option<PathBuf>,
}

/// Full pipeline for one artifact directory.
pub fn build(dir: &Path, opts: &BuildOptions) -> Result<BuildOutcome> {
    let (tex, fragment_count) = md_to_tex(dir, opts.package.as_deref(), opts.date.as_deref())?;

    let tex_path = dir.join(TEX_FILE);
    std::fs::write(&tex_path, &tex).map_err(|e| ReportError::io("write", &tex_path, e))?;
    tracing::info!("wrote {} from {fragment_count} fragments", tex_path.display());

    let mut outcome = BuildOutcome {
        tex_path,
        tex,
        fragment_count,
        pdf_path: None,
        copied_to: None,
    };
    if !opts.pdf {
        return Ok(outcome);
    }

    let (pdf_path, copied_to) = publish_pdf(dir, opts.out.as_deref(), opts.date.as_deref())?;
    outcome.pdf_path = Some(pdf_path);
    outcome.copied_to = copied_to;
    Ok(outcome)
}

/// Compiles the already written `.tex` and copies the PDF to `out`, or to the
/// stamp-derived default when `out` is unset.
pub fn publish_pdf(
    dir: &Path,
    out: Option<&Path>,
    date: Option<&str>,
) -> Result<(PathBuf, Option<PathBuf>)> {
    let pdf = tex_to_pdf(dir)?;
    let dest = out
        .map(Path::to_path_buf)
        .or_else(|| default_pdf_path(dir, date));
    let copied = match dest {
        Some(dest) => Some(copy_pdf(dir, &dest)?),
        None => None,
    };
    Ok((pdf, copied))
}

/// Report fragments in document order: visible `*.md` files, minus the
/// markdown templates and the checklist.
pub fn collect_fragments(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| ReportError::io("read dir", dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ReportError::io("read dir", dir, e))?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.')
            || !name.to_lowercase().ends_with(".md")
            || name.starts_with(TEMPLATE_FRAGMENT_PREFIX)
            || name == CHECKLIST_FILE
        {
            continue;
        }
        names.push(name);
    }

    if names.is_empty() {
        return Err(ReportError::NoFragments(dir.to_path_buf()));
    }
    names.sort();
    Ok(names.into_iter().map(|n| dir.join(n)).collect())
}

pub fn concat_fragments(paths: &[PathBuf]) -> Result<String> {
    let mut parts = Vec::with_capacity(paths.len());
    for path in paths {
        parts.push(std::fs::read_to_string(path).map_err(|e| ReportError::io("read", path, e))?);
    }
    Ok(parts.join(FRAGMENT_SEPARATOR))
}

/// Complete LaTeX document for the fragments in `dir`, plus how many
/// fragments went into it.
pub fn md_to_tex(
    dir: &Path,
    package: Option<&str>,
    date: Option<&str>,
) -> Result<(String, usize)> {
    let fragments = collect_fragments(dir)?;
    let markdown = fix_markdown_tables(&concat_fragments(&fragments)?);

    let body = run_pandoc(&markdown)?;
    let body = wrap_styled_sections(&fix_longtable(&body));

    let tex = render_template(assets::DOCUMENT_TEMPLATE, &body, package, date)?;
    Ok((tex, fragments.len()))
}

/// Inserts a `| --- |` separator after the first row of any table that lacks
/// one. Rows further down a table are left alone.
pub fn fix_markdown_tables(md: &str) -> String {
    let lines: Vec<&str> = md.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_table = false;

    for (i, line) in lines.iter().enumerate() {
        out.push(line.to_string());
        let is_row = line.starts_with('|') && line[1..].contains('|');
        if is_row && !in_table {
            if let Some(next) = lines.get(i + 1) {
                if next.starts_with('|') && !next.contains("---") {
                    let columns = line.matches('|').count().saturating_sub(1).max(1);
                    out.push(format!("|{}", " --- |".repeat(columns)));
                }
            }
        }
        in_table = is_row;
    }
    out.join("\n")
}

fn column_spec(columns: usize) -> String {
    match columns {
        2 => r"@{}p{0.38\linewidth}p{0.52\linewidth}@{}".to_string(),
        3 => r"@{}p{0.22\linewidth}p{0.28\linewidth}p{0.40\linewidth}@{}".to_string(),
        4 => r"@{}p{1.5cm}p{2.2cm}p{3.8cm}p{0.35\linewidth}@{}".to_string(),
        n => {
            let width = 0.88 / n as f64;
            let cells = format!("p{{{width:.2}\\linewidth}}").repeat(n);
            format!("@{{}}{cells}@{{}}")
        }
    }
}

fn count_columns(spec: &str) -> usize {
    let ragged = spec.matches(r">{\raggedright").count();
    if ragged > 0 {
        return ragged;
    }
    let letters = COLUMN_LETTERS
        .captures(spec)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().chars().filter(|ch| matches!(ch, 'l' | 'r' | 'c')).count())
        .unwrap_or(0);
    if letters > 0 {
        letters
    } else {
        FALLBACK_COLUMNS
    }
}

/// Replaces pandoc's longtable column specs with fixed proportional widths,
/// drops the `\LTcaptype{none}` wrapper and unwraps minipage header cells.
pub fn fix_longtable(latex: &str) -> String {
    let s = LTCAPTYPE_OPEN.replace_all(latex, "");
    let s = LTCAPTYPE_CLOSE.replace_all(&s, "${1}");
    let s = COLUMN_SPEC.replace_all(&s, |caps: &Captures| {
        let spec = column_spec(count_columns(&caps[0]));
        format!("\\begin{{longtable}}{{{spec}}}\n\\toprule\n\\noalign{{}}")
    });
    MINIPAGE_CELL.replace_all(&s, "${1}").into_owned()
}

fn wrap_sections(mut s: String, heading: &Regex, env: &str) -> String {
    let open = format!("\\begin{{{env}}}\n");
    let close = format!("\n\\end{{{env}}}\n");

    while let Some(range) = heading.find(&s).map(|m| m.range()) {
        let start = range.start;
        s.replace_range(range, &open);

        let from = start + open.len();
        let rest = &s[from..];
        let insert_at = if let Some(next) = NEXT_SECTION.find(rest) {
            from + next.start()
        } else if let Some(idx) = rest.find("\\end{document}") {
            from + idx
        } else {
            s.len()
        };
        s.insert_str(insert_at, &close);
    }
    s
}

/// Wraps the "Root Cause" and "Fix"/"Fix Applied" sections in the
/// `rootcausebox` and `fixbox` environments. Each box ends at the next
/// section heading, else at `\end{document}`, else at the end.
pub fn wrap_styled_sections(latex: &str) -> String {
    let s = wrap_sections(latex.to_string(), &ROOT_CAUSE_HEADING, "rootcausebox");
    wrap_sections(s, &FIX_HEADING, "fixbox")
}

/// Escapes the ten LaTeX special characters for use in running text.
fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str(r"\textbackslash{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '{' | '}' | '_' | '&' | '%' | '#' | '$' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_template(
    template: &str,
    body: &str,
    package: Option<&str>,
    date: Option<&str>,
) -> Result<String> {
    if !template.contains(BODY_PLACEHOLDER) {
        return Err(ReportError::MissingPlaceholder(BODY_PLACEHOLDER));
    }
    let mut out = template.to_string();
    if let Some(package) = package.filter(|p| !p.is_empty()) {
        out = out.replace(PACKAGE_PLACEHOLDER, &escape_latex(package));
    }
    if let Some(date) = date.filter(|d| !d.is_empty()) {
        out = out.replace(DATE_PLACEHOLDER, date);
    }
    Ok(out.replacen(BODY_PLACEHOLDER, body, 1))
}

fn run_pandoc(markdown: &str) -> Result<String> {
    let pandoc = which::which("pandoc").map_err(|_| ReportError::ToolMissing {
        tool: "pandoc",
        purpose: "convert markdown to LaTeX",
    })?;

    let mut filter = tempfile::Builder::new()
        .prefix("delve-minted-")
        .suffix(".lua")
        .tempfile()
        .map_err(|e| ReportError::io("create", &std::env::temp_dir(), e))?;
    filter
        .write_all(assets::MINTED_FILTER.as_bytes())
        .and_then(|_| filter.flush())
        .map_err(|e| ReportError::io("write", filter.path(), e))?;

    let mut child = Command::new(&pandoc)
        .args(["-f", "markdown", "-t", "latex", "--wrap=preserve"])
        .arg(format!("--lua-filter={}", filter.path().display()))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ReportError::ToolFailed {
            tool: "pandoc",
            detail: e.to_string(),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(markdown.as_bytes())
            .map_err(|e| ReportError::ToolFailed {
                tool: "pandoc",
                detail: e.to_string(),
            })?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| ReportError::ToolFailed {
            tool: "pandoc",
            detail: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(ReportError::ToolFailed {
            tool: "pandoc",
            detail: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Compiles `debug_report.tex` in `dir`. Two passes so references settle;
/// individual pass failures are tolerated as long as a PDF comes out.
pub fn tex_to_pdf(dir: &Path) -> Result<PathBuf> {
    assets::ensure_compile_assets(dir)?;
    let pdflatex = which::which("pdflatex").map_err(|_| ReportError::ToolMissing {
        tool: "pdflatex",
        purpose: "compile PDF",
    })?;

    for pass in 1..=COMPILE_PASSES {
        let status = Command::new(&pdflatex)
            .args(["-shell-escape", "-interaction=nonstopmode", TEX_FILE])
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(std::io::stderr()))
            .status()
            .map_err(|e| ReportError::ToolFailed {
                tool: "pdflatex",
                detail: e.to_string(),
            })?;
        if !status.success() {
            tracing::warn!("pdflatex pass {pass} exited with {status}");
        }
    }

    let pdf = dir.join(PDF_FILE);
    match std::fs::metadata(&pdf) {
        Ok(meta) if meta.len() > 0 => Ok(pdf),
        _ => Err(ReportError::NoArtifact(pdf)),
    }
}

/// Copies the compiled PDF to `dest`, returning the absolute destination.
pub fn copy_pdf(dir: &Path, dest: &Path) -> Result<PathBuf> {
    let src = dir.join(PDF_FILE);
    let dest = if dest.is_absolute() {
        dest.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|e| ReportError::io("resolve", dest, e))?;
        cwd.join(dest)
    };
    std::fs::copy(&src, &dest).map_err(|e| ReportError::io("copy", &src, e))?;
    Ok(dest)
}

/// `YYYY-MM-DDTHH-MM-SS` embedded in the directory name, e.g.
/// `.debug_2026-02-27T09-08-40`.
pub fn dir_stamp(dir: &Path) -> Option<String> {
    let name = dir.file_name()?.to_string_lossy();
    DIR_STAMP.find(&name).map(|m| m.as_str().to_string())
}

/// `./debug_report_<stamp>.pdf`, falling back to the explicit date.
pub fn default_pdf_path(dir: &Path, date: Option<&str>) -> Option<PathBuf> {
    let stamp = dir_stamp(dir).or_else(|| date.filter(|d| !d.is_empty()).map(str::to_string))?;
    Some(PathBuf::from(format!("./debug_report_{stamp}.pdf")))
}
