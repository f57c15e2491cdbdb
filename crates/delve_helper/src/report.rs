//! Report subcommands: thin adapters from CLI flags to `debug_report`.

use anyhow::{anyhow, Result};
use debug_report::assets::{self, AssetGroup};
use debug_report::{BuildOptions, Evidence, Hypothesis, ReportDir, TraceRow};

use crate::cli::{
    EvidenceArgs, FixArgs, HypothesisArgs, ReportBuildArgs, ReportInitArgs, TextArgs, TraceRowArgs,
};

const PREVIEW_CHARS: usize = 2000;

pub fn init(args: ReportInitArgs) -> Result<()> {
    let summary = ReportDir::new(&args.dir).init(args.pkg.as_deref(), args.date.as_deref())?;
    println!(
        "initialized {} (pkg={} date={})",
        args.dir.display(),
        summary.package,
        summary.date
    );
    Ok(())
}

pub fn hypothesis(args: HypothesisArgs) -> Result<()> {
    ReportDir::new(&args.dir).append_hypothesis(&Hypothesis {
        loc: args.loc,
        expected: args.expected,
        actual: args.actual,
    })?;
    println!("appended hypothesis");
    Ok(())
}

pub fn trace_row(args: TraceRowArgs) -> Result<()> {
    let row = TraceRow {
        n: args.n,
        action: args.action,
        loc: args.loc,
        reason: args.reason,
    };
    ReportDir::new(&args.dir).append_trace_row(&row)?;
    println!("appended trace row {} ({})", row.n, row.action);
    Ok(())
}

pub fn evidence(args: EvidenceArgs) -> Result<()> {
    let ev = Evidence {
        loc: args.loc,
        src_file: args.src_file,
        highlight: args.highlight,
        ctx: args.ctx,
        args: args.args,
        locals: args.locals,
        stack: args.stack,
        print_expr: args.print_expr,
        print_val: args.print_val,
        obs: args.obs,
    };
    ReportDir::new(&args.dir).append_evidence(&ev)?;
    println!("appended evidence for {}", ev.loc);
    Ok(())
}

pub fn root_cause(args: TextArgs) -> Result<()> {
    ReportDir::new(&args.dir).append_root_cause(&args.text)?;
    println!("appended root cause");
    Ok(())
}

pub fn fix(args: FixArgs) -> Result<()> {
    ReportDir::new(&args.dir).append_fix(&args.text, args.diff.as_deref())?;
    println!("appended fix");
    Ok(())
}

pub fn verification(args: TextArgs) -> Result<()> {
    ReportDir::new(&args.dir).append_verification(&args.text)?;
    println!("appended verification");
    Ok(())
}

/// Writes the `.tex` first and reports it, so a failing PDF step still
/// leaves something to inspect.
pub fn build(args: ReportBuildArgs) -> Result<()> {
    let opts = BuildOptions {
        package: args.pkg,
        date: args.date,
        pdf: false,
        out: None,
    };
    let outcome = debug_report::build(&args.dir, &opts)?;

    if args.verbose {
        let (preview, truncated) = preview(&outcome.tex, PREVIEW_CHARS);
        eprintln!("--- generated LaTeX (first {PREVIEW_CHARS} chars) ---");
        eprint!("{preview}");
        if truncated {
            eprint!("\n... (truncated)");
        }
        eprintln!("\n--- end ---");
    }
    println!(
        "wrote {} from {} markdown fragments",
        outcome.tex_path.display(),
        outcome.fragment_count
    );

    if !args.pdf {
        return Ok(());
    }
    let (pdf, copied) =
        debug_report::publish_pdf(&args.dir, args.out.as_deref(), opts.date.as_deref())?;
    println!("compiled {}", pdf.display());
    if let Some(dest) = copied {
        println!("copied {} -> {}", pdf.display(), dest.display());
    }
    Ok(())
}

pub fn install_templates() -> Result<()> {
    let dest = assets::install_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    let written = assets::install(&dest, &[AssetGroup::Tex, AssetGroup::Lua, AssetGroup::Markdown])?;
    for path in written {
        println!("installed {}", path.display());
    }
    Ok(())
}

/// First `limit` characters of `text`, cut on a char boundary.
fn preview(text: &str, limit: usize) -> (&str, bool) {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("abc", 5), ("abc", false));
        assert_eq!(preview("abc", 3), ("abc", false));
        assert_eq!(preview("äöüß", 2), ("äö", true));
    }
}
