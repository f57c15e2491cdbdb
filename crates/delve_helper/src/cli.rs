use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Drive a headless Delve session one command at a time and record the
/// findings as a debug report.
///
/// The session handle lives in `.dlv/` (or `$DBG_DIR/.dlv/`). `DLV_ADDR`
/// overrides it; `DLV_RPC_LOG=1` logs RPC traffic to `.dlv/rpc.log`, any other
/// value is taken as the log path.
#[derive(Parser, Debug)]
#[command(name = "delve-helper", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start headless dlv and write its address and pid to the handle dir.
    Start(StartArgs),
    /// Terminate the running session (SIGTERM) and remove the handle.
    Stop,
    #[command(flatten)]
    Session(SessionCommand),
    /// Create the artifact dir, copy templates and write the report title.
    ReportInit(ReportInitArgs),
    /// Append the Hypothesis section to 00_report.md.
    ReportHypothesis(HypothesisArgs),
    /// Append one row to the Debugging Trace table (10_trace.md).
    ReportTraceRow(TraceRowArgs),
    /// Append one breakpoint evidence block (20_evidence.md).
    ReportEvidence(EvidenceArgs),
    /// Append the Root Cause section (90_conclusion.md).
    ReportRootCause(TextArgs),
    /// Append the Fix Applied section (90_conclusion.md).
    ReportFix(FixArgs),
    /// Append the Post-fix Verification section (90_conclusion.md).
    ReportVerification(TextArgs),
    /// Convert the report fragments to LaTeX and optionally compile a PDF.
    ReportBuild(ReportBuildArgs),
    /// Extract the embedded templates to ~/.local/share/delve-debug/.
    InstallTemplates,
}

/// Commands that talk to the running engine.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Print the current debugger state.
    State,
    /// Set a breakpoint, e.g. `main.go:42`, `main.main`, `main.go:55 if x == 5`.
    Break {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        spec: Vec<String>,
    },
    /// List breakpoints.
    #[command(alias = "bp")]
    Breakpoints,
    /// Clear a breakpoint by id.
    Clear { id: i64 },
    /// Resume until the next stop.
    #[command(alias = "c")]
    Continue,
    /// Step over.
    #[command(alias = "n")]
    Next,
    /// Step into.
    #[command(alias = "s")]
    Step,
    /// Step out of the current function.
    #[command(alias = "so")]
    Stepout,
    /// Evaluate an expression.
    #[command(alias = "p")]
    Print {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        expr: Vec<String>,
    },
    /// Print local variables.
    Locals,
    /// Print function arguments.
    #[command(name = "args")]
    FunctionArgs,
    /// Print the stack trace.
    #[command(alias = "bt")]
    Stack,
    /// List goroutines.
    #[command(alias = "grs")]
    Goroutines,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StartArgs {
    /// Run `dlv test` instead of `dlv debug`.
    #[arg(long, conflicts_with = "exec")]
    pub test: bool,
    /// Run `dlv exec` on an existing binary.
    #[arg(long)]
    pub exec: bool,
    /// Package directory, test package or binary (default `.`).
    pub target: Option<String>,
    /// Extra arguments passed through to the engine or the program.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub extra: Vec<String>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ReportInitArgs {
    /// Go package name for the report title.
    #[arg(long)]
    pub pkg: Option<String>,
    /// Date YYYY-MM-DD (default: today).
    #[arg(long)]
    pub date: Option<String>,
    pub dir: PathBuf,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct HypothesisArgs {
    /// Suspected location (file:line or function).
    #[arg(long, default_value = "file:line")]
    pub loc: String,
    #[arg(long, default_value = "<what should happen>")]
    pub expected: String,
    #[arg(long, default_value = "<what was observed>")]
    pub actual: String,
    pub dir: PathBuf,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TraceRowArgs {
    /// Row number.
    #[arg(long, default_value_t = 0)]
    pub n: u32,
    /// set | hit | clear | next | step
    #[arg(long, default_value = "")]
    pub action: String,
    #[arg(long, default_value = "")]
    pub loc: String,
    /// One-line reasoning.
    #[arg(long, default_value = "")]
    pub reason: String,
    pub dir: PathBuf,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct EvidenceArgs {
    /// Breakpoint location label (file:line).
    #[arg(long, default_value = "")]
    pub loc: String,
    /// Source file to quote around the highlighted line.
    #[arg(long)]
    pub src_file: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    pub highlight: usize,
    /// Lines of context above and below the highlighted line.
    #[arg(long, default_value_t = debug_report::fragments::DEFAULT_CONTEXT_LINES)]
    pub ctx: usize,
    /// Output of `delve-helper args`.
    #[arg(long, allow_hyphen_values = true)]
    pub args: Option<String>,
    /// Output of `delve-helper locals`.
    #[arg(long, allow_hyphen_values = true)]
    pub locals: Option<String>,
    /// Output of `delve-helper stack`.
    #[arg(long, allow_hyphen_values = true)]
    pub stack: Option<String>,
    #[arg(long)]
    pub print_expr: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub print_val: Option<String>,
    /// One-sentence observation.
    #[arg(long)]
    pub obs: Option<String>,
    pub dir: PathBuf,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TextArgs {
    #[arg(long, default_value = "")]
    pub text: String,
    pub dir: PathBuf,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct FixArgs {
    #[arg(long, default_value = "")]
    pub text: String,
    /// Unified diff of the change.
    #[arg(long, allow_hyphen_values = true)]
    pub diff: Option<String>,
    pub dir: PathBuf,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ReportBuildArgs {
    #[arg(long)]
    pub pkg: Option<String>,
    #[arg(long)]
    pub date: Option<String>,
    /// Compile to PDF with pdflatex.
    #[arg(long)]
    pub pdf: bool,
    /// Copy the PDF here (default ./debug_report_<stamp>.pdf).
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Echo the start of the generated LaTeX to stderr.
    #[arg(short, long)]
    pub verbose: bool,
    pub dir: PathBuf,
}
