mod cli;
mod commands;
mod launcher;
mod report;

use std::process::ExitCode;

use clap::Parser;
use delve_bridge_core::DelveConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    // stdout carries command output; diagnostics stay on stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("delve-helper: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    let config = DelveConfig::from_env();
    tracing::debug!(?config, "resolved configuration");

    match command {
        Command::Start(args) => launcher::start(&config, args).await,
        Command::Stop => launcher::stop(&config),
        Command::Session(session) => commands::dispatch(&config, session).await,
        Command::ReportInit(args) => report::init(args),
        Command::ReportHypothesis(args) => report::hypothesis(args),
        Command::ReportTraceRow(args) => report::trace_row(args),
        Command::ReportEvidence(args) => report::evidence(args),
        Command::ReportRootCause(args) => report::root_cause(args),
        Command::ReportFix(args) => report::fix(args),
        Command::ReportVerification(args) => report::verification(args),
        Command::ReportBuild(args) => report::build(args),
        Command::InstallTemplates => report::install_templates(),
    }
}
