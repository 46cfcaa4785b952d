//! Command-line entry point for jardecomp.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use jardecomp::{Cli, Decompiler, PipelineReport};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Dropping the pipeline on Ctrl-C removes its working directory and
    // kills a running CFR.
    tokio::select! {
        result = run(&cli) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("{e:#}");
                ExitCode::FAILURE
            }
        },
        Ok(()) = tokio::signal::ctrl_c() => {
            log::info!("aborted by user");
            ExitCode::SUCCESS
        }
    }
}

/// Resolve the decompiler, then run the selected pipeline.
///
/// The decompiler is checked first so a missing jar or runtime is reported
/// before the target archive is looked at.
async fn run(cli: &Cli) -> Result<()> {
    let decompiler = Decompiler::new(&cli.config())?;
    let report = cli.mode().run(&decompiler, cli.archive()).await?;
    summarize(&report);
    Ok(())
}

fn summarize(report: &PipelineReport) {
    log::info!(
        "{} entries extracted, {} class files removed -> {}",
        report.extracted,
        report.pruned,
        report.output.display()
    );
    if !report.warnings.is_empty() {
        log::warn!(
            "finished with {} warning(s); see above for details",
            report.warnings.len()
        );
    }
}
