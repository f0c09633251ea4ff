mod cli;
mod commands;
mod logging;

use std::process::ExitCode;

use camplicon_core::Error;
use camplicon_pipeline::StageError;
use clap::Parser;

use crate::cli::Cli;

/// Exit status when a stage ran out of candidates.
const EXIT_NO_VIABLE: u8 = 5;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    match commands::run(cli) {
        Ok(outcome) => {
            log::info!("report written to {}", outcome.report_path.display());
            match outcome.diagnostic() {
                Some(diagnostic) => {
                    log::warn!(
                        "nothing viable after the {} stage: {}",
                        diagnostic.stage,
                        diagnostic.message
                    );
                    ExitCode::from(EXIT_NO_VIABLE)
                }
                None => ExitCode::SUCCESS,
            }
        }
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    let cause = err
        .downcast_ref::<StageError>()
        .map(|e| &e.error)
        .or_else(|| err.downcast_ref::<Error>());
    match cause {
        Some(Error::Configuration(_)) => 2,
        Some(Error::MalformedInput { .. }) => 3,
        Some(Error::ExternalToolFailure { .. }) => 4,
        Some(Error::NoViableCandidates(_)) => EXIT_NO_VIABLE,
        Some(Error::Cancelled) => 130,
        Some(Error::Output { .. }) | None => 1,
    }
}
