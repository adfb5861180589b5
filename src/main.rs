use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use trezor_cipher::cli::{normalize_args, usage, Cli};
use trezor_cipher::{
    AskpassCommand, BridgeTransport, CipherConfig, CipherOperation, Outcome, EXIT_HOST_ERROR,
    EXIT_USAGE,
};

fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) if err.kind() == ErrorKind::DisplayVersion => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            let _ = err.print();
            eprint!("{}", usage());
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if cli.help {
        eprint!("{}", usage());
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.log_level.as_deref());

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match run(config) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(err) => {
            error!(error = %err, "cipher run aborted");
            eprintln!("Got error: {:#}", err);
            ExitCode::from(EXIT_HOST_ERROR)
        }
    }
}

fn run(config: CipherConfig) -> anyhow::Result<Outcome> {
    let transport = BridgeTransport::new(config.bridge_url.clone());
    let prompter = AskpassCommand::new(config.askpass_program.clone());
    let bridge_url = config.bridge_url.clone();

    let mut operation = CipherOperation::new(transport, prompter, config);
    let outcome = operation
        .run(&mut io::stdout().lock(), &mut io::stderr())
        .with_context(|| format!("device operation via {} failed", bridge_url))?;
    Ok(outcome)
}

/// Logs go to stderr; stdout carries only the ciphered value.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
