//! `dom-patch`: apply a patch to a document.
//!
//! Usage:
//!   dom-patch [--continue] [--denormalize | --invert] '<patch-array-json>'
//!
//! The document is read from stdin. Argument errors print the usage and
//! exit with code 2. Logging goes to stderr and is filtered by `RUST_LOG`
//! (default `warn`).

use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::Parser;
use dom_patch::cli::{run, CliError, CliOptions};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    match execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn execute() -> Result<(), CliError> {
    let options = CliOptions::parse();

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;

    let result = run(&options, buf.trim())?;
    if let Some(warnings) = &result.warnings {
        eprintln!("{warnings}");
    }
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", result.output)?;
    Ok(())
}
