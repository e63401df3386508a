//! ultra-audit - production readiness audit for Rust marketplace services
//!
//! This is the main entry point for the CLI application.

use std::fs::File;
use std::sync::Mutex;

use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ultra_audit::cli::commands::{audit, list};
use ultra_audit::cli::{exit_codes, Cli};

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_codes::SUCCESS,
                _ => exit_codes::CONFIG_ERROR,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if cli.list {
        std::process::exit(list::execute());
    }

    // Nothing is run or written past this point unless the whole
    // configuration is valid
    let mut session = match audit::prepare(&cli) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(exit_codes::CONFIG_ERROR);
        }
    };

    setup_logging(cli.verbose, session.take_log_file());

    let exit_code = audit::execute(session).await;
    std::process::exit(exit_code);
}

fn setup_logging(verbosity: u8, log_file: Option<File>) {
    // -v only adds passed/skipped checks to the terminal output
    let filter = match verbosity {
        0 | 1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
            .with_filter(EnvFilter::new("ultra_audit=debug"))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(env_filter))
        .with(file_layer)
        .init();
}
