//! codeledger - session shell over the record store
//!
//! Each line of input is one command (`add`, `note`, `issue`, `code`,
//! `report`, ...). Records live only as long as the session.

mod cli;
mod commands;
mod output;
mod session;

use std::fs::File;
use std::io::{BufReader, IsTerminal};
use std::path::{Path, PathBuf};

use clap::Parser;
use cli::Cli;
use libcodeledger_core::{load_config, save_config, LedgerConfig, LedgerError};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use session::Session;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(&cli) {
        error!("codeledger failed: {}", e);
        output::output_error(&cli, &e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: &Cli) -> Result<(), LedgerError> {
    let config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            load_config(path)?
        }
        None => LedgerConfig::default(),
    };

    if let Some(path) = &cli.init_config {
        return run_init_config(cli, path, &config);
    }

    let out_dir = cli
        .out_dir
        .clone()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut session = Session::new(config, out_dir)?;

    match &cli.script {
        Some(path) => {
            let file = File::open(path)?;
            session::run(&mut session, cli, BufReader::new(file), false);
        }
        None => {
            let stdin = std::io::stdin();
            let interactive = stdin.is_terminal();
            session::run(&mut session, cli, stdin.lock(), interactive);
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct InitConfigOutput {
    path: String,
}

impl output::Human for InitConfigOutput {
    fn human(&self) -> String {
        format!("Wrote config to {}", self.path)
    }
}

fn run_init_config(cli: &Cli, path: &Path, config: &LedgerConfig) -> Result<(), LedgerError> {
    save_config(path, config)?;
    info!(path = %path.display(), "config written");
    output::output_success(cli, InitConfigOutput {
        path: path.to_string_lossy().to_string(),
    });
    Ok(())
}
