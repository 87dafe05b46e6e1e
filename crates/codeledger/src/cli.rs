use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "codeledger",
    about = "Track file versions, notes, issues and code history in one session",
    version
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Suppress human-readable output
    #[arg(long)]
    pub quiet: bool,

    /// Path to a TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the effective config as TOML to this path and exit
    #[arg(long)]
    pub init_config: Option<PathBuf>,

    /// Directory reports are written to (overrides config)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Read session commands from a file instead of stdin
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// One line typed into the session, parsed as if it were its own argv
#[derive(Parser, Debug)]
#[command(multicall = true)]
pub struct SessionLine {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Clone, Debug, Subcommand)]
pub enum SessionCommand {
    /// Add a new file at version 1.0 and select it
    Add {
        /// File name, with extension (e.g. app1.py)
        name: Option<String>,
    },

    /// Select the file later commands act on
    Select {
        name: String,
    },

    /// List files in this session
    Files,

    /// Show file details
    Show {
        #[arg(long)]
        file: Option<String>,
    },

    /// Set file status (active, deprecated, issues-found)
    Status {
        #[arg(long)]
        file: Option<String>,

        #[arg(required = true, num_args = 1..)]
        status: Vec<String>,
    },

    /// Save a testing note
    Note {
        #[arg(long)]
        file: Option<String>,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Report an issue
    Issue {
        #[arg(long)]
        file: Option<String>,

        /// Severity (low, medium, high, critical)
        #[arg(long, short, default_value = "low")]
        severity: String,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Save a code snapshot; inline text honours \n and \t escapes
    Code {
        #[arg(long)]
        file: Option<String>,

        /// Read the code from a file
        #[arg(long, conflicts_with = "text")]
        from: Option<PathBuf>,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Print the latest code snapshot
    Current {
        #[arg(long)]
        file: Option<String>,
    },

    /// Print the file's history as Markdown
    History {
        #[arg(long)]
        file: Option<String>,
    },

    /// Render the file's report
    Report {
        #[arg(long)]
        file: Option<String>,

        #[arg(long, value_enum, default_value_t = ReportFormat::Pdf)]
        format: ReportFormat,

        /// Print a base64 data link instead of writing a file
        #[arg(long)]
        link: bool,
    },

    /// Dump every file in the session as JSON
    Export,

    /// End the session
    #[command(alias = "exit")]
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Pdf,
    Md,
}
