//! The interactive session: one record store, one selection, one command per line.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;
use libcodeledger_core::{LedgerConfig, LedgerError, RecordStore};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cli::{Cli, SessionCommand, SessionLine};
use crate::commands;
use crate::output::{output_error, print_human};

/// Whether the session keeps reading after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Counters reported when the session ends
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionStats {
    pub commands: usize,
    pub errors: usize,
}

/// State shared by every command of one session
#[derive(Debug)]
pub struct Session {
    pub store: RecordStore,
    pub config: LedgerConfig,
    pub out_dir: PathBuf,
    selected: Option<String>,
}

impl Session {
    /// Start a session, creating any configured seed files
    pub fn new(config: LedgerConfig, out_dir: PathBuf) -> Result<Self, LedgerError> {
        Self::with_store(RecordStore::new(), config, out_dir)
    }

    pub fn with_store(
        mut store: RecordStore,
        config: LedgerConfig,
        out_dir: PathBuf,
    ) -> Result<Self, LedgerError> {
        for name in &config.seed_files {
            if store.contains(name) {
                debug!(name = %name, "seed file already present");
                continue;
            }
            store.create(name)?;
        }
        Ok(Self {
            store,
            config,
            out_dir,
            selected: None,
        })
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, name: &str) -> Result<(), LedgerError> {
        self.store.get(name)?;
        self.selected = Some(name.to_string());
        Ok(())
    }

    /// Resolve the file a command acts on: the explicit `--file`, else the
    /// selection, else the first file added.
    pub fn target(&self, explicit: Option<&str>) -> Result<String, LedgerError> {
        let name = match explicit {
            Some(name) => name,
            None => match self.selected.as_deref() {
                Some(name) => name,
                None => self
                    .store
                    .names()
                    .next()
                    .ok_or_else(|| LedgerError::NotFound("No files in session; use 'add <name>'".to_string()))?,
            },
        };
        Ok(self.store.get(name)?.name().to_string())
    }

    /// Run one parsed command
    pub fn execute(&mut self, cli: &Cli, command: SessionCommand) -> Result<Flow, LedgerError> {
        match command {
            SessionCommand::Add { name } => commands::file::run_add(self, cli, name.unwrap_or_default())?,
            SessionCommand::Select { name } => commands::file::run_select(self, cli, &name)?,
            SessionCommand::Files => commands::file::run_files(self, cli),
            SessionCommand::Show { file } => commands::file::run_show(self, cli, file)?,
            SessionCommand::Status { file, status } => commands::file::run_status(self, cli, file, status)?,
            SessionCommand::Note { file, text } => commands::history::run_note(self, cli, file, text)?,
            SessionCommand::Issue { file, severity, text } => {
                commands::history::run_issue(self, cli, file, &severity, text)?
            }
            SessionCommand::Code { file, from, text } => commands::history::run_code(self, cli, file, from, text)?,
            SessionCommand::Current { file } => commands::history::run_current(self, cli, file)?,
            SessionCommand::History { file } => commands::history::run_history(self, cli, file)?,
            SessionCommand::Report { file, format, link } => {
                commands::report::run_report(self, cli, file, format, link)?
            }
            SessionCommand::Export => commands::report::run_export(self, cli),
            SessionCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineError {
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),
}

impl From<LineError> for LedgerError {
    fn from(e: LineError) -> Self {
        LedgerError::InvalidArgs(e.to_string())
    }
}

/// Split a command line into words.
///
/// Single quotes are literal. Inside double quotes a backslash only escapes
/// `"` and `\`. Outside quotes a backslash escapes whitespace, quotes and
/// itself; any other backslash is kept so escapes like `\n` reach the command.
pub fn tokenize(line: &str) -> Result<Vec<String>, LineError> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => word.push(ch),
                        None => return Err(LineError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.peek() {
                            Some(&next) if next == '"' || next == '\\' => {
                                word.push(next);
                                chars.next();
                            }
                            _ => word.push('\\'),
                        },
                        Some(ch) => word.push(ch),
                        None => return Err(LineError::UnterminatedQuote('"')),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.peek() {
                    Some(&next) if next.is_whitespace() || matches!(next, '\'' | '"' | '\\') => {
                        word.push(next);
                        chars.next();
                    }
                    _ => word.push('\\'),
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }
    if in_word {
        words.push(word);
    }
    Ok(words)
}

/// Parse one input line. `Ok(None)` means there is nothing to run
/// (blank line, comment, or a help request that was already printed).
fn parse_line(cli: &Cli, line: &str) -> Result<Option<SessionCommand>, LedgerError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let words = tokenize(trimmed)?;
    match SessionLine::try_parse_from(words) {
        Ok(parsed) => Ok(Some(parsed.command)),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print_human(cli, e.render().to_string().trim_end());
            Ok(None)
        }
        Err(e) => Err(LedgerError::InvalidArgs(
            e.render().to_string().lines().next().unwrap_or("invalid command").trim_start_matches("error: ").to_string(),
        )),
    }
}

/// Read and run commands until `quit` or end of input
pub fn run<R: BufRead>(session: &mut Session, cli: &Cli, input: R, interactive: bool) -> SessionStats {
    let mut stats = SessionStats::default();
    let prompt = interactive && !cli.json && !cli.quiet;
    info!(files = session.store.len(), "session started");

    let mut lines = input.lines();
    loop {
        if prompt {
            print!("codeledger> ");
            let _ = std::io::stdout().flush();
        }
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                warn!("failed to read input: {}", e);
                output_error(cli, &LedgerError::Io(e));
                break;
            }
            None => break,
        };

        let command = match parse_line(cli, &line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                stats.errors += 1;
                output_error(cli, &e);
                continue;
            }
        };

        debug!(?command, "executing");
        stats.commands += 1;
        match session.execute(cli, command) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => {
                stats.errors += 1;
                warn!(code = e.error_code(), "command failed: {}", e);
                output_error(cli, &e);
            }
        }
    }

    info!(commands = stats.commands, errors = stats.errors, "session ended");
    stats
}
