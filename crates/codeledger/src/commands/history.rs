use std::path::PathBuf;

use libcodeledger_core::{
    report::build_report,
    types::format_ts,
    LedgerError, MarkdownEngine, Severity,
};
use serde::Serialize;
use tracing::info;
use crate::cli::Cli;
use crate::output::{output_success, Human};
use crate::session::Session;

#[derive(Serialize)]
struct AppendOutput {
    name: String,
    kind: &'static str,
    timestamp: String,
    count: usize,
}

impl Human for AppendOutput {
    fn human(&self) -> String {
        match self.kind {
            "note" => format!("Saved testing notes for {}", self.name),
            "issue" => format!("Added issue to {}", self.name),
            _ => format!("Saved code for {}", self.name),
        }
    }
}

#[derive(Serialize)]
struct CurrentCodeOutput {
    name: String,
    code: String,
}

impl Human for CurrentCodeOutput {
    fn human(&self) -> String {
        self.code.clone()
    }
}

#[derive(Serialize)]
struct HistoryOutput {
    name: String,
    markdown: String,
}

impl Human for HistoryOutput {
    fn human(&self) -> String {
        self.markdown.clone()
    }
}

pub fn run_note(
    session: &mut Session,
    cli: &Cli,
    file: Option<String>,
    text: Vec<String>,
) -> Result<(), LedgerError> {
    let name = session.target(file.as_deref())?;
    let timestamp = format_ts(&session.store.append_note(&name, &text.join(" "))?.timestamp);
    let count = session.store.get(&name)?.notes().len();
    output_success(cli, AppendOutput {
        name,
        kind: "note",
        timestamp,
        count,
    });
    Ok(())
}

pub fn run_issue(
    session: &mut Session,
    cli: &Cli,
    file: Option<String>,
    severity: &str,
    text: Vec<String>,
) -> Result<(), LedgerError> {
    let name = session.target(file.as_deref())?;
    let severity: Severity = severity.parse()?;
    let timestamp = format_ts(&session.store.append_issue(&name, &text.join(" "), severity)?.timestamp);
    let count = session.store.get(&name)?.issues().len();
    output_success(cli, AppendOutput {
        name,
        kind: "issue",
        timestamp,
        count,
    });
    Ok(())
}

pub fn run_code(
    session: &mut Session,
    cli: &Cli,
    file: Option<String>,
    from: Option<PathBuf>,
    text: Vec<String>,
) -> Result<(), LedgerError> {
    let name = session.target(file.as_deref())?;
    let code = match from {
        Some(path) => {
            info!(path = %path.display(), "reading code snapshot from file");
            std::fs::read_to_string(&path)?
        }
        None => unescape(&text.join(" ")),
    };
    let timestamp = format_ts(&session.store.append_snapshot(&name, &code)?.timestamp);
    let count = session.store.get(&name)?.snapshots().len();
    output_success(cli, AppendOutput {
        name,
        kind: "code",
        timestamp,
        count,
    });
    Ok(())
}

pub fn run_current(session: &Session, cli: &Cli, file: Option<String>) -> Result<(), LedgerError> {
    let name = session.target(file.as_deref())?;
    let code = session.store.current_code(&name)?.to_string();
    output_success(cli, CurrentCodeOutput { name, code });
    Ok(())
}

pub fn run_history(session: &Session, cli: &Cli, file: Option<String>) -> Result<(), LedgerError> {
    let name = session.target(file.as_deref())?;
    let record = session.store.get(&name)?;
    let doc = build_report(record, &session.config.report);
    let markdown = MarkdownEngine.render_string(&doc)?;
    output_success(cli, HistoryOutput { name, markdown });
    Ok(())
}

/// Expand `\n`, `\t` and `\\` in inline code text
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
