use comfy_table::Table;
use libcodeledger_core::{types::format_ts, FileRecord, FileStatus, FileSummary, LedgerError};
use serde::Serialize;
use crate::cli::Cli;
use crate::output::{output_success, Human};
use crate::session::Session;

#[derive(Serialize)]
struct FileAddOutput {
    name: String,
    version: String,
    created: String,
}

impl Human for FileAddOutput {
    fn human(&self) -> String {
        format!("Added file: {} (Version {})", self.name, self.version)
    }
}

#[derive(Serialize)]
struct FileSelectOutput {
    selected: String,
}

impl Human for FileSelectOutput {
    fn human(&self) -> String {
        format!("Selected {}", self.selected)
    }
}

#[derive(Serialize)]
struct FileSummaryJson {
    name: String,
    version: String,
    status: String,
    created: String,
    note_count: usize,
    issue_count: usize,
    snapshot_count: usize,
}

impl From<&FileSummary> for FileSummaryJson {
    fn from(s: &FileSummary) -> Self {
        Self {
            name: s.name.clone(),
            version: s.version.clone(),
            status: s.status.to_string(),
            created: format_ts(&s.created),
            note_count: s.note_count,
            issue_count: s.issue_count,
            snapshot_count: s.snapshot_count,
        }
    }
}

#[derive(Serialize)]
struct FileListOutput {
    files: Vec<FileSummaryJson>,
    selected: Option<String>,
    total: usize,
}

impl Human for FileListOutput {
    fn human(&self) -> String {
        if self.files.is_empty() {
            return "No files yet. Use 'add <name>' to create one.".to_string();
        }
        let mut table = Table::new();
        table.set_header(vec!["", "File", "Version", "Status", "Notes", "Issues", "Snapshots"]);
        for f in &self.files {
            let marker = if self.selected.as_deref() == Some(f.name.as_str()) { "*" } else { "" };
            table.add_row(vec![
                marker.to_string(),
                f.name.clone(),
                f.version.clone(),
                f.status.clone(),
                f.note_count.to_string(),
                f.issue_count.to_string(),
                f.snapshot_count.to_string(),
            ]);
        }
        table.to_string()
    }
}

#[derive(Serialize)]
struct FileShowOutput {
    #[serde(flatten)]
    file: FileSummaryJson,
    current_code: String,
}

impl Human for FileShowOutput {
    fn human(&self) -> String {
        let mut table = Table::new();
        table.add_row(vec!["File", self.file.name.as_str()]);
        table.add_row(vec!["Version", self.file.version.as_str()]);
        table.add_row(vec!["Created", self.file.created.as_str()]);
        table.add_row(vec!["Status", self.file.status.as_str()]);
        table.add_row(vec!["Notes".to_string(), self.file.note_count.to_string()]);
        table.add_row(vec!["Issues".to_string(), self.file.issue_count.to_string()]);
        table.add_row(vec!["Snapshots".to_string(), self.file.snapshot_count.to_string()]);
        table.to_string()
    }
}

#[derive(Serialize)]
struct StatusOutput {
    name: String,
    status: String,
}

impl Human for StatusOutput {
    fn human(&self) -> String {
        format!("Updated status of {} to: {}", self.name, self.status)
    }
}

pub fn run_add(session: &mut Session, cli: &Cli, name: String) -> Result<(), LedgerError> {
    let record = session.store.create(&name)?;
    let output = FileAddOutput {
        name: record.name().to_string(),
        version: record.version().to_string(),
        created: format_ts(&record.created()),
    };
    session.select(&name)?;
    output_success(cli, output);
    Ok(())
}

pub fn run_select(session: &mut Session, cli: &Cli, name: &str) -> Result<(), LedgerError> {
    session.select(name)?;
    output_success(cli, FileSelectOutput {
        selected: name.to_string(),
    });
    Ok(())
}

pub fn run_files(session: &Session, cli: &Cli) {
    let files: Vec<FileSummaryJson> = session
        .store
        .summaries()
        .iter()
        .map(FileSummaryJson::from)
        .collect();
    let total = files.len();
    output_success(cli, FileListOutput {
        files,
        selected: session.selected().map(str::to_string),
        total,
    });
}

pub fn run_show(session: &Session, cli: &Cli, file: Option<String>) -> Result<(), LedgerError> {
    let name = session.target(file.as_deref())?;
    let record: &FileRecord = session.store.get(&name)?;
    output_success(cli, FileShowOutput {
        file: FileSummaryJson::from(&FileSummary::from(record)),
        current_code: session.store.current_code(&name)?.to_string(),
    });
    Ok(())
}

pub fn run_status(
    session: &mut Session,
    cli: &Cli,
    file: Option<String>,
    status: Vec<String>,
) -> Result<(), LedgerError> {
    let name = session.target(file.as_deref())?;
    let status: FileStatus = status.join(" ").parse()?;
    session.store.set_status(&name, status)?;
    output_success(cli, StatusOutput {
        name,
        status: status.to_string(),
    });
    Ok(())
}
