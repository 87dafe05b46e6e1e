use chrono::NaiveDateTime;
use serde::Serialize;

use super::status::{FileStatus, IssueStatus, Severity};

/// Local wall-clock time, second precision
pub type Timestamp = NaiveDateTime;

/// Format used everywhere a timestamp is shown
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Version label assigned to newly created files
pub const INITIAL_VERSION: &str = "1.0";

pub fn format_ts(ts: &Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// A free-text testing note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub timestamp: Timestamp,
    pub content: String,
}

/// A reported issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub timestamp: Timestamp,
    pub description: String,
    pub severity: Severity,
    pub status: IssueStatus,
}

/// A saved copy of the file's code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeSnapshot {
    pub timestamp: Timestamp,
    pub code: String,
}

/// A named, versioned file and its history.
///
/// History lists are append-only and the creation time is fixed at
/// construction; only the store can mutate a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    name: String,
    version: String,
    created: Timestamp,
    status: FileStatus,
    notes: Vec<Note>,
    issues: Vec<Issue>,
    snapshots: Vec<CodeSnapshot>,
}

impl FileRecord {
    pub(crate) fn new(name: String, created: Timestamp) -> Self {
        Self {
            name,
            version: INITIAL_VERSION.to_string(),
            created,
            status: FileStatus::Active,
            notes: Vec::new(),
            issues: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn created(&self) -> Timestamp {
        self.created
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    /// Notes in insertion order
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Issues in insertion order
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Snapshots in insertion order
    pub fn snapshots(&self) -> &[CodeSnapshot] {
        &self.snapshots
    }

    /// The most recent snapshot, shown as the editable code
    pub fn current_snapshot(&self) -> Option<&CodeSnapshot> {
        self.snapshots.last()
    }

    pub(crate) fn set_status(&mut self, status: FileStatus) {
        self.status = status;
    }

    pub(crate) fn push_note(&mut self, note: Note) -> &Note {
        self.notes.push(note);
        &self.notes[self.notes.len() - 1]
    }

    pub(crate) fn push_issue(&mut self, issue: Issue) -> &Issue {
        self.issues.push(issue);
        &self.issues[self.issues.len() - 1]
    }

    pub(crate) fn push_snapshot(&mut self, snapshot: CodeSnapshot) -> &CodeSnapshot {
        self.snapshots.push(snapshot);
        &self.snapshots[self.snapshots.len() - 1]
    }
}

/// Summary of a file for list views
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub version: String,
    pub status: FileStatus,
    pub created: Timestamp,
    pub note_count: usize,
    pub issue_count: usize,
    pub snapshot_count: usize,
}

impl From<&FileRecord> for FileSummary {
    fn from(record: &FileRecord) -> Self {
        Self {
            name: record.name.clone(),
            version: record.version.clone(),
            status: record.status,
            created: record.created,
            note_count: record.notes.len(),
            issue_count: record.issues.len(),
            snapshot_count: record.snapshots.len(),
        }
    }
}
