use serde::Serialize;

use crate::store::RecordStore;
use crate::types::record::{format_ts, CodeSnapshot, FileRecord, Issue, Note};

pub const EXPORT_SCHEMA_VERSION: u32 = 1;

/// Export metadata
#[derive(Debug, Serialize)]
pub struct ExportMeta {
    pub schema_version: u32,
    pub file_count: usize,
}

/// JSON export of every record in a session
#[derive(Debug, Serialize)]
pub struct SessionExport {
    pub meta: ExportMeta,
    pub files: Vec<FileRecordJson>,
}

/// File record for JSON export
#[derive(Debug, Serialize)]
pub struct FileRecordJson {
    pub name: String,
    pub version: String,
    pub created: String,
    pub status: String,
    pub notes: Vec<NoteJson>,
    pub issues: Vec<IssueJson>,
    pub code_snapshots: Vec<SnapshotJson>,
}

#[derive(Debug, Serialize)]
pub struct NoteJson {
    pub timestamp: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct IssueJson {
    pub timestamp: String,
    pub description: String,
    pub severity: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct SnapshotJson {
    pub timestamp: String,
    pub code: String,
}

impl From<&Note> for NoteJson {
    fn from(n: &Note) -> Self {
        Self {
            timestamp: format_ts(&n.timestamp),
            content: n.content.clone(),
        }
    }
}

impl From<&Issue> for IssueJson {
    fn from(i: &Issue) -> Self {
        Self {
            timestamp: format_ts(&i.timestamp),
            description: i.description.clone(),
            severity: i.severity.to_string(),
            status: i.status.to_string(),
        }
    }
}

impl From<&CodeSnapshot> for SnapshotJson {
    fn from(s: &CodeSnapshot) -> Self {
        Self {
            timestamp: format_ts(&s.timestamp),
            code: s.code.clone(),
        }
    }
}

impl From<&FileRecord> for FileRecordJson {
    fn from(r: &FileRecord) -> Self {
        Self {
            name: r.name().to_string(),
            version: r.version().to_string(),
            created: format_ts(&r.created()),
            status: r.status().to_string(),
            notes: r.notes().iter().map(NoteJson::from).collect(),
            issues: r.issues().iter().map(IssueJson::from).collect(),
            code_snapshots: r.snapshots().iter().map(SnapshotJson::from).collect(),
        }
    }
}

/// Export the whole session in insertion order
pub fn export_json(store: &RecordStore) -> SessionExport {
    let files: Vec<FileRecordJson> = store.records().map(FileRecordJson::from).collect();
    SessionExport {
        meta: ExportMeta {
            schema_version: EXPORT_SCHEMA_VERSION,
            file_count: files.len(),
        },
        files,
    }
}
