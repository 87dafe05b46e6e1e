use std::cell::Cell;

use chrono::{Duration, Local, SubsecRound};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::LedgerError;
use crate::types::record::{CodeSnapshot, FileRecord, FileSummary, Issue, Note, Timestamp};
use crate::types::status::{FileStatus, IssueStatus, Severity};

/// Source of "now" for new records and history entries
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Local wall clock truncated to whole seconds
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Local::now().naive_local().trunc_subsecs(0)
    }
}

/// Clock that starts at a fixed instant and advances one second per reading
#[derive(Debug)]
pub struct SteppingClock {
    next: Cell<Timestamp>,
}

impl SteppingClock {
    pub fn new(start: Timestamp) -> Self {
        Self { next: Cell::new(start) }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Timestamp {
        let ts = self.next.get();
        self.next.set(ts + Duration::seconds(1));
        ts
    }
}

/// In-memory file records for one session.
///
/// Names are unique and iterate in insertion order. Failed operations leave
/// the store untouched.
pub struct RecordStore {
    files: IndexMap<String, FileRecord>,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("files", &self.files.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// Create an empty store stamped by the system clock
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            files: IndexMap::new(),
            clock: Box::new(clock),
        }
    }

    /// Create a new file record with version "1.0" and status Active
    pub fn create(&mut self, name: &str) -> Result<&FileRecord, LedgerError> {
        if name.is_empty() {
            return Err(LedgerError::EmptyName);
        }
        if self.files.contains_key(name) {
            return Err(LedgerError::DuplicateName(name.to_string()));
        }

        let record = FileRecord::new(name.to_string(), self.clock.now());
        debug!(file = name, "created file record");
        let entry = self.files.entry(name.to_string()).or_insert(record);
        Ok(&*entry)
    }

    pub fn get(&self, name: &str) -> Result<&FileRecord, LedgerError> {
        self.files
            .get(name)
            .ok_or_else(|| LedgerError::file_not_found(name))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut FileRecord, LedgerError> {
        self.files
            .get_mut(name)
            .ok_or_else(|| LedgerError::file_not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Overwrite the status. Any status may follow any other.
    pub fn set_status(&mut self, name: &str, status: FileStatus) -> Result<(), LedgerError> {
        let record = self.get_mut(name)?;
        record.set_status(status);
        debug!(file = name, status = status.as_str(), "status updated");
        Ok(())
    }

    pub fn append_note(&mut self, name: &str, content: &str) -> Result<&Note, LedgerError> {
        let timestamp = self.clock.now();
        let record = self.get_mut(name)?;
        debug!(file = name, len = content.len(), "note appended");
        Ok(record.push_note(Note {
            timestamp,
            content: content.to_string(),
        }))
    }

    pub fn append_issue(
        &mut self,
        name: &str,
        description: &str,
        severity: Severity,
    ) -> Result<&Issue, LedgerError> {
        let timestamp = self.clock.now();
        let record = self.get_mut(name)?;
        debug!(file = name, severity = severity.as_str(), "issue appended");
        Ok(record.push_issue(Issue {
            timestamp,
            description: description.to_string(),
            severity,
            status: IssueStatus::Open,
        }))
    }

    pub fn append_snapshot(&mut self, name: &str, code: &str) -> Result<&CodeSnapshot, LedgerError> {
        let timestamp = self.clock.now();
        let record = self.get_mut(name)?;
        debug!(file = name, len = code.len(), "snapshot appended");
        Ok(record.push_snapshot(CodeSnapshot {
            timestamp,
            code: code.to_string(),
        }))
    }

    /// Code of the latest snapshot, or an empty string if none was saved
    pub fn current_code(&self, name: &str) -> Result<&str, LedgerError> {
        Ok(self
            .get(name)?
            .current_snapshot()
            .map(|s| s.code.as_str())
            .unwrap_or(""))
    }

    /// File names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.values()
    }

    pub fn summaries(&self) -> Vec<FileSummary> {
        self.files.values().map(FileSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> Timestamp {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn store() -> RecordStore {
        RecordStore::with_clock(SteppingClock::new(start()))
    }

    #[test]
    fn test_create_defaults() {
        let mut store = store();
        let record = store.create("a.py").unwrap();
        assert_eq!(record.version(), "1.0");
        assert_eq!(record.status(), FileStatus::Active);
        assert_eq!(record.created(), start());
        assert!(record.notes().is_empty());
        assert!(record.issues().is_empty());
        assert!(record.snapshots().is_empty());
    }

    #[test]
    fn test_create_empty_name_fails() {
        let mut store = store();
        let err = store.create("").unwrap_err();
        assert!(matches!(err, LedgerError::EmptyName));
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_duplicate_leaves_existing_untouched() {
        let mut store = store();
        store.create("a.py").unwrap();
        store.append_note("a.py", "keep me").unwrap();
        store.set_status("a.py", FileStatus::Deprecated).unwrap();
        let before = store.get("a.py").unwrap().clone();

        let err = store.create("a.py").unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateName(ref n) if n == "a.py"));
        assert_eq!(store.get("a.py").unwrap(), &before);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let store = store();
        assert!(matches!(store.get("nope.py"), Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn test_mutations_on_unknown_file_fail() {
        let mut store = store();
        assert!(store.set_status("x", FileStatus::Active).is_err());
        assert!(store.append_note("x", "n").is_err());
        assert!(store.append_issue("x", "d", Severity::Low).is_err());
        assert!(store.append_snapshot("x", "c").is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_appends_are_append_only() {
        let mut store = store();
        store.create("a.py").unwrap();
        store.append_note("a.py", "first").unwrap();
        let first = store.get("a.py").unwrap().notes()[0].clone();

        store.append_note("a.py", "second").unwrap();
        let notes = store.get("a.py").unwrap().notes();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0], first);
        assert_eq!(notes[1].content, "second");
        assert!(notes[1].timestamp > notes[0].timestamp);

        store.append_issue("a.py", "crash", Severity::High).unwrap();
        store.append_issue("a.py", "crash", Severity::High).unwrap();
        let issues = store.get("a.py").unwrap().issues();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.status == IssueStatus::Open));

        store.append_snapshot("a.py", "print(1)").unwrap();
        assert_eq!(store.get("a.py").unwrap().snapshots().len(), 1);
        assert_eq!(store.get("a.py").unwrap().notes().len(), 2);
    }

    #[test]
    fn test_set_status_is_idempotent() {
        let mut once = store();
        once.create("a.py").unwrap();
        once.set_status("a.py", FileStatus::IssuesFound).unwrap();

        let mut twice = store();
        twice.create("a.py").unwrap();
        twice.set_status("a.py", FileStatus::IssuesFound).unwrap();
        twice.set_status("a.py", FileStatus::IssuesFound).unwrap();

        assert_eq!(once.get("a.py").unwrap(), twice.get("a.py").unwrap());
    }

    #[test]
    fn test_status_any_to_any() {
        let mut store = store();
        store.create("a.py").unwrap();
        for from in FileStatus::ALL {
            for to in FileStatus::ALL {
                store.set_status("a.py", from).unwrap();
                store.set_status("a.py", to).unwrap();
                assert_eq!(store.get("a.py").unwrap().status(), to);
            }
        }
    }

    #[test]
    fn test_created_timestamp_survives_mutation() {
        let mut store = store();
        let created = store.create("a.py").unwrap().created();
        store.append_note("a.py", "n").unwrap();
        store.append_snapshot("a.py", "c").unwrap();
        store.set_status("a.py", FileStatus::Deprecated).unwrap();
        assert_eq!(store.get("a.py").unwrap().created(), created);
    }

    #[test]
    fn test_current_code() {
        let mut store = store();
        store.create("a.py").unwrap();
        assert_eq!(store.current_code("a.py").unwrap(), "");
        store.append_snapshot("a.py", "v1").unwrap();
        store.append_snapshot("a.py", "v2").unwrap();
        assert_eq!(store.current_code("a.py").unwrap(), "v2");
    }

    #[test]
    fn test_names_keep_insertion_order() {
        let mut store = store();
        for name in ["zeta.py", "alpha.py", "mid.py"] {
            store.create(name).unwrap();
        }
        let names: Vec<_> = store.names().collect();
        assert_eq!(names, vec!["zeta.py", "alpha.py", "mid.py"]);
        assert_eq!(store.summaries()[0].name, "zeta.py");
    }
}
