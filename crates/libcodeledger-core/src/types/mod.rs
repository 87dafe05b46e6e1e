pub mod record;
pub mod status;

pub use record::{format_ts, CodeSnapshot, FileRecord, FileSummary, Issue, Note, Timestamp};
pub use status::{FileStatus, IssueStatus, Severity};
