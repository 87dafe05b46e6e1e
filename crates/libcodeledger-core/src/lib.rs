pub mod config;
pub mod error;
pub mod export;
pub mod report;
pub mod store;
pub mod types;

pub use config::{load_config, save_config, LedgerConfig, ReportConfig};
pub use error::LedgerError;
pub use report::{render_report, LayoutEngine, MarkdownEngine, PdfEngine, RenderedReport};
pub use store::RecordStore;
pub use types::record::{FileRecord, FileSummary};
pub use types::status::{FileStatus, IssueStatus, Severity};
