//! Report rendering.
//!
//! A report is built in two steps: [`build_report`] turns a file record into
//! an ordered list of typed [`Block`]s, and a [`LayoutEngine`] lays those
//! blocks out into document bytes. Engines are interchangeable; the block
//! list is the only contract between them and the record model.

pub mod markdown;
pub mod pdf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use tracing::debug;

use crate::config::ReportConfig;
use crate::error::LedgerError;
use crate::types::record::{format_ts, FileRecord};

pub use markdown::MarkdownEngine;
pub use pdf::PdfEngine;

/// Heading weight, largest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeadingLevel {
    Title,
    H1,
    H2,
}

/// Visual treatment of a table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStyle {
    pub font_size: f32,
    /// Grey level (0 = black, 1 = white) filling the first column
    pub first_column_fill: Option<f32>,
    pub grid: bool,
}

/// One typed element of a report, laid out top to bottom
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Block {
    Heading { text: String, level: HeadingLevel },
    Paragraph { text: String, font_size: f32 },
    Table { rows: Vec<Vec<String>>, style: TableStyle },
    /// Monospace text; lines longer than `max_line_length` are broken
    Preformatted { text: String, font_size: f32, max_line_length: usize },
    Spacer { height: f32 },
}

/// An ordered block sequence plus document metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl ReportDocument {
    /// Text of every block in order, one entry per heading, paragraph,
    /// table cell and preformatted block
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Heading { text, .. }
                | Block::Paragraph { text, .. }
                | Block::Preformatted { text, .. } => out.push(text.as_str()),
                Block::Table { rows, .. } => {
                    out.extend(rows.iter().flatten().map(String::as_str));
                }
                Block::Spacer { .. } => {}
            }
        }
        out
    }

    /// Headings in order
    pub fn headings(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Lays out a block sequence into document bytes
pub trait LayoutEngine {
    /// File extension of the produced document, without the dot
    fn extension(&self) -> &'static str;

    fn mime_type(&self) -> &'static str;

    /// Lay out the whole document. Malformed blocks fail the render with
    /// [`LedgerError::RenderFailure`]; no partial output is returned.
    fn render(&self, doc: &ReportDocument) -> Result<Vec<u8>, LedgerError>;
}

pub const NOTES_HEADING: &str = "Testing Notes";
pub const ISSUES_HEADING: &str = "Issues";
pub const CODE_HEADING: &str = "Code History";
pub const DETAILS_HEADING: &str = "File Details";

/// Build the block sequence for a record's report
pub fn build_report(record: &FileRecord, config: &ReportConfig) -> ReportDocument {
    let body = config.body_font_size;
    let entry_gap = Block::Spacer { height: config.entry_spacing };
    let mut blocks = vec![
        Block::Heading {
            text: format!("File: {}", record.name()),
            level: HeadingLevel::Title,
        },
        Block::Heading {
            text: format!("Version: {}", record.version()),
            level: HeadingLevel::H1,
        },
        Block::Heading {
            text: DETAILS_HEADING.to_string(),
            level: HeadingLevel::H2,
        },
        Block::Table {
            rows: vec![
                vec!["Created".to_string(), format_ts(&record.created())],
                vec!["Status".to_string(), record.status().to_string()],
            ],
            style: TableStyle {
                font_size: body,
                first_column_fill: Some(LIGHT_GREY),
                grid: true,
            },
        },
        Block::Spacer { height: config.section_spacing },
    ];

    if !record.notes().is_empty() {
        blocks.push(section_heading(NOTES_HEADING));
        for note in record.notes() {
            blocks.push(paragraph(format!("[{}]", format_ts(&note.timestamp)), body));
            blocks.push(paragraph(note.content.clone(), body));
            blocks.push(entry_gap.clone());
        }
    }

    if !record.issues().is_empty() {
        blocks.push(section_heading(ISSUES_HEADING));
        for issue in record.issues() {
            blocks.push(paragraph(format!("Severity: {}", issue.severity), body));
            blocks.push(paragraph(format!("Reported: {}", format_ts(&issue.timestamp)), body));
            blocks.push(paragraph(format!("Description: {}", issue.description), body));
            blocks.push(entry_gap.clone());
        }
    }

    if !record.snapshots().is_empty() {
        blocks.push(section_heading(CODE_HEADING));
        for snapshot in record.snapshots() {
            blocks.push(paragraph(format!("[{}]", format_ts(&snapshot.timestamp)), body));
            blocks.push(Block::Preformatted {
                text: snapshot.code.clone(),
                font_size: config.code_font_size,
                max_line_length: config.code_wrap_width,
            });
            blocks.push(entry_gap.clone());
        }
    }

    ReportDocument {
        title: format!("{} v{}", record.name(), record.version()),
        blocks,
    }
}

/// CSS "lightgrey"
const LIGHT_GREY: f32 = 0.827;

fn section_heading(text: &str) -> Block {
    Block::Heading {
        text: text.to_string(),
        level: HeadingLevel::H2,
    }
}

fn paragraph(text: String, font_size: f32) -> Block {
    Block::Paragraph { text, font_size }
}

/// `{fileName}_v{versionLabel}_report.{ext}`
///
/// Path separators in the record name become `_` so the result is always a
/// single path component.
pub fn report_file_name(record: &FileRecord, extension: &str) -> String {
    let stem: String = record
        .name()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    format!("{}_v{}_report.{}", stem, record.version(), extension)
}

/// Split preformatted text into display lines, breaking any line longer
/// than `max_line_length` characters. Tabs expand to four spaces.
pub fn wrap_preformatted(text: &str, max_line_length: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let expanded = raw.replace('\t', "    ");
        let chars: Vec<char> = expanded.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        for chunk in chars.chunks(max_line_length.max(1)) {
            lines.push(chunk.iter().collect());
        }
    }
    lines
}

/// A rendered report ready for delivery
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl RenderedReport {
    /// `data:` URI carrying the document as base64
    pub fn data_link(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// Build and lay out a record's report with the given engine
pub fn render_report(
    record: &FileRecord,
    engine: &dyn LayoutEngine,
    config: &ReportConfig,
) -> Result<RenderedReport, LedgerError> {
    let doc = build_report(record, config);
    let bytes = engine.render(&doc)?;
    debug!(
        file = record.name(),
        blocks = doc.blocks.len(),
        bytes = bytes.len(),
        format = engine.extension(),
        "report rendered"
    );
    Ok(RenderedReport {
        file_name: report_file_name(record, engine.extension()),
        mime_type: engine.mime_type(),
        bytes,
    })
}

/// Checks shared by all engines before layout
pub(crate) fn validate(doc: &ReportDocument) -> Result<(), LedgerError> {
    for (index, block) in doc.blocks.iter().enumerate() {
        match block {
            Block::Paragraph { font_size, .. } | Block::Preformatted { font_size, .. }
                if !(font_size.is_finite() && *font_size > 0.0) =>
            {
                return Err(malformed(index, "font size must be positive"));
            }
            Block::Preformatted { max_line_length: 0, .. } => {
                return Err(malformed(index, "line length must be positive"));
            }
            Block::Spacer { height } if !(height.is_finite() && *height >= 0.0) => {
                return Err(malformed(index, "spacer height must be non-negative"));
            }
            Block::Table { rows, style } => {
                if !(style.font_size.is_finite() && style.font_size > 0.0) {
                    return Err(malformed(index, "font size must be positive"));
                }
                let width = rows.first().map(Vec::len).unwrap_or(0);
                if width == 0 {
                    return Err(malformed(index, "table has no cells"));
                }
                if rows.iter().any(|r| r.len() != width) {
                    return Err(malformed(index, "table rows differ in length"));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn malformed(index: usize, reason: &str) -> LedgerError {
    LedgerError::RenderFailure(format!("block {}: {}", index, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RecordStore, SteppingClock};
    use crate::types::status::{FileStatus, Severity};
    use chrono::NaiveDate;

    fn store() -> RecordStore {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        RecordStore::with_clock(SteppingClock::new(start))
    }

    #[test]
    fn test_empty_record_has_only_title_and_details() {
        let mut store = store();
        store.create("a.py").unwrap();
        let doc = build_report(store.get("a.py").unwrap(), &ReportConfig::default());
        assert_eq!(doc.headings(), vec!["File: a.py", "Version: 1.0", "File Details"]);
        assert_eq!(
            doc.texts(),
            vec!["File: a.py", "Version: 1.0", "File Details", "Created", "2024-03-01 09:00:00", "Status", "Active"]
        );
    }

    #[test]
    fn test_sections_present_iff_non_empty() {
        let mut store = store();
        store.create("a.py").unwrap();
        store.append_issue("a.py", "boom", Severity::Low).unwrap();
        let doc = build_report(store.get("a.py").unwrap(), &ReportConfig::default());
        let headings = doc.headings();
        assert!(!headings.contains(&NOTES_HEADING));
        assert!(headings.contains(&ISSUES_HEADING));
        assert!(!headings.contains(&CODE_HEADING));

        store.append_note("a.py", "n").unwrap();
        store.append_snapshot("a.py", "c").unwrap();
        let doc = build_report(store.get("a.py").unwrap(), &ReportConfig::default());
        assert_eq!(
            doc.headings()[3..].to_vec(),
            vec![NOTES_HEADING, ISSUES_HEADING, CODE_HEADING]
        );
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let mut store = store();
        store.create("a.py").unwrap();
        for content in ["one", "two", "three"] {
            store.append_note("a.py", content).unwrap();
        }
        let doc = build_report(store.get("a.py").unwrap(), &ReportConfig::default());
        let texts = doc.texts();
        let pos = |s: &str| texts.iter().position(|t| *t == s).unwrap();
        assert!(pos("one") < pos("two"));
        assert!(pos("two") < pos("three"));
        assert_eq!(texts[pos("one") - 1], "[2024-03-01 09:00:01]");
    }

    #[test]
    fn test_issue_entry_lines() {
        let mut store = store();
        store.create("a.py").unwrap();
        store.append_issue("a.py", "crash on start", Severity::High).unwrap();
        let doc = build_report(store.get("a.py").unwrap(), &ReportConfig::default());
        let texts = doc.texts();
        let start = texts.iter().position(|t| *t == ISSUES_HEADING).unwrap();
        assert_eq!(
            texts[start + 1..start + 4].to_vec(),
            vec!["Severity: High", "Reported: 2024-03-01 09:00:01", "Description: crash on start"]
        );
    }

    #[test]
    fn test_code_block_uses_config() {
        let mut store = store();
        store.create("a.py").unwrap();
        store.append_snapshot("a.py", "print('hi')").unwrap();
        let doc = build_report(store.get("a.py").unwrap(), &ReportConfig::default());
        let code = doc
            .blocks
            .iter()
            .find(|b| matches!(b, Block::Preformatted { .. }))
            .unwrap();
        assert_eq!(
            code,
            &Block::Preformatted {
                text: "print('hi')".to_string(),
                font_size: 8.0,
                max_line_length: 65,
            }
        );
    }

    #[test]
    fn test_details_table_shows_status_label() {
        let mut store = store();
        store.create("a.py").unwrap();
        store.set_status("a.py", FileStatus::IssuesFound).unwrap();
        let doc = build_report(store.get("a.py").unwrap(), &ReportConfig::default());
        assert!(doc.texts().contains(&"Issues Found"));
    }

    #[test]
    fn test_report_file_name() {
        let mut store = store();
        store.create("x.py").unwrap();
        assert_eq!(
            report_file_name(store.get("x.py").unwrap(), "pdf"),
            "x.py_v1.0_report.pdf"
        );
    }

    #[test]
    fn test_report_file_name_is_one_path_component() {
        let mut store = store();
        store.create("../up.py").unwrap();
        store.create("sub\\dir/a.py").unwrap();
        assert_eq!(
            report_file_name(store.get("../up.py").unwrap(), "pdf"),
            ".._up.py_v1.0_report.pdf"
        );
        assert_eq!(
            report_file_name(store.get("sub\\dir/a.py").unwrap(), "md"),
            "sub_dir_a.py_v1.0_report.md"
        );
    }

    #[test]
    fn test_wrap_preformatted() {
        let long = "a".repeat(150);
        let lines = wrap_preformatted(&long, 65);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 65);
        assert_eq!(lines[2].len(), 20);

        let lines = wrap_preformatted("def f():\n\treturn 1\n\nf()", 65);
        assert_eq!(lines, vec!["def f():", "    return 1", "", "f()"]);
    }

    #[test]
    fn test_validate_rejects_ragged_table() {
        let doc = ReportDocument {
            title: "t".into(),
            blocks: vec![Block::Table {
                rows: vec![vec!["a".into(), "b".into()], vec!["c".into()]],
                style: TableStyle { font_size: 10.0, first_column_fill: None, grid: true },
            }],
        };
        let err = validate(&doc).unwrap_err();
        assert!(matches!(err, LedgerError::RenderFailure(_)));
    }

    #[test]
    fn test_validate_rejects_zero_wrap() {
        let doc = ReportDocument {
            title: "t".into(),
            blocks: vec![Block::Preformatted { text: "x".into(), font_size: 8.0, max_line_length: 0 }],
        };
        assert!(validate(&doc).is_err());
    }

    #[test]
    fn test_data_link() {
        let report = RenderedReport {
            file_name: "a.py_v1.0_report.md".into(),
            mime_type: "text/markdown",
            bytes: b"hi".to_vec(),
        };
        assert_eq!(report.data_link(), "data:text/markdown;base64,aGk=");
    }
}
