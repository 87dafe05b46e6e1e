use super::{validate, wrap_preformatted, Block, HeadingLevel, LayoutEngine, ReportDocument};
use crate::error::LedgerError;

/// Renders reports as Markdown. Used for the in-session history view.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownEngine;

impl MarkdownEngine {
    /// Render straight to a string
    pub fn render_string(&self, doc: &ReportDocument) -> Result<String, LedgerError> {
        validate(doc)?;

        let mut md = String::new();
        for block in &doc.blocks {
            match block {
                Block::Heading { text, level } => {
                    let hashes = match level {
                        HeadingLevel::Title => "#",
                        HeadingLevel::H1 => "##",
                        HeadingLevel::H2 => "###",
                    };
                    md.push_str(&format!("{} {}\n\n", hashes, text));
                }
                Block::Paragraph { text, .. } => {
                    md.push_str(&format!("{}\n\n", text));
                }
                Block::Table { rows, .. } => {
                    let columns = rows[0].len();
                    md.push_str(&format!("|{}\n", " |".repeat(columns)));
                    md.push_str(&format!("|{}\n", "---|".repeat(columns)));
                    for row in rows {
                        let cells: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
                        md.push_str(&format!("| {} |\n", cells.join(" | ")));
                    }
                    md.push('\n');
                }
                Block::Preformatted { text, max_line_length, .. } => {
                    let fence = fence_for(text);
                    md.push_str(&fence);
                    md.push('\n');
                    for line in wrap_preformatted(text, *max_line_length) {
                        md.push_str(&line);
                        md.push('\n');
                    }
                    md.push_str(&fence);
                    md.push_str("\n\n");
                }
                Block::Spacer { .. } => {}
            }
        }

        Ok(md)
    }
}

/// Backtick fence longer than any backtick run in `text`, at least three
fn fence_for(text: &str) -> String {
    let longest = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

impl LayoutEngine for MarkdownEngine {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn mime_type(&self) -> &'static str {
        "text/markdown"
    }

    fn render(&self, doc: &ReportDocument) -> Result<Vec<u8>, LedgerError> {
        Ok(self.render_string(doc)?.into_bytes())
    }
}
