//! Paginated PDF layout over the standard Type 1 fonts.
//!
//! Output is PDF 1.4 with uncompressed content streams and no creation date
//! or document ID, so identical documents produce identical bytes.

use super::{validate, wrap_preformatted, Block, HeadingLevel, LayoutEngine, ReportDocument, TableStyle};
use crate::error::LedgerError;

/// US Letter, in points
pub const LETTER: (f32, f32) = (612.0, 792.0);

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";
const FONT_MONO: &str = "F3";

const CELL_PAD_X: f32 = 6.0;
const CELL_PAD_TOP: f32 = 3.0;
const CELL_PAD_BOTTOM: f32 = 12.0;
const CODE_INDENT: f32 = 10.0;

/// Lays out reports as PDF on US Letter pages
#[derive(Debug, Clone)]
pub struct PdfEngine {
    page_width: f32,
    page_height: f32,
    margin: f32,
}

impl Default for PdfEngine {
    fn default() -> Self {
        Self::new(36.0)
    }
}

impl PdfEngine {
    pub fn new(margin: f32) -> Self {
        Self {
            page_width: LETTER.0,
            page_height: LETTER.1,
            margin,
        }
    }

    fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }
}

impl LayoutEngine for PdfEngine {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn mime_type(&self) -> &'static str {
        "application/pdf"
    }

    fn render(&self, doc: &ReportDocument) -> Result<Vec<u8>, LedgerError> {
        validate(doc)?;
        if self.content_width() <= 0.0 || self.page_height - 2.0 * self.margin <= 0.0 {
            return Err(LedgerError::RenderFailure(format!(
                "margin {} leaves no room on the page",
                self.margin
            )));
        }
        check_encodable(doc)?;

        let mut layout = PageLayout::new(self);
        for block in &doc.blocks {
            layout.place(block);
        }
        Ok(write_pdf(&doc.title, self, &layout.finish()))
    }
}

/// Font metrics and spacing for a heading level
struct TextStyle {
    font: &'static str,
    size: f32,
    leading: f32,
    space_before: f32,
    space_after: f32,
    centered: bool,
}

fn heading_style(level: HeadingLevel) -> TextStyle {
    match level {
        HeadingLevel::Title => TextStyle {
            font: FONT_BOLD,
            size: 18.0,
            leading: 22.0,
            space_before: 0.0,
            space_after: 6.0,
            centered: true,
        },
        HeadingLevel::H1 => TextStyle {
            font: FONT_BOLD,
            size: 16.0,
            leading: 20.0,
            space_before: 6.0,
            space_after: 6.0,
            centered: false,
        },
        HeadingLevel::H2 => TextStyle {
            font: FONT_BOLD,
            size: 14.0,
            leading: 18.0,
            space_before: 12.0,
            space_after: 6.0,
            centered: false,
        },
    }
}

fn body_style(size: f32) -> TextStyle {
    TextStyle {
        font: FONT_REGULAR,
        size,
        leading: size * 1.2,
        space_before: 0.0,
        space_after: 0.0,
        centered: false,
    }
}

/// Cursor over a growing list of page content streams
struct PageLayout<'a> {
    engine: &'a PdfEngine,
    pages: Vec<String>,
    y: f32,
}

impl<'a> PageLayout<'a> {
    fn new(engine: &'a PdfEngine) -> Self {
        Self {
            engine,
            pages: vec![String::new()],
            y: engine.page_height - engine.margin,
        }
    }

    fn top(&self) -> f32 {
        self.engine.page_height - self.engine.margin
    }

    fn bottom(&self) -> f32 {
        self.engine.margin
    }

    fn current(&mut self) -> &mut String {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(String::new());
        self.y = self.top();
    }

    /// Break the page unless `height` still fits above the bottom margin.
    /// Content taller than a whole page is placed at the top of a fresh one.
    fn ensure(&mut self, height: f32) {
        if self.y - height < self.bottom() && self.y < self.top() {
            self.new_page();
        }
    }

    fn place(&mut self, block: &Block) {
        match block {
            Block::Heading { text, level } => self.text(text, &heading_style(*level)),
            Block::Paragraph { text, font_size } => self.text(text, &body_style(*font_size)),
            Block::Table { rows, style } => self.table(rows, style),
            Block::Preformatted {
                text,
                font_size,
                max_line_length,
            } => self.preformatted(text, *font_size, *max_line_length),
            Block::Spacer { height } => {
                // a spacer that would cross the bottom margin ends the page
                if self.y - *height < self.bottom() {
                    self.new_page();
                } else {
                    self.y -= *height;
                }
            }
        }
    }

    fn text(&mut self, text: &str, style: &TextStyle) {
        if self.y < self.top() {
            self.y -= style.space_before;
        }
        let width = self.engine.content_width();
        for line in wrap_words(text, style.font, style.size, width) {
            self.ensure(style.leading);
            self.y -= style.leading;
            let x = if style.centered {
                self.engine.margin + (width - text_width(&line, style.font, style.size)) / 2.0
            } else {
                self.engine.margin
            };
            let baseline = self.y + (style.leading - style.size);
            show_text(self.current(), style.font, style.size, x, baseline, &line);
        }
        self.y -= style.space_after;
    }

    fn preformatted(&mut self, text: &str, size: f32, max_line_length: usize) {
        let leading = size;
        let x = self.engine.margin + CODE_INDENT;
        for line in wrap_preformatted(text, max_line_length) {
            self.ensure(leading);
            self.y -= leading;
            let baseline = self.y + leading * 0.2;
            if !line.is_empty() {
                show_text(self.current(), FONT_MONO, size, x, baseline, &line);
            }
        }
    }

    fn table(&mut self, rows: &[Vec<String>], style: &TableStyle) {
        let columns = rows[0].len();
        let available = self.engine.content_width();
        let widths = column_widths(rows, columns, style.font_size, available);
        let total: f32 = widths.iter().sum();
        let left = self.engine.margin + (available - total).max(0.0) / 2.0;
        let leading = style.font_size * 1.2;

        for row in rows {
            let cells: Vec<Vec<String>> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| wrap_words(cell, FONT_REGULAR, style.font_size, w - 2.0 * CELL_PAD_X))
                .collect();
            let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
            let height = CELL_PAD_TOP + lines as f32 * leading + CELL_PAD_BOTTOM;

            self.ensure(height);
            let row_top = self.y;
            let row_bottom = row_top - height;
            let mut x = left;
            for (column, (cell, width)) in cells.iter().zip(&widths).enumerate() {
                let out = self.current();
                if column == 0 {
                    if let Some(grey) = style.first_column_fill {
                        out.push_str(&format!(
                            "{} g {} {} {} {} re f 0 g\n",
                            num(grey),
                            num(x),
                            num(row_bottom),
                            num(*width),
                            num(height)
                        ));
                    }
                }
                let mut baseline = row_top - CELL_PAD_TOP - style.font_size;
                for line in cell {
                    show_text(out, FONT_REGULAR, style.font_size, x + CELL_PAD_X, baseline, line);
                    baseline -= leading;
                }
                if style.grid {
                    out.push_str(&format!(
                        "1 w 0 G {} {} {} {} re S\n",
                        num(x),
                        num(row_bottom),
                        num(*width),
                        num(height)
                    ));
                }
                x += width;
            }
            self.y = row_bottom;
        }
    }

    fn finish(self) -> Vec<String> {
        self.pages
    }
}

/// Natural column widths, shrinking the widest column when the table would
/// overflow the available width
fn column_widths(rows: &[Vec<String>], columns: usize, size: f32, available: f32) -> Vec<f32> {
    let mut widths: Vec<f32> = (0..columns)
        .map(|c| {
            rows.iter()
                .map(|r| text_width(&r[c], FONT_REGULAR, size))
                .fold(0.0, f32::max)
                + 2.0 * CELL_PAD_X
        })
        .collect();
    let total: f32 = widths.iter().sum();
    if total > available {
        let (widest, _) = widths
            .iter()
            .enumerate()
            .fold((0, 0.0), |acc, (i, w)| if *w > acc.1 { (i, *w) } else { acc });
        let others = total - widths[widest];
        widths[widest] = (available - others).max(available / columns as f32);
    }
    widths
}

fn show_text(out: &mut String, font: &str, size: f32, x: f32, y: f32, text: &str) {
    out.push_str(&format!(
        "BT /{} {} Tf {} {} Td ({}) Tj ET\n",
        font,
        num(size),
        num(x),
        num(y),
        escape(text)
    ));
}

/// Greedy word wrap by measured width; words wider than a line are split
fn wrap_words(text: &str, font: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };
            if text_width(&candidate, font, size) <= max_width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            for ch in word.chars() {
                line.push(ch);
                if text_width(&line, font, size) > max_width && line.chars().count() > 1 {
                    line.pop();
                    lines.push(std::mem::replace(&mut line, ch.to_string()));
                }
            }
        }
        lines.push(line);
    }
    lines
}

/// Width of `text` in points
fn text_width(text: &str, font: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| glyph_width(c, font)).sum();
    units as f32 * size / 1000.0
}

fn glyph_width(c: char, font: &str) -> u32 {
    if font == FONT_MONO {
        return 600;
    }
    let table = if font == FONT_BOLD { &HELVETICA_BOLD } else { &HELVETICA };
    match c as u32 {
        code @ 32..=126 => u32::from(table[(code - 32) as usize]),
        _ => 556,
    }
}

/// Reject text the base-14 fonts cannot show. WinAnsi covers Latin-1 only.
fn check_encodable(doc: &ReportDocument) -> Result<(), LedgerError> {
    for text in std::iter::once(doc.title.as_str()).chain(doc.texts()) {
        if let Some(c) = text.chars().find(|c| u32::from(*c) > 0xff) {
            return Err(LedgerError::RenderFailure(format!(
                "cannot encode '{}' (U+{:04X}) in a PDF report",
                c,
                u32::from(c)
            )));
        }
    }
    Ok(())
}

/// Escape a string for a PDF literal. Balanced parentheses are kept as-is;
/// unbalanced ones are escaped. Control characters become '?'.
fn escape(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut unbalanced = vec![false; chars.len()];
    let mut open = Vec::new();
    for (i, c) in chars.iter().enumerate() {
        match c {
            '(' => open.push(i),
            ')' => {
                if open.pop().is_none() {
                    unbalanced[i] = true;
                }
            }
            _ => {}
        }
    }
    for i in open {
        unbalanced[i] = true;
    }

    let mut out = String::with_capacity(text.len());
    for (c, lone) in chars.into_iter().zip(unbalanced) {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' | ')' if lone => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\u{a0}'..='\u{ff}' => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

/// Fixed two-decimal number formatting with trailing zeros dropped
fn num(v: f32) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Append an indirect object numbered after the ones already written
fn push_object(out: &mut String, offsets: &mut Vec<usize>, body: String) {
    offsets.push(out.len());
    out.push_str(&format!("{} 0 obj\n{}\nendobj\n", offsets.len(), body));
}

fn write_pdf(title: &str, engine: &PdfEngine, pages: &[String]) -> Vec<u8> {
    let mut out = String::from("%PDF-1.4\n");
    let mut offsets: Vec<usize> = Vec::new();
    let page_count = pages.len();
    let first_page_obj = 7;

    push_object(&mut out, &mut offsets, "<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", first_page_obj + 2 * i))
        .collect();
    push_object(
        &mut out,
        &mut offsets,
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), page_count),
    );
    for base in ["Helvetica", "Helvetica-Bold", "Courier"] {
        push_object(
            &mut out,
            &mut offsets,
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                base
            ),
        );
    }
    push_object(
        &mut out,
        &mut offsets,
        format!("<< /Title ({}) /Producer (codeledger) >>", escape(title)),
    );

    for (i, content) in pages.iter().enumerate() {
        let contents_obj = first_page_obj + 2 * i + 1;
        push_object(
            &mut out,
            &mut offsets,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /{} 3 0 R /{} 4 0 R /{} 5 0 R >> >> /Contents {} 0 R >>",
                num(engine.page_width),
                num(engine.page_height),
                FONT_REGULAR,
                FONT_BOLD,
                FONT_MONO,
                contents_obj
            ),
        );
        push_object(
            &mut out,
            &mut offsets,
            format!("<< /Length {} >>\nstream\n{}endstream", content.len(), content),
        );
    }

    let xref_at = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1));
    for offset in &offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R /Info 6 0 R >>\nstartxref\n{}\n%%EOF\n",
        offsets.len() + 1,
        xref_at
    ));
    out.into_bytes()
}

/// Helvetica advance widths for ' '..='~', in 1/1000 em
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for ' '..='~', in 1/1000 em
#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];
