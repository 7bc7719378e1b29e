//! Small paginated PDF writer for text documents.
//!
//! Only the base-14 Times fonts are used, so nothing is embedded. Text is
//! encoded as WinAnsi; characters outside that set print as '?'. Content
//! streams are left uncompressed.

use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::LessonError;
use crate::listfmt::LINE_BREAK;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    TimesRoman,
    TimesBold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::TimesRoman => "F1",
            Font::TimesBold => "F2",
        }
    }

    fn base_name(self) -> &'static str {
        match self {
            Font::TimesRoman => "Times-Roman",
            Font::TimesBold => "Times-Bold",
        }
    }

    /// Advance width in 1/1000 em.
    fn char_width(self, c: char) -> u16 {
        let table = match self {
            Font::TimesRoman => &TIMES_ROMAN_WIDTHS,
            Font::TimesBold => &TIMES_BOLD_WIDTHS,
        };
        match c {
            ' '..='~' => table[c as usize - 32],
            '\u{2022}' => 350,
            '\u{2013}' => 500,
            '\u{2014}' | '\u{2026}' => 1000,
            '\u{2018}' | '\u{2019}' => 333,
            '\u{201C}' | '\u{201D}' => 444,
            _ => 500,
        }
    }

    fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.char_width(c))).sum();
        units as f32 * size / 1000.0
    }
}

// AFM advance widths for ' '..='~'.
const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 333, 333, 333, 500, 564, 250, 333, 250, 278, // ' '..'/'
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444, // '0'..'?'
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, // '@'..'O'
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500, // 'P'..'_'
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, // '`'..'o'
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541, // 'p'..'~'
];

const TIMES_BOLD_WIDTHS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 333, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: Font,
    pub size: f32,
    pub leading: f32,
    pub align: Align,
    pub space_before: f32,
    pub space_after: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Word-wrapped text; [`LINE_BREAK`] forces a new line.
    Paragraph { text: String, style: TextStyle },
    Spacer(f32),
}

/// Page size and margins in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl PageSetup {
    pub const fn letter(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            margin_left: left,
            margin_right: right,
            margin_top: top,
            margin_bottom: bottom,
        }
    }

    fn frame_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PlacedLine {
    font: Font,
    size: f32,
    x: f32,
    y: f32,
    text: String,
}

#[derive(Debug, Clone)]
pub struct Document {
    title: String,
    setup: PageSetup,
    blocks: Vec<Block>,
}

impl Document {
    pub fn new(title: impl Into<String>, setup: PageSetup) -> Self {
        Self {
            title: title.into(),
            setup,
            blocks: Vec::new(),
        }
    }

    pub fn paragraph(&mut self, text: impl Into<String>, style: TextStyle) {
        self.blocks.push(Block::Paragraph {
            text: text.into(),
            style,
        });
    }

    pub fn spacer(&mut self, height: f32) {
        self.blocks.push(Block::Spacer(height));
    }

    #[cfg(test)]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Writes the document, replacing any existing file. Returns the page count.
    pub fn write_to(&self, path: &Path, created: NaiveDateTime) -> Result<usize, LessonError> {
        let pages = self.layout();
        let bytes = self.encode(&pages, created);
        std::fs::write(path, bytes)?;
        Ok(pages.len())
    }

    #[cfg(test)]
    pub fn to_bytes(&self, created: NaiveDateTime) -> Vec<u8> {
        self.encode(&self.layout(), created)
    }

    fn layout(&self) -> Vec<Vec<PlacedLine>> {
        let setup = &self.setup;
        let top = setup.height - setup.margin_top;
        let bottom = setup.margin_bottom;
        let frame_width = setup.frame_width();

        let mut pages = Vec::new();
        let mut current: Vec<PlacedLine> = Vec::new();
        let mut y = top;

        for block in &self.blocks {
            match block {
                // A spacer that does not fit is dropped; it never opens a page.
                Block::Spacer(h) => {
                    if y - h >= bottom {
                        y -= h;
                    }
                }
                Block::Paragraph { text, style } => {
                    if y < top {
                        y -= style.space_before;
                    }
                    for line in wrap(text, style.font, style.size, frame_width) {
                        if y - style.leading < bottom {
                            pages.push(std::mem::take(&mut current));
                            y = top;
                        }
                        y -= style.leading;
                        let x = match style.align {
                            Align::Left => setup.margin_left,
                            Align::Center => {
                                let w = style.font.text_width(&line, style.size);
                                setup.margin_left + (frame_width - w).max(0.0) / 2.0
                            }
                        };
                        current.push(PlacedLine {
                            font: style.font,
                            size: style.size,
                            x,
                            y,
                            text: line,
                        });
                    }
                    y -= style.space_after;
                }
            }
        }
        if !current.is_empty() || pages.is_empty() {
            pages.push(current);
        }
        pages
    }

    fn encode(&self, pages: &[Vec<PlacedLine>], created: NaiveDateTime) -> Vec<u8> {
        const FIRST_PAGE_OBJ: usize = 6;

        let kids: Vec<String> = (0..pages.len())
            .map(|i| format!("{} 0 R", FIRST_PAGE_OBJ + 2 * i))
            .collect();

        let mut objects: Vec<Vec<u8>> = vec![
            b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                pages.len()
            )
            .into_bytes(),
            font_object(Font::TimesRoman),
            font_object(Font::TimesBold),
            format!(
                "<< /Title {} /Producer (lessond {}) /CreationDate (D:{}) >>",
                pdf_string(&self.title),
                env!("CARGO_PKG_VERSION"),
                created.format("%Y%m%d%H%M%S")
            )
            .into_bytes(),
        ];

        for (i, page) in pages.iter().enumerate() {
            let content_obj = FIRST_PAGE_OBJ + 2 * i + 1;
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                    self.setup.width, self.setup.height, content_obj
                )
                .into_bytes(),
            );

            let mut stream = String::new();
            for line in page {
                let _ = writeln!(
                    stream,
                    "BT /{} {} Tf {:.2} {:.2} Td {} Tj ET",
                    line.font.resource(),
                    line.size,
                    line.x,
                    line.y,
                    pdf_string(&line.text)
                );
            }
            let mut content = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
            content.extend_from_slice(stream.as_bytes());
            content.extend_from_slice(b"endstream");
            objects.push(content);
        }

        let mut out: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_at = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for off in offsets {
            let _ = write!(xref, "{off:010} 00000 n \n");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        );
        out.extend_from_slice(xref.as_bytes());
        out
    }
}

fn font_object(font: Font) -> Vec<u8> {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        font.base_name()
    )
    .into_bytes()
}

/// Greedy word wrap. Segments split on [`LINE_BREAK`] always start a new
/// line; a word wider than the frame is broken between characters.
fn wrap(text: &str, font: Font, size: f32, width: f32) -> Vec<String> {
    let space = font.text_width(" ", size);
    let mut out = Vec::new();

    for segment in text.split(LINE_BREAK) {
        let mut line = String::new();
        let mut line_width = 0.0;
        for word in segment.split_whitespace() {
            let word_width = font.text_width(word, size);
            if !line.is_empty() && line_width + space + word_width > width {
                out.push(std::mem::take(&mut line));
                line_width = 0.0;
            }
            if line.is_empty() && word_width > width {
                for c in word.chars() {
                    let cw = font.text_width(c.encode_utf8(&mut [0; 4]), size);
                    if !line.is_empty() && line_width + cw > width {
                        out.push(std::mem::take(&mut line));
                        line_width = 0.0;
                    }
                    line.push(c);
                    line_width += cw;
                }
                continue;
            }
            if !line.is_empty() {
                line.push(' ');
                line_width += space;
            }
            line.push_str(word);
            line_width += word_width;
        }
        out.push(line);
    }
    out
}

fn win_ansi(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '\t' => b' ',
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => b'?',
    }
}

/// Literal string operand, escaped and WinAnsi encoded.
fn pdf_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('(');
    for b in text.chars().map(win_ansi) {
        match b {
            b'(' | b')' | b'\\' => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7E => out.push(b as char),
            _ => {
                let _ = write!(out, "\\{b:03o}");
            }
        }
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn created() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 2)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .expect("valid timestamp")
    }

    fn body() -> TextStyle {
        TextStyle {
            font: Font::TimesRoman,
            size: 11.0,
            leading: 14.0,
            align: Align::Left,
            space_before: 0.0,
            space_after: 0.0,
        }
    }

    #[test]
    fn strings_are_escaped_and_win_ansi_encoded() {
        assert_eq!(pdf_string("a (b) \\ c"), "(a \\(b\\) \\\\ c)");
        assert_eq!(pdf_string("\u{2022} x"), "(\\225 x)");
        assert_eq!(pdf_string("Week 1 \u{2013} Day 2"), "(Week 1 \\226 Day 2)");
        assert_eq!(pdf_string("\u{4E2D}"), "(?)");
    }

    #[test]
    fn wrap_honours_breaks_and_width() {
        let lines = wrap("one<br/>two three", Font::TimesRoman, 10.0, 1000.0);
        assert_eq!(lines, vec!["one".to_string(), "two three".to_string()]);

        let narrow = wrap("alpha beta gamma", Font::TimesRoman, 10.0, 40.0);
        assert_eq!(narrow, vec!["alpha", "beta", "gamma"]);

        let long = wrap("xxxxxxxxxx", Font::TimesRoman, 10.0, 20.0);
        assert!(long.len() > 1);
        assert_eq!(long.concat(), "xxxxxxxxxx");
    }

    #[test]
    fn long_documents_paginate() {
        let mut doc = Document::new("t", PageSetup::letter(60.0, 60.0, 60.0, 40.0));
        for i in 0..120 {
            doc.paragraph(format!("line {i}"), body());
        }
        let pages = doc.layout();
        assert!(pages.len() >= 3);
        assert_eq!(pages.iter().map(|p| p.len()).sum::<usize>(), 120);
        for page in &pages {
            for line in page {
                assert!(line.y >= 40.0 && line.y <= 732.0);
            }
        }
    }

    #[test]
    fn trailing_spacer_on_full_page_adds_no_page() {
        let setup = PageSetup::letter(60.0, 60.0, 60.0, 40.0);
        let per_page = ((setup.height - setup.margin_top - setup.margin_bottom) / 14.0) as usize;

        let mut doc = Document::new("t", setup);
        for i in 0..per_page {
            doc.paragraph(format!("line {i}"), body());
        }
        doc.spacer(8.0);
        let pages = doc.layout();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].len(), per_page);

        doc.spacer(8.0);
        doc.paragraph("next", body());
        let pages = doc.layout();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].len(), 1);
        assert!(pages.iter().all(|p| !p.is_empty()));
    }

    #[test]
    fn empty_document_still_has_one_page() {
        let doc = Document::new("t", PageSetup::letter(60.0, 60.0, 60.0, 40.0));
        assert_eq!(doc.layout().len(), 1);
    }

    #[test]
    fn xref_points_at_objects() {
        let mut doc = Document::new("Plan", PageSetup::letter(60.0, 60.0, 60.0, 40.0));
        doc.paragraph("Hello", body());
        let bytes = doc.to_bytes(created());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.contains("(Hello) Tj"));
        assert!(text.ends_with("%%EOF\n"));

        // The binary comment line makes `text` offsets differ from byte offsets.
        let marker = b"startxref\n";
        let start = bytes
            .windows(marker.len())
            .rposition(|w| w == marker)
            .expect("startxref")
            + marker.len();
        let xref_at: usize = std::str::from_utf8(&bytes[start..])
            .ok()
            .and_then(|s| s.lines().next())
            .and_then(|l| l.parse().ok())
            .expect("xref offset");
        assert!(bytes[xref_at..].starts_with(b"xref"));

        let xref = std::str::from_utf8(&bytes[xref_at..]).expect("ascii xref");
        let first = xref.lines().nth(3).expect("object 1 entry");
        let off: usize = first[..10].parse().expect("offset");
        assert!(bytes[off..].starts_with(b"1 0 obj"));
    }
}
