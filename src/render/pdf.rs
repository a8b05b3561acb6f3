//! Lay out brochure blocks on US-Letter pages with printpdf.
//!
//! The page furniture mirrors the printed brochure: a bold dark-blue title,
//! the source URL in italic blue underneath, the body in 12pt Helvetica with
//! 18pt leading, and an optional grey footer on every page. The writer works
//! in PostScript points (1/72 inch) from the bottom-left corner and starts a
//! new page whenever the cursor falls below the bottom margin.
//!
//! printpdf's built-in fonts only cover WinAnsi (Latin) text. For Hindi or any
//! other script, pass a TrueType font through [`PdfOptions::font`]; it is then
//! used for every text run.

use crate::error::BrochureError;
use crate::render::layout::{Block, BlockKind};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rgb,
};
use tracing::debug;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const LEFT_MARGIN: f32 = 50.0;
const RIGHT_MARGIN: f32 = 50.0;
const TOP_START: f32 = PAGE_HEIGHT - 60.0;
const BODY_START: f32 = PAGE_HEIGHT - 130.0;
const BOTTOM_LIMIT: f32 = 80.0;
const FOOTER_Y: f32 = 40.0;

const TITLE_SIZE: f32 = 18.0;
const URL_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 12.0;
const CODE_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 10.0;
const LEADING: f32 = 1.5;
const LIST_INDENT: f32 = 18.0;

/// What goes around the body.
#[derive(Debug, Clone, Default)]
pub struct PdfOptions<'a> {
    /// Printed at the top of the first page.
    pub title: &'a str,
    /// Printed under the title; skipped when empty.
    pub url: &'a str,
    /// Printed at the bottom of every page.
    pub footer: Option<&'a str>,
    /// TrueType/OpenType font bytes replacing the built-in fonts.
    pub font: Option<&'a [u8]>,
}

/// Render `blocks` to PDF bytes.
///
/// Without a custom font, text the built-in fonts cannot encode is rejected
/// with [`BrochureError::ExportFailed`] instead of being dropped from the page.
pub fn render_pdf(blocks: &[Block], options: &PdfOptions<'_>) -> Result<Vec<u8>, BrochureError> {
    let title = if options.title.trim().is_empty() {
        "Website Brochure"
    } else {
        options.title.trim()
    };
    let url = options.url.trim();

    if options.font.is_none() {
        let texts = [title, url, options.footer.unwrap_or_default()]
            .into_iter()
            .chain(blocks.iter().map(|b| b.text.as_str()));
        for text in texts {
            check_winansi(text)?;
        }
    }

    let (doc, page, layer) =
        PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Page 1");
    let fonts = Fonts::load(&doc, options.font)?;
    let layer = doc.get_page(page).get_layer(layer);

    let mut w = Writer {
        doc,
        layer,
        fonts,
        footer: options.footer.map(str::to_string),
        y: TOP_START,
        pages: 1,
    };
    w.draw_footer();

    // ── Header ───────────────────────────────────────────────────────────
    let (title_lines, url_lines) = header_lines(title, url, w.fonts.proportional_width);
    let title_font = w.fonts.bold.clone();
    let url_font = w.fonts.italic.clone();
    let mut y = TOP_START;
    for line in &title_lines {
        w.text_at(line, &title_font, TITLE_SIZE, TITLE_BLUE, LEFT_MARGIN, y);
        y -= TITLE_SIZE * LEADING;
    }
    if !url_lines.is_empty() {
        y -= 3.0;
        for line in &url_lines {
            w.text_at(line, &url_font, URL_SIZE, LINK_BLUE, LEFT_MARGIN, y);
            y -= URL_SIZE * LEADING;
        }
    }
    w.y = BODY_START.min(y - 20.0);

    // ── Body ─────────────────────────────────────────────────────────────
    for block in blocks {
        w.block(block);
    }

    debug!("Laid out {} blocks on {} pages", blocks.len(), w.pages);
    w.doc
        .save_to_bytes()
        .map_err(|e| BrochureError::ExportFailed(e.to_string()))
}

/// Title and URL broken into lines that fit the page width.
fn header_lines(title: &str, url: &str, glyph_width: f32) -> (Vec<String>, Vec<String>) {
    let title_lines = wrap(title, max_chars(TITLE_SIZE, glyph_width, 0.0));
    let url_lines = if url.is_empty() {
        Vec::new()
    } else {
        wrap(url, max_chars(URL_SIZE, glyph_width, 0.0))
    };
    (title_lines, url_lines)
}

fn max_chars(size: f32, glyph_width: f32, indent: f32) -> usize {
    let usable = PAGE_WIDTH - LEFT_MARGIN - RIGHT_MARGIN - indent;
    ((usable / (size * glyph_width)) as usize).max(10)
}

// ── Encoding ─────────────────────────────────────────────────────────────

/// Characters of Windows-1252 outside Latin-1, the extra range the built-in
/// fonts can draw.
const CP1252_EXTRAS: &str =
    "\u{20AC}\u{201A}\u{0192}\u{201E}\u{2026}\u{2020}\u{2021}\u{02C6}\u{2030}\u{0160}\u{2039}\u{0152}\u{017D}\u{2018}\u{2019}\u{201C}\u{201D}\u{2022}\u{2013}\u{2014}\u{02DC}\u{2122}\u{0161}\u{203A}\u{0153}\u{017E}\u{0178}";

fn is_winansi(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\t' | ' '..='~' | '\u{A0}'..='\u{FF}') || CP1252_EXTRAS.contains(c)
}

fn check_winansi(text: &str) -> Result<(), BrochureError> {
    match text.chars().find(|&c| !is_winansi(c)) {
        Some(c) => Err(BrochureError::ExportFailed(format!(
            "text contains '{c}' (U+{:04X}), which the built-in PDF fonts cannot draw; \
             set pdf_font / --font to a Unicode TrueType font",
            c as u32
        ))),
        None => Ok(()),
    }
}

// ── Colours ──────────────────────────────────────────────────────────────

const TITLE_BLUE: (f32, f32, f32) = (0.0, 64.0 / 255.0, 128.0 / 255.0);
const LINK_BLUE: (f32, f32, f32) = (0.0, 0.0, 1.0);
const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);
const GREY: (f32, f32, f32) = (136.0 / 255.0, 136.0 / 255.0, 136.0 / 255.0);

fn color((r, g, b): (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

// ── Fonts ────────────────────────────────────────────────────────────────

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    mono: IndirectFontRef,
    /// Average glyph width as a fraction of the font size, per font role.
    proportional_width: f32,
    mono_width: f32,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference, custom: Option<&[u8]>) -> Result<Self, BrochureError> {
        let err = |e: printpdf::Error| BrochureError::ExportFailed(format!("font: {e}"));

        if let Some(bytes) = custom {
            let font = doc.add_external_font(bytes).map_err(err)?;
            return Ok(Self {
                regular: font.clone(),
                bold: font.clone(),
                italic: font.clone(),
                mono: font,
                proportional_width: 0.55,
                mono_width: 0.55,
            });
        }

        Ok(Self {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(err)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(err)?,
            italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(err)?,
            mono: doc.add_builtin_font(BuiltinFont::Courier).map_err(err)?,
            proportional_width: 0.5,
            mono_width: 0.6,
        })
    }
}

// ── Writer ───────────────────────────────────────────────────────────────

struct Writer {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: Fonts,
    footer: Option<String>,
    y: f32,
    pages: usize,
}

impl Writer {
    fn block(&mut self, block: &Block) {
        match &block.kind {
            BlockKind::Heading(level) => {
                let size = heading_size(*level);
                self.gap(size * 0.5);
                let font = self.fonts.bold.clone();
                let width = self.fonts.proportional_width;
                self.wrapped(&block.text, &font, size, width, BLACK, 0.0, "");
                self.gap(2.0);
            }
            BlockKind::Paragraph => {
                let font = self.fonts.regular.clone();
                let width = self.fonts.proportional_width;
                self.wrapped(&block.text, &font, BODY_SIZE, width, BLACK, 0.0, "");
                self.gap(6.0);
            }
            BlockKind::Quote => {
                let font = self.fonts.italic.clone();
                let width = self.fonts.proportional_width;
                self.wrapped(&block.text, &font, BODY_SIZE, width, GREY, LIST_INDENT, "");
                self.gap(6.0);
            }
            BlockKind::ListItem { marker, depth } => {
                let font = self.fonts.regular.clone();
                let width = self.fonts.proportional_width;
                let indent = LIST_INDENT * (*depth as f32 + 1.0);
                self.wrapped(&block.text, &font, BODY_SIZE, width, BLACK, indent, marker);
            }
            BlockKind::Code => {
                let font = self.fonts.mono.clone();
                let width = self.fonts.mono_width;
                for line in block.text.lines() {
                    // Preserve indentation; only wrap overlong lines.
                    self.wrapped_raw(line, &font, CODE_SIZE, width, LIST_INDENT);
                }
                self.gap(6.0);
            }
            BlockKind::Rule => {
                self.ensure_room(BODY_SIZE);
                self.layer.set_outline_color(color(GREY));
                self.layer.set_outline_thickness(0.5);
                let y = self.y + BODY_SIZE * 0.5;
                self.layer.add_line(Line {
                    points: vec![
                        (Point::new(mm(LEFT_MARGIN), mm(y)), false),
                        (Point::new(mm(PAGE_WIDTH - RIGHT_MARGIN), mm(y)), false),
                    ],
                    is_closed: false,
                });
                self.y -= BODY_SIZE;
            }
        }
    }

    /// Word-wrap `text` and print it, with `marker` hanging left of the first line.
    #[allow(clippy::too_many_arguments)]
    fn wrapped(
        &mut self,
        text: &str,
        font: &IndirectFontRef,
        size: f32,
        glyph_width: f32,
        rgb: (f32, f32, f32),
        indent: f32,
        marker: &str,
    ) {
        let limit = max_chars(size, glyph_width, indent);
        let x = LEFT_MARGIN + indent;

        let mut first = true;
        for paragraph_line in text.split('\n') {
            for line in wrap(paragraph_line, limit) {
                self.ensure_room(size);
                if first && !marker.is_empty() {
                    let regular = self.fonts.regular.clone();
                    self.text_at(marker, &regular, size, rgb, x - LIST_INDENT * 0.8, self.y);
                }
                first = false;
                self.text_at(&line, font, size, rgb, x, self.y);
                self.y -= size * LEADING;
            }
        }
    }

    fn wrapped_raw(&mut self, line: &str, font: &IndirectFontRef, size: f32, glyph_width: f32, indent: f32) {
        let limit = max_chars(size, glyph_width, indent);
        let chars: Vec<char> = line.replace('\t', "    ").chars().collect();
        let chunks: Vec<String> = if chars.is_empty() {
            vec![String::new()]
        } else {
            chars.chunks(limit).map(|c| c.iter().collect()).collect()
        };
        for chunk in chunks {
            self.ensure_room(size);
            self.text_at(&chunk, font, size, BLACK, LEFT_MARGIN + indent, self.y);
            self.y -= size * LEADING;
        }
    }

    fn text_at(&self, text: &str, font: &IndirectFontRef, size: f32, rgb: (f32, f32, f32), x: f32, y: f32) {
        if text.is_empty() {
            return;
        }
        self.layer.set_fill_color(color(rgb));
        self.layer.use_text(text, size, mm(x), mm(y), font);
    }

    fn gap(&mut self, points: f32) {
        self.y -= points;
    }

    fn ensure_room(&mut self, size: f32) {
        if self.y - size < BOTTOM_LIMIT {
            self.new_page();
        }
    }

    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) =
            self.doc
                .add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), format!("Page {}", self.pages));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP_START;
        self.draw_footer();
    }

    fn draw_footer(&self) {
        if let Some(footer) = &self.footer {
            self.text_at(footer, &self.fonts.italic, FOOTER_SIZE, GREY, LEFT_MARGIN, FOOTER_Y);
        }
    }
}

fn heading_size(level: u8) -> f32 {
    match level {
        1 => 16.0,
        2 => 14.0,
        3 => 13.0,
        _ => BODY_SIZE,
    }
}

/// Greedy word wrap on character counts. Words longer than a line are split.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let needed = if current_len == 0 { word.len() } else { word.len() + 1 };
        if current_len + needed > max_chars && current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }
    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::blocks;

    /// Text drawn by every `Tj`/`TJ` operator, one run per line.
    fn page_text(pdf: &[u8]) -> String {
        fn strings(objects: &[lopdf::Object], out: &mut String) {
            for object in objects {
                match object {
                    lopdf::Object::String(bytes, _) => out.extend(bytes.iter().map(|&b| b as char)),
                    lopdf::Object::Array(items) => strings(items, out),
                    _ => {}
                }
            }
        }

        let doc = lopdf::Document::load_mem(pdf).unwrap();
        let mut out = String::new();
        for (_, page_id) in doc.get_pages() {
            let content = doc.get_page_content(page_id).unwrap();
            for op in lopdf::content::Content::decode(&content).unwrap().operations {
                if op.operator == "Tj" || op.operator == "TJ" {
                    strings(&op.operands, &mut out);
                    out.push('\n');
                }
            }
        }
        out
    }

    fn render(md: &str) -> Result<Vec<u8>, BrochureError> {
        render_pdf(&blocks(md), &PdfOptions::default())
    }

    #[test]
    fn body_text_lands_on_the_page() {
        let text = page_text(&render("# Welcome\n\nHello world").unwrap());
        assert!(text.contains("Website Brochure"), "got: {text}");
        assert!(text.contains("Welcome"), "got: {text}");
        assert!(text.contains("Hello world"), "got: {text}");
    }

    #[test]
    fn devanagari_needs_a_unicode_font() {
        match render("\u{928}\u{92E}\u{938}\u{94D}\u{924}\u{947} \u{926}\u{941}\u{928}\u{93F}\u{92F}\u{93E}") {
            Err(BrochureError::ExportFailed(msg)) => {
                assert!(msg.contains("U+0928"), "got: {msg}");
                assert!(msg.contains("pdf_font"), "got: {msg}");
            }
            other => panic!("expected ExportFailed, got {other:?}"),
        }
    }

    #[test]
    fn emoji_is_rejected_not_dropped() {
        assert!(matches!(
            render("\u{1F680} Launch"),
            Err(BrochureError::ExportFailed(_))
        ));
    }

    #[test]
    fn non_latin_title_is_rejected_too() {
        let options = PdfOptions {
            title: "\u{905}\u{915}\u{94D}\u{92E}\u{947}",
            ..PdfOptions::default()
        };
        assert!(render_pdf(&blocks("plain body"), &options).is_err());
    }

    #[test]
    fn windows_1252_punctuation_is_accepted() {
        let bytes = render("Caf\u{e9} \u{2013} \u{201C}quoted\u{201D} \u{20AC}5 \u{2026} \u{2122}").unwrap();
        assert!(page_text(&bytes).contains("Caf\u{e9}"));
        assert!(check_winansi("tab\there\r\n").is_ok());
    }

    #[test]
    fn long_title_and_url_wrap_to_page_width() {
        let title = "The Extremely Long And Very Official Name Of An International Holding Company Limited";
        let url = format!("https://example.com/{}", "segment/".repeat(20));

        let (title_lines, url_lines) = header_lines(title, &url, 0.5);
        assert!(title_lines.len() > 1);
        assert!(url_lines.len() > 1);
        let title_limit = max_chars(TITLE_SIZE, 0.5, 0.0);
        let url_limit = max_chars(URL_SIZE, 0.5, 0.0);
        assert!(title_lines.iter().all(|l| l.chars().count() <= title_limit));
        assert!(url_lines.iter().all(|l| l.chars().count() <= url_limit));
        assert_eq!(title_lines.join(" "), title);
        assert_eq!(url_lines.concat(), url);
    }

    #[test]
    fn empty_url_has_no_header_line() {
        let (_, url_lines) = header_lines("Acme", "", 0.5);
        assert!(url_lines.is_empty());
    }

    #[test]
    fn wrap_breaks_on_words() {
        assert_eq!(wrap("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
        assert_eq!(wrap("", 7), vec![""]);
    }

    #[test]
    fn wrap_splits_long_words() {
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("x abcdefgh", 4), vec!["x", "abcd", "efgh"]);
    }

    #[test]
    fn heading_sizes_shrink() {
        assert!(heading_size(1) > heading_size(2));
        assert_eq!(heading_size(6), BODY_SIZE);
    }

    #[test]
    fn renders_a_pdf() {
        let b = blocks("# Hello\n\nSome text.\n\n- one\n- two\n\n---\n\n```\ncode\n```");
        let bytes = render_pdf(
            &b,
            &PdfOptions {
                title: "Acme",
                url: "https://acme.example",
                footer: Some("Made with site-brochure"),
                font: None,
            },
        )
        .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_documents_span_pages() {
        let md = (0..200)
            .map(|i| format!("Paragraph number {i} with a little text."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let short = render_pdf(&blocks("one line"), &PdfOptions::default()).unwrap();
        let long = render_pdf(&blocks(&md), &PdfOptions::default()).unwrap();
        assert!(long.len() > short.len());
    }
}
