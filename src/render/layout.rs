//! Flatten rendered markdown into printable blocks.
//!
//! The PDF writer does not understand markdown; it places lines of text. This
//! stage walks the same event stream the HTML preview is built from and
//! reduces it to a flat list of [`Block`]s: headings, paragraphs, list items,
//! code, quotes and rules. Inline formatting is dropped; link and image text
//! is kept.

use crate::render::html::markdown_options;
use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;

/// What a block is, as far as layout cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// Heading level 1–6.
    Heading(u8),
    Paragraph,
    /// A list entry. `marker` is "•" or "3."; `depth` starts at 0.
    ListItem { marker: String, depth: usize },
    /// Preformatted text; newlines are significant.
    Code,
    Quote,
    Rule,
}

/// One printable block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Parse `markdown` into layout blocks.
pub fn blocks(markdown: &str) -> Vec<Block> {
    let mut builder = Builder::default();
    for event in Parser::new_ext(markdown, markdown_options()) {
        builder.event(event);
    }
    builder.flush();
    builder.out
}

#[derive(Default)]
struct Builder {
    out: Vec<Block>,
    kind: Option<BlockKind>,
    text: String,
    /// Next number for each open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    in_code: bool,
}

impl Builder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(t) | Event::Code(t) | Event::Html(t) | Event::InlineHtml(t) => {
                self.open_if_needed();
                self.text.push_str(&t);
            }
            Event::SoftBreak => self.text.push(' '),
            Event::HardBreak => self.text.push('\n'),
            Event::Rule => {
                self.flush();
                self.out.push(Block {
                    kind: BlockKind::Rule,
                    text: String::new(),
                });
            }
            Event::TaskListMarker(checked) => {
                self.text.push_str(if checked { "[x] " } else { "[ ] " });
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                self.kind = Some(BlockKind::Heading(level as u8));
            }
            Tag::Paragraph => {
                // Paragraphs inside a list item continue the item.
                if !matches!(self.kind, Some(BlockKind::ListItem { .. })) {
                    self.flush();
                }
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.in_code = true;
                self.kind = Some(BlockKind::Code);
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let m = format!("{n}.");
                        *n += 1;
                        m
                    }
                    _ => "\u{2022}".to_string(),
                };
                self.kind = Some(BlockKind::ListItem { marker, depth });
            }
            Tag::TableCell => {
                if !self.text.is_empty() {
                    self.text.push_str(" | ");
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) | TagEnd::Item | TagEnd::TableHead | TagEnd::TableRow => {
                self.flush()
            }
            TagEnd::Paragraph => {
                if matches!(self.kind, Some(BlockKind::ListItem { .. })) {
                    self.text.push(' ');
                } else {
                    self.flush();
                }
            }
            TagEnd::CodeBlock => {
                self.flush();
                self.in_code = false;
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
            }
            _ => {}
        }
    }

    fn open_if_needed(&mut self) {
        if self.kind.is_none() {
            self.kind = Some(if self.quote_depth > 0 {
                BlockKind::Quote
            } else {
                BlockKind::Paragraph
            });
        }
    }

    fn flush(&mut self) {
        let text = std::mem::take(&mut self.text);
        let Some(kind) = self.kind.take() else {
            return;
        };

        let text = if self.in_code {
            text.trim_end_matches('\n').to_string()
        } else {
            text.split('\n')
                .map(|line| RE_WHITESPACE.replace_all(line.trim(), " ").into_owned())
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        };

        // Empty list items still print their marker.
        if text.is_empty() && !matches!(kind, BlockKind::ListItem { .. }) {
            return;
        }
        self.out.push(Block { kind, text });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(md: &str) -> Vec<BlockKind> {
        blocks(md).into_iter().map(|b| b.kind).collect()
    }

    #[test]
    fn heading_and_paragraph() {
        let b = blocks("# Hello\n\nSome   *styled*\ntext.");
        assert_eq!(
            b,
            vec![
                Block {
                    kind: BlockKind::Heading(1),
                    text: "Hello".into()
                },
                Block {
                    kind: BlockKind::Paragraph,
                    text: "Some styled text.".into()
                },
            ]
        );
    }

    #[test]
    fn ordered_and_nested_lists() {
        let b = blocks("3. one\n4. two\n   - inner\n");
        assert_eq!(
            b[0].kind,
            BlockKind::ListItem {
                marker: "3.".into(),
                depth: 0
            }
        );
        assert_eq!(b[0].text, "one");
        assert_eq!(
            b[1].kind,
            BlockKind::ListItem {
                marker: "4.".into(),
                depth: 0
            }
        );
        assert_eq!(b[1].text, "two");
        assert_eq!(
            b[2].kind,
            BlockKind::ListItem {
                marker: "\u{2022}".into(),
                depth: 1
            }
        );
        assert_eq!(b[2].text, "inner");
    }

    #[test]
    fn code_block_keeps_lines() {
        let b = blocks("```rust\nfn main() {\n    run();\n}\n```\n");
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].kind, BlockKind::Code);
        assert_eq!(b[0].text, "fn main() {\n    run();\n}");
    }

    #[test]
    fn quote_and_rule() {
        assert_eq!(kinds("> quoted\n\n---\n\nafter"), vec![
            BlockKind::Quote,
            BlockKind::Rule,
            BlockKind::Paragraph
        ]);
    }

    #[test]
    fn link_text_is_kept() {
        let b = blocks("- [About Us](https://example.com/about)");
        assert_eq!(b[0].text, "About Us");
    }

    #[test]
    fn table_rows_become_paragraphs() {
        let b = blocks("| a | b |\n|---|---|\n| 1 | 2 |\n");
        let texts: Vec<_> = b.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["a | b", "1 | 2"]);
    }

    #[test]
    fn empty_markdown_has_no_blocks() {
        assert!(blocks("").is_empty());
        assert!(blocks("\n\n   \n").is_empty());
    }
}
