//! Markdown → layout blocks for the PDF converter.
//!
//! pulldown-cmark's event stream is folded into a flat list of [`Block`]s
//! that genpdf can lay out one after another. Only the constructs the
//! transducer emits (plus lists, rules and inline emphasis) get dedicated
//! blocks; anything else degrades to its text.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// A run of inline text with uniform styling.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

/// One vertically stacked layout unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(Vec<Span>),
    /// Fenced or indented code, lines preserved.
    Code(String),
    ListItem(Vec<Span>),
    Image { alt: String, target: String },
    Rule,
}

#[derive(Default)]
struct Folder {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    bold: usize,
    italic: usize,
    heading: Option<u8>,
    code: Option<String>,
    image: Option<(String, String)>,
    list_depth: usize,
}

impl Folder {
    fn push_text(&mut self, text: &str, code: bool) {
        if let Some(ref mut buf) = self.code {
            buf.push_str(text);
            return;
        }
        if let Some((_, ref mut alt)) = self.image {
            alt.push_str(text);
            return;
        }
        let (bold, italic) = (self.bold > 0, self.italic > 0);
        match self.spans.last_mut() {
            Some(last) if last.bold == bold && last.italic == italic && last.code == code => {
                last.text.push_str(text);
            }
            _ => self.spans.push(Span {
                text: text.to_string(),
                bold,
                italic,
                code,
            }),
        }
    }

    fn take_spans(&mut self) -> Option<Vec<Span>> {
        let spans = std::mem::take(&mut self.spans);
        if spans.iter().all(|s| s.text.trim().is_empty()) {
            None
        } else {
            Some(spans)
        }
    }

    fn flush_paragraph(&mut self) {
        if let Some(spans) = self.take_spans() {
            self.blocks.push(Block::Paragraph(spans));
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush_paragraph();
                self.heading = Some(heading_level(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                let text: String = std::mem::take(&mut self.spans)
                    .into_iter()
                    .map(|s| s.text)
                    .collect();
                if let Some(level) = self.heading.take() {
                    self.blocks.push(Block::Heading {
                        level,
                        text: text.trim().to_string(),
                    });
                }
            }
            Event::End(TagEnd::Paragraph) if self.list_depth == 0 => self.flush_paragraph(),
            Event::Start(Tag::Item) => {
                self.flush_paragraph();
                self.list_depth += 1;
            }
            Event::End(TagEnd::Item) => {
                if let Some(spans) = self.take_spans() {
                    self.blocks.push(Block::ListItem(spans));
                }
                self.list_depth = self.list_depth.saturating_sub(1);
            }
            Event::Start(Tag::CodeBlock(_)) => {
                self.flush_paragraph();
                self.code = Some(String::new());
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(code) = self.code.take() {
                    self.blocks.push(Block::Code(code));
                }
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                self.flush_paragraph();
                self.image = Some((dest_url.to_string(), String::new()));
            }
            Event::End(TagEnd::Image) => {
                if let Some((target, alt)) = self.image.take() {
                    self.blocks.push(Block::Image { alt, target });
                }
            }
            Event::Start(Tag::Emphasis) => self.italic += 1,
            Event::End(TagEnd::Emphasis) => self.italic = self.italic.saturating_sub(1),
            Event::Start(Tag::Strong) => self.bold += 1,
            Event::End(TagEnd::Strong) => self.bold = self.bold.saturating_sub(1),
            // Decoded page text such as `<script>` parses as raw HTML; keep it
            // visible as plain text.
            Event::Html(text) | Event::InlineHtml(text) => {
                self.push_text(&text.replace('\n', " "), false)
            }
            Event::End(TagEnd::HtmlBlock) if self.list_depth == 0 => {
                if let Some(last) = self.spans.last_mut() {
                    last.text.truncate(last.text.trim_end().len());
                }
                self.flush_paragraph();
            }
            Event::Text(text) => self.push_text(&text, false),
            Event::Code(text) => self.push_text(&text, true),
            Event::SoftBreak | Event::HardBreak => self.push_text(" ", false),
            Event::Rule => {
                self.flush_paragraph();
                self.blocks.push(Block::Rule);
            }
            _ => {}
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Fold `markdown` into layout blocks, in document order.
pub fn markdown_to_blocks(markdown: &str) -> Vec<Block> {
    let mut folder = Folder::default();
    for event in Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH) {
        folder.event(event);
    }
    folder.flush_paragraph();
    folder.blocks
}

/// Text of the first level-1 heading.
pub fn document_title(blocks: &[Block]) -> Option<&str> {
    blocks.iter().find_map(|b| match b {
        Block::Heading { level: 1, text } => Some(text.as_str()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Span {
        Span {
            text: text.into(),
            ..Span::default()
        }
    }

    #[test]
    fn folds_transducer_output() {
        let md = "# Title\n\n## Section\n\nHello world\n\n```javascript\nlet a  = 1;\n  b();\n```\n\n![Diagram](images/diagram.png)\n";
        let blocks = markdown_to_blocks(md);
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    level: 1,
                    text: "Title".into()
                },
                Block::Heading {
                    level: 2,
                    text: "Section".into()
                },
                Block::Paragraph(vec![plain("Hello world")]),
                Block::Code("let a  = 1;\n  b();\n".into()),
                Block::Image {
                    alt: "Diagram".into(),
                    target: "images/diagram.png".into()
                },
            ]
        );
        assert_eq!(document_title(&blocks), Some("Title"));
    }

    #[test]
    fn inline_styles_become_spans() {
        let blocks = markdown_to_blocks("a **b** *c* `d`");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                plain("a "),
                Span {
                    text: "b".into(),
                    bold: true,
                    ..Span::default()
                },
                plain(" "),
                Span {
                    text: "c".into(),
                    italic: true,
                    ..Span::default()
                },
                plain(" "),
                Span {
                    text: "d".into(),
                    code: true,
                    ..Span::default()
                },
            ])]
        );
    }

    #[test]
    fn lists_and_rules() {
        let blocks = markdown_to_blocks("- one\n- two\n\n---\n\nend");
        assert_eq!(
            blocks,
            vec![
                Block::ListItem(vec![plain("one")]),
                Block::ListItem(vec![plain("two")]),
                Block::Rule,
                Block::Paragraph(vec![plain("end")]),
            ]
        );
    }

    #[test]
    fn tag_like_text_stays_visible() {
        let md = crate::transduce::html_to_markdown(
            "<h1>T</h1><p>Use the &lt;script&gt; tag to embed code.</p>\
             <p>&lt;div&gt; elements group content.</p><p>Last para</p>",
            "https://example.com/js/html.htm",
        );
        assert_eq!(
            markdown_to_blocks(&md),
            vec![
                Block::Heading {
                    level: 1,
                    text: "T".into()
                },
                Block::Paragraph(vec![plain("Use the <script> tag to embed code.")]),
                Block::Paragraph(vec![plain("<div> elements group content.")]),
                Block::Paragraph(vec![plain("Last para")]),
            ]
        );
    }

    #[test]
    fn no_title_without_h1() {
        assert_eq!(document_title(&markdown_to_blocks("## only h2")), None);
    }
}
