//! HTML → [`ContentNode`] extraction.
//!
//! The walk visits `h2, h3, p, pre, img` in document order and turns each
//! match into one or more content nodes. Everything here is pure: the
//! transducer resolves and downloads images afterwards, and the renderer
//! formats the nodes, so this stage can be tested on plain strings.
//!
//! Matches nested inside a `<pre>` are skipped because the block is
//! reproduced verbatim. `<img>` elements inside a `<p>` are emitted by the
//! paragraph, not a second time by the walk.

use crate::error::Web2MdError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static SEL_BLOCKS: Lazy<Selector> = Lazy::new(|| Selector::parse("h2, h3, p, pre, img").unwrap());
static SEL_H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static SEL_IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static SEL_CODE: Lazy<Selector> = Lazy::new(|| Selector::parse("code").unwrap());

/// One structural unit of a chapter, in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentNode {
    /// `<h2>` text, whitespace-normalised.
    Heading2(String),
    /// `<h3>` text, whitespace-normalised.
    Heading3(String),
    /// `<p>` text (image-free paragraphs only), whitespace-normalised.
    Paragraph(String),
    /// `<pre>` visible text, verbatim.
    CodeBlock {
        code: String,
        language: Option<String>,
    },
    /// An image; `src` is the raw attribute until the transducer resolves it.
    Image { src: String, alt: Option<String> },
}

/// Result of parsing one chapter page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Text of the first non-empty `<h1>`.
    pub title: Option<String>,
    /// Primary walk output, document order.
    pub nodes: Vec<ContentNode>,
    /// First image of every matching container, document order per selector.
    /// Only [`ContentNode::Image`] values.
    pub extra_images: Vec<ContentNode>,
}

impl ParsedDocument {
    /// True when there is nothing worth writing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.nodes.is_empty() && self.extra_images.is_empty()
    }
}

/// Collapse every run of whitespace to one space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compile CSS selectors, naming the first one that fails.
pub fn compile_selectors(selectors: &[String]) -> Result<Vec<Selector>, Web2MdError> {
    selectors.iter().map(|s| compile_selector(s)).collect()
}

/// Compile one CSS selector.
pub fn compile_selector(selector: &str) -> Result<Selector, Web2MdError> {
    Selector::parse(selector).map_err(|e| Web2MdError::InvalidSelector {
        selector: selector.to_string(),
        detail: e.to_string(),
    })
}

/// Parse a chapter page into its title, content nodes and container images.
pub fn parse_document(html: &str, image_containers: &[Selector]) -> ParsedDocument {
    let document = Html::parse_document(html);

    let title = document
        .select(&SEL_H1)
        .map(|h1| normalize_whitespace(&element_text(h1)))
        .find(|t| !t.is_empty());

    let mut nodes = Vec::new();
    for el in document.select(&SEL_BLOCKS) {
        if has_ancestor(el, "pre") {
            continue;
        }
        match el.value().name() {
            "h2" => push_text(&mut nodes, el, ContentNode::Heading2),
            "h3" => push_text(&mut nodes, el, ContentNode::Heading3),
            "p" => {
                let images: Vec<ContentNode> = el.select(&SEL_IMG).filter_map(image_node).collect();
                if images.is_empty() {
                    push_text(&mut nodes, el, ContentNode::Paragraph);
                } else {
                    nodes.extend(images);
                }
            }
            "pre" => nodes.push(ContentNode::CodeBlock {
                code: element_text(el),
                language: code_language(el),
            }),
            "img" => {
                if !has_ancestor(el, "p") {
                    nodes.extend(image_node(el));
                }
            }
            _ => {}
        }
    }

    let extra_images = image_containers
        .iter()
        .flat_map(|sel| document.select(sel))
        .filter_map(|container| container.select(&SEL_IMG).next())
        .filter_map(image_node)
        .collect();

    ParsedDocument {
        title,
        nodes,
        extra_images,
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

fn push_text(nodes: &mut Vec<ContentNode>, el: ElementRef<'_>, make: fn(String) -> ContentNode) {
    let text = normalize_whitespace(&element_text(el));
    if !text.is_empty() {
        nodes.push(make(text));
    }
}

fn image_node(img: ElementRef<'_>) -> Option<ContentNode> {
    let src = img.value().attr("src")?.trim();
    if src.is_empty() {
        return None;
    }
    let alt = img
        .value()
        .attr("alt")
        .map(normalize_whitespace)
        .filter(|a| !a.is_empty());
    Some(ContentNode::Image {
        src: src.to_string(),
        alt,
    })
}

fn has_ancestor(el: ElementRef<'_>, name: &str) -> bool {
    el.ancestors()
        .filter_map(|n| n.value().as_element())
        .any(|e| e.name() == name)
}

/// `language-xxx` / `lang-xxx` class on the `<pre>` or its first `<code>`.
fn code_language(pre: ElementRef<'_>) -> Option<String> {
    let from = |el: ElementRef<'_>| {
        el.value().classes().find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .filter(|l| !l.is_empty())
                .map(str::to_string)
        })
    };
    from(pre).or_else(|| pre.select(&SEL_CODE).next().and_then(from))
}
