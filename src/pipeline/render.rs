//! [`ContentNode`] → Markdown fragments.
//!
//! Pure and order-preserving: one fragment per node, in the order given,
//! with the title heading first. Joining happens once, in [`join_fragments`].

use crate::pipeline::parse::ContentNode;

/// Render the title plus every node, one fragment each.
///
/// `Image` nodes must already carry their final link target in `src`.
/// `default_language` labels code fences whose node has no language.
pub fn render_fragments(
    title: &str,
    nodes: &[ContentNode],
    default_language: Option<&str>,
) -> Vec<String> {
    let mut fragments = Vec::with_capacity(nodes.len() + 1);
    fragments.push(format!("# {title}"));
    fragments.extend(nodes.iter().map(|n| render_node(n, default_language)));
    fragments
}

/// Render one node.
pub fn render_node(node: &ContentNode, default_language: Option<&str>) -> String {
    match node {
        ContentNode::Heading2(text) => format!("## {text}"),
        ContentNode::Heading3(text) => format!("### {text}"),
        ContentNode::Paragraph(text) => text.clone(),
        ContentNode::CodeBlock { code, language } => {
            let lang = language.as_deref().or(default_language).unwrap_or("");
            code_fence(code, lang)
        }
        ContentNode::Image { src, alt } => image_link(alt.as_deref().unwrap_or(""), src),
    }
}

/// `![alt](target)`, escaping brackets in the alt text and wrapping targets
/// that would otherwise end the link early.
pub fn image_link(alt: &str, target: &str) -> String {
    let alt = alt.replace('[', "\\[").replace(']', "\\]");
    if target.contains([' ', '(', ')']) {
        format!("![{alt}](<{target}>)")
    } else {
        format!("![{alt}]({target})")
    }
}

/// Fence `code` verbatim. The fence is one backtick longer than the longest
/// backtick run inside the code (minimum three).
fn code_fence(code: &str, lang: &str) -> String {
    let longest_run = code
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat((longest_run + 1).max(3));
    let newline = if code.ends_with('\n') || code.is_empty() {
        ""
    } else {
        "\n"
    };
    format!("{fence}{lang}\n{code}{newline}{fence}")
}

/// Join fragments with blank lines; the document ends in one newline.
pub fn join_fragments(fragments: &[String]) -> String {
    let mut out = fragments.join("\n\n");
    out.push('\n');
    out
}
