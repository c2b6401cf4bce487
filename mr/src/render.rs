//! Markup renderer
//!
//! Classification of each paragraph, first match wins:
//! 1. numbered heading: `<digits>.` then whitespace
//! 2. bullet paragraph: starts with a bullet marker
//! 3. plain paragraph
//!
//! A bullet marker is a leading `-`, or a leading `*` that does not open a
//! complete emphasis span, so a line opening with `**bold**` is emphasis,
//! not a bullet.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::document::{Block, Document, Span};

static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").expect("valid paragraph regex"));

static NUMBERED_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(\d+)\.\s+(.+)").expect("valid heading regex"));

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*|\*(.*?)\*").expect("valid emphasis regex"));

/// Render optional markup; absent input is an empty document
pub fn render(raw: Option<&str>) -> Document {
    match raw {
        Some(text) => render_str(text),
        None => {
            debug!("render: no input");
            Document::new()
        }
    }
}

/// Render markup text into a document
pub fn render_str(raw: &str) -> Document {
    debug!(len = raw.len(), "render_str: called");
    let text = raw.replace("\\n", "\n").replace("\r\n", "\n");

    let blocks: Vec<Block> = PARAGRAPH_BREAK
        .split(&text)
        .map(str::trim)
        .filter(|para| !para.is_empty())
        .map(classify)
        .collect();

    debug!(block_count = blocks.len(), "render_str: complete");
    Document { blocks }
}

fn classify(para: &str) -> Block {
    if let Some(caps) = NUMBERED_HEADING.captures(para) {
        let number = caps[1].to_string();
        debug!(%number, "classify: numbered heading");
        let mut title_lines = Vec::new();
        let mut bullets = Vec::new();
        for line in caps[2].lines().map(str::trim).filter(|l| !l.is_empty()) {
            if starts_with_marker(line) {
                bullets.push(render_inline(strip_markers(line)));
            } else {
                title_lines.push(line);
            }
        }
        return Block::Heading {
            number,
            title: render_inline(&title_lines.join(" ")),
            bullets,
        };
    }

    if starts_with_marker(para) {
        debug!("classify: bullet paragraph");
        let items = para
            .lines()
            .map(strip_markers)
            .filter(|item| !item.is_empty())
            .map(render_inline)
            .collect();
        return Block::BulletList { items };
    }

    Block::Paragraph {
        content: render_inline(para),
    }
}

/// Whether the line, ignoring leading whitespace, opens with a bullet marker
fn starts_with_marker(line: &str) -> bool {
    let line = line.trim_start();
    let mut chars = line.chars();
    match chars.next() {
        Some('-') => true,
        Some('*') => chars.next().is_none_or(char::is_whitespace) || !opens_with_emphasis(line),
        _ => false,
    }
}

/// Whether a non-empty bold or italic span starts at the first character
fn opens_with_emphasis(line: &str) -> bool {
    EMPHASIS.captures(line).is_some_and(|caps| {
        let at_start = caps.get(0).is_some_and(|m| m.start() == 0);
        let inner = caps.get(1).or(caps.get(2));
        at_start && inner.is_some_and(|m| !m.as_str().is_empty())
    })
}

/// Drop leading whitespace and any number of bullet markers
fn strip_markers(line: &str) -> &str {
    let mut rest = line.trim_start();
    while starts_with_marker(rest) {
        rest = rest[1..].trim_start();
    }
    rest.trim_end()
}

/// Split text into plain, bold and italic spans.
///
/// Bold is tried before italic. Delimiters around empty content and
/// unbalanced markers stay in the plain text; adjacent plain text is merged.
pub fn render_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut last = 0;

    for caps in EMPHASIS.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let (emphasis, inner) = match (caps.get(1), caps.get(2)) {
            (Some(inner), _) => (Span::Bold as fn(String) -> Span, inner.as_str()),
            (None, Some(inner)) => (Span::Italic as fn(String) -> Span, inner.as_str()),
            (None, None) => continue,
        };

        plain.push_str(&text[last..whole.start()]);
        last = whole.end();

        if inner.is_empty() {
            plain.push_str(whole.as_str());
            continue;
        }
        if !plain.is_empty() {
            spans.push(Span::Plain(std::mem::take(&mut plain)));
        }
        spans.push(emphasis(inner.to_string()));
    }

    plain.push_str(&text[last..]);
    if !plain.is_empty() {
        spans.push(Span::Plain(plain));
    }
    spans
}
