//! Document tree produced by the renderer

use serde::{Deserialize, Serialize};

/// A run of inline text with its emphasis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "lowercase")]
pub enum Span {
    Plain(String),
    Bold(String),
    Italic(String),
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain(text.into())
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self::Bold(text.into())
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self::Italic(text.into())
    }

    /// The text without emphasis
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Bold(text) | Self::Italic(text) => text,
        }
    }
}

/// A top-level block of a rendered message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Block {
    /// `1. Title` followed by optional bullet lines
    Heading {
        number: String,
        title: Vec<Span>,
        bullets: Vec<Vec<Span>>,
    },
    BulletList {
        items: Vec<Vec<Span>>,
    },
    Paragraph {
        content: Vec<Span>,
    },
}

/// Ordered blocks of one rendered message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }
}

/// Concatenated text of a span sequence, emphasis dropped
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(Span::text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_serialization_shape() {
        let block = Block::Paragraph {
            content: vec![Span::bold("hi"), Span::plain(" there")],
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "paragraph");
        assert_eq!(json["content"][0]["type"], "bold");
        assert_eq!(json["content"][0]["text"], "hi");

        let list = Block::BulletList { items: vec![] };
        assert_eq!(serde_json::to_value(&list).unwrap()["type"], "bullet-list");
    }

    #[test]
    fn test_plain_text() {
        let spans = vec![Span::bold("Apollo"), Span::plain(" is "), Span::italic("live")];
        assert_eq!(plain_text(&spans), "Apollo is live");
    }
}
