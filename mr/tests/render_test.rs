//! Rendering of realistic agent replies

use markrender::{Block, Span, plain_text, render, render_str};
use proptest::prelude::*;

const REPLY: &str = "Thanks for sharing that, **Jordan**.\\n\\n1. Address Instructor Staffing Gap:\\n* Recruit *two* casual teachers\\n* Review allocation\\n\\n2. Secure Funding\\n\\n- Budget review\\n- Grant applications\\n\\nWhat timeline are you working towards?";

#[test]
fn test_agent_reply_structure() {
    let doc = render_str(REPLY);
    assert_eq!(doc.len(), 5);

    assert!(matches!(&doc.blocks[0], Block::Paragraph { content } if content[1] == Span::bold("Jordan")));

    match &doc.blocks[1] {
        Block::Heading { number, title, bullets } => {
            assert_eq!(number, "1");
            assert_eq!(plain_text(title), "Address Instructor Staffing Gap:");
            assert_eq!(bullets.len(), 2);
            assert_eq!(
                bullets[0],
                vec![Span::plain("Recruit "), Span::italic("two"), Span::plain(" casual teachers")]
            );
        }
        other => panic!("expected heading, got {:?}", other),
    }

    assert!(matches!(&doc.blocks[2], Block::Heading { bullets, .. } if bullets.is_empty()));
    assert!(matches!(&doc.blocks[3], Block::BulletList { items } if items.len() == 2));
    assert!(matches!(&doc.blocks[4], Block::Paragraph { .. }));
}

#[test]
fn test_document_serializes_to_json() {
    let json = serde_json::to_value(render_str("1. Plan\n- step")).unwrap();
    assert_eq!(json["blocks"][0]["type"], "heading");
    assert_eq!(json["blocks"][0]["number"], "1");
    assert_eq!(json["blocks"][0]["bullets"][0][0]["text"], "step");
}

#[test]
fn test_render_none_matches_empty() {
    assert_eq!(render(None), render(Some("")));
}

proptest! {
    #[test]
    fn prop_render_never_fails(text in "\\PC*") {
        let _ = render_str(&text);
    }

    #[test]
    fn prop_markup_alphabet_never_fails(text in "[0-9*\\- .\\n\\\\nab]{0,64}") {
        let doc = render_str(&text);
        for block in doc.iter() {
            if let Block::Paragraph { content } = block {
                prop_assert!(!content.is_empty());
            }
        }
    }

    #[test]
    fn prop_plain_words_render_verbatim(words in prop::collection::vec("[a-z]{1,8}", 1..8)) {
        let text = words.join(" ");
        let doc = render_str(&text);
        prop_assert_eq!(doc.blocks, vec![Block::Paragraph { content: vec![Span::plain(text)] }]);
    }
}
