//! markrender - chat markup to document tree
//!
//! Agent replies use a small markup: blank-line separated paragraphs,
//! numbered headings (`1. Title`) with `*`/`-` bullet lines beneath them,
//! bullet paragraphs, and `**bold**` / `*italic*` emphasis. [`render`] turns
//! such text into a [`Document`]. Rendering is total: any input, including
//! none at all, produces a document.

pub mod document;
pub mod render;

pub use document::{Block, Document, Span, plain_text};
pub use render::{render, render_inline, render_str};
