//! Content model for a rich-text editor: attributed text, an ordered store of
//! document nodes with stable ids, and command-based editing on top.

pub mod document;
pub mod editing;
pub mod error;
pub mod text;

// Re-export key types for easier usage
pub use document::{Document, DocumentNode, DocumentPosition, DocumentRange, NodeContent, NodeId};
pub use editing::{Cmd, EditCommand, Patch, Transaction};
pub use error::{DocumentError, TextError};
pub use text::{AttributedText, Attribution, AttributionSpan, AttributionSpans};
