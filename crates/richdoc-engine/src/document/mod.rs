/*!
 * # Document Node Store
 *
 * A document is an ordered list of [`DocumentNode`]s. Each node has a
 * [`NodeId`] that stays the same for as long as the node exists, and holds
 * either attributed text (paragraphs, headings, list items) or a non-text
 * block (horizontal rule, image).
 *
 * ## Module Structure
 *
 * - **`node`**: node identity and content
 * - **`store`**: the [`Document`] itself: lookups, structural edits, range
 *   queries
 * - **`position`**: [`DocumentPosition`] and [`DocumentRange`], weak
 *   references into a document
 * - **`observers`**: change listeners and subscription handles
 * - **`config`**: behaviour switches such as the out-of-range insert policy
 *
 * ## Usage Pattern
 *
 * ```rust
 * use richdoc_engine::document::{Document, DocumentNode};
 *
 * let mut doc = Document::new();
 * let first = DocumentNode::paragraph("Hello");
 * let id = first.id();
 * doc.add_node(first).unwrap();
 * doc.insert_node_after(id, DocumentNode::paragraph("World")).unwrap();
 *
 * assert_eq!(doc.get_node_index_by_id(id), Some(0));
 * assert_eq!(doc.len(), 2);
 * ```
 */

pub mod config;
pub mod node;
pub mod observers;
pub mod position;
pub mod store;

pub use config::{DocumentConfig, InsertPolicy};
pub use node::{BlockType, DocumentNode, ListItemKind, NodeContent, NodeId};
pub use observers::{Listeners, SubscriptionId};
pub use position::{DocumentPosition, DocumentRange, NodePosition, TextAffinity};
pub use store::Document;
