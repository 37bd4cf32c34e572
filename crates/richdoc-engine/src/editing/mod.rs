/*!
 * # Edit Transaction Layer
 *
 * Every change that external editing logic makes to a [`Document`] goes
 * through a command.
 *
 * ## Architecture Overview
 *
 * ### 1. Commands
 * - A command implements [`EditCommand`]. The built-in ones are the variants
 *   of [`Cmd`]; any `Fn(&mut Transaction<'_>) -> Result<(), DocumentError>`
 *   closure is a command too
 * - A command reads the document through the transaction and mutates only
 *   through it
 *
 * ### 2. Transactions
 * - [`Document::execute`] opens a [`Transaction`] and batches the store's
 *   change notifications while the command runs
 * - On success, observers get exactly one notification (none if nothing
 *   changed) and the caller gets a [`Patch`]
 * - On failure, a journal of every sub-edit is replayed backwards so the
 *   document is left exactly as it was, and nobody is notified
 *
 * ### 3. No re-entrancy
 * - The transaction holds the only mutable borrow of the document, so a
 *   command cannot start another command
 *
 * ## Module Structure
 *
 * - **`commands`**: the `Cmd` enum and its implementation
 * - **`transaction`**: `EditCommand`, `Transaction` and the execute loop
 * - **`patch`**: what a successful command reports back
 *
 * ## Usage Pattern
 *
 * ```rust
 * use richdoc_engine::document::{Document, DocumentNode, DocumentPosition};
 * use richdoc_engine::editing::Cmd;
 *
 * let node = DocumentNode::paragraph("Hello");
 * let id = node.id();
 * let mut doc = Document::from_nodes([node]).unwrap();
 *
 * let patch = doc
 *     .execute(&Cmd::InsertText {
 *         position: DocumentPosition::text(id, 5),
 *         text: ", world".to_string(),
 *         attributions: None,
 *     })
 *     .unwrap();
 *
 * assert_eq!(patch.changed, vec![id]);
 * assert_eq!(patch.new_selection, Some(DocumentPosition::text(id, 12)));
 * ```
 *
 * [`Document`]: crate::document::Document
 * [`Document::execute`]: crate::document::Document::execute
 * [`DocumentError`]: crate::error::DocumentError
 */

pub mod commands;
pub mod patch;
pub mod transaction;

pub use commands::Cmd;
pub use patch::Patch;
pub use transaction::{EditCommand, Transaction};
