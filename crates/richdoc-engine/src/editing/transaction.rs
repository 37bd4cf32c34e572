use log::{debug, warn};

use crate::document::{Document, DocumentNode, DocumentPosition, NodeContent, NodeId};
use crate::editing::Patch;
use crate::error::DocumentError;
use crate::text::AttributedText;

/// A unit of change applied through a [`Transaction`].
///
/// Commands read the document through [`Transaction::document`] and mutate it
/// only through the transaction. Returning an error undoes everything the
/// command did.
pub trait EditCommand {
    fn execute(&self, tx: &mut Transaction<'_>) -> Result<(), DocumentError>;
}

impl<F> EditCommand for F
where
    F: Fn(&mut Transaction<'_>) -> Result<(), DocumentError>,
{
    fn execute(&self, tx: &mut Transaction<'_>) -> Result<(), DocumentError> {
        self(tx)
    }
}

/// What a sub-edit replaced, so it can be put back.
enum JournalEntry {
    Inserted(NodeId),
    Removed { index: usize, node: DocumentNode },
    Moved { id: NodeId, from: usize },
    Replaced { index: usize, old: DocumentNode },
    Edited { id: NodeId, previous: NodeContent },
}

/// Handle through which a command edits the document.
///
/// Offers the store's structural operations plus in-place content edits.
/// Notifications raised while the transaction is open are held back and
/// delivered as one when the command succeeds.
pub struct Transaction<'a> {
    document: &'a mut Document,
    journal: Vec<JournalEntry>,
    touched: Vec<NodeId>,
    selection: Option<DocumentPosition>,
}

impl<'a> Transaction<'a> {
    fn new(document: &'a mut Document) -> Self {
        Self {
            document,
            journal: Vec::new(),
            touched: Vec::new(),
            selection: None,
        }
    }

    /// Read view of the document as it currently stands, edits so far
    /// included.
    pub fn document(&self) -> &Document {
        self.document
    }

    pub fn set_selection(&mut self, selection: DocumentPosition) {
        self.selection = Some(selection);
    }

    pub fn insert_node_at(&mut self, index: usize, node: DocumentNode) -> Result<(), DocumentError> {
        let index = self.document.resolve_insert_index(index)?;
        let id = node.id();
        self.document.raw_insert(index, node)?;
        self.record(JournalEntry::Inserted(id), id);
        Ok(())
    }

    pub fn add_node(&mut self, node: DocumentNode) -> Result<(), DocumentError> {
        self.insert_node_at(self.document.len(), node)
    }

    pub fn insert_node_before(
        &mut self,
        existing: NodeId,
        node: DocumentNode,
    ) -> Result<(), DocumentError> {
        let index = self.document.index_of(existing)?;
        self.insert_node_at(index, node)
    }

    pub fn insert_node_after(
        &mut self,
        existing: NodeId,
        node: DocumentNode,
    ) -> Result<(), DocumentError> {
        let index = self.document.index_of(existing)?;
        self.insert_node_at(index + 1, node)
    }

    pub fn delete_node_at(&mut self, index: usize) -> Result<(), DocumentError> {
        self.document.check_index(index)?;
        let node = self.document.raw_remove(index);
        let id = node.id();
        self.record(JournalEntry::Removed { index, node }, id);
        Ok(())
    }

    pub fn delete_node(&mut self, id: NodeId) -> Result<(), DocumentError> {
        let index = self.document.index_of(id)?;
        self.delete_node_at(index)
    }

    pub fn move_node(&mut self, id: NodeId, target_index: usize) -> Result<(), DocumentError> {
        let from = self.document.index_of(id)?;
        self.document.check_index(target_index)?;
        self.document.raw_move(from, target_index);
        self.record(JournalEntry::Moved { id, from }, id);
        Ok(())
    }

    pub fn replace_node(&mut self, old: NodeId, new: DocumentNode) -> Result<(), DocumentError> {
        let index = self.document.index_of(old)?;
        let new_id = new.id();
        let replaced = self.document.raw_replace(index, new)?;
        self.touch(old);
        self.record(JournalEntry::Replaced { index, old: replaced }, new_id);
        Ok(())
    }

    /// Edits a node's content in place. Nothing is recorded or notified
    /// when `f` leaves the content as it was.
    pub fn edit_node<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut NodeContent) -> R,
    ) -> Result<R, DocumentError> {
        let node = self
            .document
            .node_mut(id)
            .ok_or(DocumentError::NodeNotFound(id))?;
        let previous = node.content().clone();
        let result = f(node.content_mut());
        if *node.content() != previous {
            node.notify();
            self.record(JournalEntry::Edited { id, previous }, id);
        }
        Ok(result)
    }

    /// Edits the text of a text node in place. When `f` fails the text is
    /// left as it was; when it changes nothing, nothing is recorded.
    pub fn edit_text<R, E>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut AttributedText) -> Result<R, E>,
    ) -> Result<R, DocumentError>
    where
        DocumentError: From<E>,
    {
        let node = self
            .document
            .node_mut(id)
            .ok_or(DocumentError::NodeNotFound(id))?;
        let previous = node.content().clone();
        let text = node
            .content_mut()
            .text_mut()
            .ok_or(DocumentError::NotATextNode(id))?;
        match f(text) {
            Ok(result) => {
                if *node.content() != previous {
                    node.notify();
                    self.record(JournalEntry::Edited { id, previous }, id);
                }
                Ok(result)
            }
            Err(err) => {
                node.replace_content(previous);
                Err(err.into())
            }
        }
    }

    fn record(&mut self, entry: JournalEntry, id: NodeId) {
        self.journal.push(entry);
        self.touch(id);
        self.document.hub().changed();
    }

    fn touch(&mut self, id: NodeId) {
        if !self.touched.contains(&id) {
            self.touched.push(id);
        }
    }

    fn finish(self) -> (Vec<NodeId>, Vec<NodeId>, Option<DocumentPosition>) {
        let document = self.document;
        let (changed, removed): (Vec<NodeId>, Vec<NodeId>) = self
            .touched
            .into_iter()
            .partition(|id| document.get_node_index_by_id(*id).is_some());
        (changed, removed, self.selection)
    }

    /// Undoes every recorded sub-edit, newest first. Returns how many there
    /// were.
    fn rollback(self) -> usize {
        let undone = self.journal.len();
        for entry in self.journal.into_iter().rev() {
            if let Err(err) = undo(self.document, entry) {
                warn!("rollback step failed: {err}");
            }
        }
        undone
    }
}

fn undo(document: &mut Document, entry: JournalEntry) -> Result<(), DocumentError> {
    match entry {
        JournalEntry::Inserted(id) => {
            let index = document.index_of(id)?;
            document.raw_remove(index);
        }
        JournalEntry::Removed { index, node } => document.raw_insert(index, node)?,
        JournalEntry::Moved { id, from } => {
            let index = document.index_of(id)?;
            document.raw_move(index, from);
        }
        JournalEntry::Replaced { index, old } => {
            document.raw_replace(index, old)?;
        }
        JournalEntry::Edited { id, previous } => {
            document
                .node_mut(id)
                .ok_or(DocumentError::NodeNotFound(id))?
                .replace_content(previous);
        }
    }
    Ok(())
}

/// Runs `command` against `document` as one transaction.
pub(crate) fn execute<C: EditCommand + ?Sized>(
    document: &mut Document,
    command: &C,
) -> Result<Patch, DocumentError> {
    let hub = document.hub().clone();
    hub.begin_batch();
    let mut tx = Transaction::new(document);
    match command.execute(&mut tx) {
        Ok(()) => {
            let (changed, removed, new_selection) = tx.finish();
            let notified = hub.end_batch(true);
            debug!(
                "command committed: {} changed, {} removed, notified: {notified}",
                changed.len(),
                removed.len()
            );
            Ok(Patch {
                changed,
                removed,
                new_selection,
                version: document.version(),
            })
        }
        Err(err) => {
            let undone = tx.rollback();
            hub.end_batch(false);
            warn!("command failed, rolled back {undone} edits: {err}");
            Err(err)
        }
    }
}
