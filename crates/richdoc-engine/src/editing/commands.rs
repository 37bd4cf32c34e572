use std::ops::Range;

use crate::document::{
    Document, DocumentNode, DocumentPosition, DocumentRange, NodeContent, NodeId, NodePosition,
};
use crate::editing::transaction::{EditCommand, Transaction};
use crate::error::DocumentError;
use crate::text::{AttributedText, Attribution, offsets};

/// Built-in editing commands
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Type `text` at a text position. With `attributions`, the inserted run
    /// carries exactly those; without, it picks up whatever span it lands
    /// inside.
    InsertText {
        position: DocumentPosition,
        text: String,
        attributions: Option<Vec<Attribution>>,
    },
    /// Backspace: remove one character upstream of `position`, or join the
    /// node with its predecessor at the start of a node.
    DeleteUpstream { position: DocumentPosition },
    /// Remove everything in `range`, joining the end node's remainder onto
    /// the start node when both hold text.
    DeleteRange { range: DocumentRange },
    /// Split a text node at `position`; the tail moves to a new node with id
    /// `new_node_id` right after it.
    SplitParagraph {
        position: DocumentPosition,
        new_node_id: NodeId,
    },
    /// Remove `attributions` from `range` when every character there already
    /// has all of them, otherwise add them across the range.
    ToggleAttributions {
        range: DocumentRange,
        attributions: Vec<Attribution>,
    },
    /// Insert a node after `after`, or at the top when `after` is `None`.
    InsertNode {
        after: Option<NodeId>,
        id: NodeId,
        content: NodeContent,
    },
    DeleteNode { id: NodeId },
    MoveNode { id: NodeId, to_index: usize },
}

impl EditCommand for Cmd {
    fn execute(&self, tx: &mut Transaction<'_>) -> Result<(), DocumentError> {
        match self {
            Cmd::InsertText {
                position,
                text,
                attributions,
            } => insert_text(tx, position, text, attributions.as_deref()),
            Cmd::DeleteUpstream { position } => delete_upstream(tx, position),
            Cmd::DeleteRange { range } => delete_range(tx, range),
            Cmd::SplitParagraph {
                position,
                new_node_id,
            } => split_paragraph(tx, position, *new_node_id),
            Cmd::ToggleAttributions {
                range,
                attributions,
            } => toggle_attributions(tx, range, attributions),
            Cmd::InsertNode { after, id, content } => {
                let node = DocumentNode::with_id(*id, content.clone());
                match after {
                    Some(after) => tx.insert_node_after(*after, node)?,
                    None => tx.insert_node_at(0, node)?,
                }
                tx.set_selection(start_of(tx.document(), *id)?);
                Ok(())
            }
            Cmd::DeleteNode { id } => tx.delete_node(*id),
            Cmd::MoveNode { id, to_index } => tx.move_node(*id, *to_index),
        }
    }
}

fn insert_text(
    tx: &mut Transaction<'_>,
    position: &DocumentPosition,
    text: &str,
    attributions: Option<&[Attribution]>,
) -> Result<(), DocumentError> {
    let id = position.node_id;
    let offset = text_offset(tx.document(), position)?;
    tx.edit_text(id, |buffer| match attributions {
        None => buffer.insert_text(offset, text),
        Some(attributions) => {
            let mut run = AttributedText::new(text);
            for attribution in attributions {
                run.add_attribution(attribution.clone(), 0..run.len())?;
            }
            buffer.insert_attributed_text(offset, &run)
        }
    })?;
    tx.set_selection(DocumentPosition::text(id, offset + offsets::len_utf16(text)));
    Ok(())
}

fn delete_upstream(
    tx: &mut Transaction<'_>,
    position: &DocumentPosition,
) -> Result<(), DocumentError> {
    let id = position.node_id;
    let index = tx.document().resolve_position(position)?;
    let node = &tx.document().nodes()[index];

    if node.text().is_none() {
        // A non-text node is removed whole; the caret lands on the end of its
        // predecessor.
        let landing = match tx.document().get_node_before(id) {
            Some(before) => Some(end_of(tx.document(), before.id())?),
            None => None,
        };
        tx.delete_node(id)?;
        if let Some(landing) = landing {
            tx.set_selection(landing);
        }
        return Ok(());
    }

    let offset = text_offset(tx.document(), position)?;
    if offset > 0 {
        let previous = tx.edit_text(id, |text| {
            let previous = text.previous_character_boundary(offset, 1)?.unwrap_or(0);
            text.delete_range(previous..offset)?;
            Ok::<_, DocumentError>(previous)
        })?;
        tx.set_selection(DocumentPosition::text(id, previous));
        return Ok(());
    }

    let before = tx
        .document()
        .get_node_before(id)
        .map(|node| (node.id(), node.text().is_some()));
    let Some((before_id, before_is_text)) = before else {
        tx.set_selection(*position);
        return Ok(());
    };
    if !before_is_text {
        tx.delete_node(before_id)?;
        tx.set_selection(DocumentPosition::text(id, 0));
        return Ok(());
    }

    let join_at = merge_into_previous(tx, before_id, id)?;
    tx.set_selection(DocumentPosition::text(before_id, join_at));
    Ok(())
}

/// Appends the text of `id` to `into` and removes `id`. Returns the offset
/// where the appended text starts.
fn merge_into_previous(
    tx: &mut Transaction<'_>,
    into: NodeId,
    id: NodeId,
) -> Result<usize, DocumentError> {
    let tail = node_text(tx.document(), id)?.clone();
    let join_at = tx.edit_text(into, |text| {
        let join_at = text.len();
        text.append_attributed_text(&tail);
        Ok::<_, DocumentError>(join_at)
    })?;
    tx.delete_node(id)?;
    Ok(join_at)
}

fn delete_range(tx: &mut Transaction<'_>, range: &DocumentRange) -> Result<(), DocumentError> {
    let DocumentRange { start, end } = range.normalize(tx.document())?;
    let start_index = tx.document().resolve_position(&start)?;
    let end_index = tx.document().resolve_position(&end)?;
    let (start_id, end_id) = (start.node_id, end.node_id);

    if start_index == end_index {
        if tx.document().nodes()[start_index].text().is_some() {
            let from = text_offset(tx.document(), &start)?;
            let to = text_offset(tx.document(), &end)?;
            tx.edit_text(start_id, |text| text.delete_range(from..to))?;
            tx.set_selection(DocumentPosition::text(start_id, from));
        } else if start.node_position == NodePosition::Before
            && end.node_position == NodePosition::After
        {
            tx.delete_node(start_id)?;
        }
        return Ok(());
    }

    let between: Vec<NodeId> = tx.document().nodes()[start_index + 1..end_index]
        .iter()
        .map(DocumentNode::id)
        .collect();
    for id in between {
        tx.delete_node(id)?;
    }

    let start_is_text = tx.document().nodes()[start_index].text().is_some();
    let end_is_text = tx
        .document()
        .get_node_by_id(end_id)
        .is_some_and(|node| node.text().is_some());

    if start_is_text && end_is_text {
        let from = text_offset(tx.document(), &start)?;
        let to = text_offset(tx.document(), &end)?;
        tx.edit_text(start_id, |text| text.delete_range(from..text.len()))?;
        tx.edit_text(end_id, |text| text.delete_range(0..to))?;
        merge_into_previous(tx, start_id, end_id)?;
        tx.set_selection(DocumentPosition::text(start_id, from));
        return Ok(());
    }

    if start_is_text {
        let from = text_offset(tx.document(), &start)?;
        tx.edit_text(start_id, |text| text.delete_range(from..text.len()))?;
    } else if start.node_position == NodePosition::Before {
        tx.delete_node(start_id)?;
    }

    if end_is_text {
        let to = text_offset(tx.document(), &end)?;
        tx.edit_text(end_id, |text| text.delete_range(0..to))?;
    } else if end.node_position == NodePosition::After {
        tx.delete_node(end_id)?;
    }

    if tx.document().get_node_by_id(start_id).is_some() {
        tx.set_selection(start);
    } else if tx.document().get_node_by_id(end_id).is_some() {
        tx.set_selection(start_of(tx.document(), end_id)?);
    }
    Ok(())
}

fn split_paragraph(
    tx: &mut Transaction<'_>,
    position: &DocumentPosition,
    new_node_id: NodeId,
) -> Result<(), DocumentError> {
    let id = position.node_id;
    let offset = text_offset(tx.document(), position)?;
    let tail = tx.edit_text(id, |text| text.split_off(offset))?;
    let content = tx
        .document()
        .get_node_by_id(id)
        .and_then(|node| node.content().continuation(tail))
        .ok_or(DocumentError::NotATextNode(id))?;
    tx.insert_node_after(id, DocumentNode::with_id(new_node_id, content))?;
    tx.set_selection(DocumentPosition::text(new_node_id, 0));
    Ok(())
}

fn toggle_attributions(
    tx: &mut Transaction<'_>,
    range: &DocumentRange,
    attributions: &[Attribution],
) -> Result<(), DocumentError> {
    let DocumentRange { start, end } = range.normalize(tx.document())?;
    let targets = text_ranges(tx.document(), &start, &end)?;
    if targets.is_empty() {
        return Ok(());
    }

    let document = tx.document();
    let already_applied = targets.iter().all(|(id, range)| {
        node_text(document, *id).is_ok_and(|text| {
            attributions
                .iter()
                .all(|attribution| text.covers(attribution, range.clone()))
        })
    });

    for (id, range) in targets {
        tx.edit_text(id, |text| {
            for attribution in attributions {
                if already_applied {
                    text.remove_attribution(attribution, range.clone())?;
                } else {
                    text.add_attribution(attribution.clone(), range.clone())?;
                }
            }
            Ok::<_, DocumentError>(())
        })?;
    }
    Ok(())
}

/// The non-empty text range each text node between `start` and `end`
/// contributes.
fn text_ranges(
    document: &Document,
    start: &DocumentPosition,
    end: &DocumentPosition,
) -> Result<Vec<(NodeId, Range<usize>)>, DocumentError> {
    let mut ranges = Vec::new();
    for node in document.get_nodes_inside(start, end)? {
        let Some(text) = node.text() else {
            continue;
        };
        let from = if node.id() == start.node_id {
            text_offset(document, start)?
        } else {
            0
        };
        let to = if node.id() == end.node_id {
            text_offset(document, end)?
        } else {
            text.len()
        };
        if from < to {
            ranges.push((node.id(), from..to));
        }
    }
    Ok(ranges)
}

fn node_text(document: &Document, id: NodeId) -> Result<&AttributedText, DocumentError> {
    document
        .get_node_by_id(id)
        .ok_or(DocumentError::NodeNotFound(id))?
        .text()
        .ok_or(DocumentError::NotATextNode(id))
}

/// The text offset `position` stands for. `Before` and `After` map to the
/// start and end of the text.
fn text_offset(document: &Document, position: &DocumentPosition) -> Result<usize, DocumentError> {
    document.resolve_position(position)?;
    let text = node_text(document, position.node_id)?;
    Ok(match position.node_position {
        NodePosition::Before => 0,
        NodePosition::Text { offset, .. } => offset,
        NodePosition::After => text.len(),
    })
}

fn start_of(document: &Document, id: NodeId) -> Result<DocumentPosition, DocumentError> {
    Ok(match node_text(document, id) {
        Ok(_) => DocumentPosition::text(id, 0),
        Err(DocumentError::NotATextNode(_)) => DocumentPosition::before(id),
        Err(err) => return Err(err),
    })
}

fn end_of(document: &Document, id: NodeId) -> Result<DocumentPosition, DocumentError> {
    Ok(match node_text(document, id) {
        Ok(text) => DocumentPosition::text(id, text.len()),
        Err(DocumentError::NotATextNode(_)) => DocumentPosition::after(id),
        Err(err) => return Err(err),
    })
}
