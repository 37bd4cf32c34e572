use std::cell::Cell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use richdoc_engine::document::{DocumentConfig, InsertPolicy, NodeContent};
use richdoc_engine::{
    Cmd, Document, DocumentError, DocumentNode, DocumentPosition, DocumentRange, NodeId,
    Transaction,
};

fn document(texts: &[&str]) -> (Document, Vec<NodeId>) {
    let doc = Document::from_nodes(texts.iter().map(|text| DocumentNode::paragraph(*text))).unwrap();
    let ids = doc.nodes().iter().map(DocumentNode::id).collect();
    (doc, ids)
}

fn texts(doc: &Document) -> Vec<String> {
    doc.nodes()
        .iter()
        .map(|node| node.text().map(|t| t.text()).unwrap_or_default())
        .collect()
}

fn notification_counter(doc: &mut Document) -> Rc<Cell<usize>> {
    let count = Rc::new(Cell::new(0));
    let seen = count.clone();
    doc.subscribe(move || seen.set(seen.get() + 1));
    count
}

#[test]
fn multi_step_command_notifies_once() {
    let (mut doc, ids) = document(&["one", "two"]);
    let count = notification_counter(&mut doc);

    let command = |tx: &mut Transaction<'_>| -> Result<(), DocumentError> {
        tx.add_node(DocumentNode::paragraph("three"))?;
        tx.move_node(ids[0], 2)?;
        tx.edit_text(ids[1], |text| text.insert_text(3, "!"))?;
        Ok(())
    };
    let patch = doc.execute(&command).unwrap();

    assert_eq!(texts(&doc), vec!["two!", "three", "one"]);
    assert_eq!(count.get(), 1);
    assert_eq!(patch.version, 1);
    assert_eq!(patch.changed.len(), 3);
    assert!(patch.removed.is_empty());
}

#[test]
fn failing_command_is_rolled_back_silently() {
    let (mut doc, ids) = document(&["one", "two", "three"]);
    let before: Vec<NodeId> = doc.nodes().iter().map(DocumentNode::id).collect();
    let count = notification_counter(&mut doc);
    let missing = NodeId::new();

    let command = |tx: &mut Transaction<'_>| -> Result<(), DocumentError> {
        tx.edit_text(ids[0], |text| text.insert_text(0, ">> "))?;
        tx.delete_node(ids[1])?;
        tx.insert_node_at(0, DocumentNode::new(NodeContent::HorizontalRule))?;
        tx.move_node(ids[2], 0)?;
        tx.replace_node(ids[0], DocumentNode::paragraph("replaced"))?;
        tx.move_node(missing, 0)?;
        Ok(())
    };
    let result = doc.execute(&command);

    assert_eq!(result, Err(DocumentError::NodeNotFound(missing)));
    assert_eq!(texts(&doc), vec!["one", "two", "three"]);
    assert_eq!(doc.nodes().iter().map(DocumentNode::id).collect::<Vec<_>>(), before);
    assert_eq!(count.get(), 0);
    assert_eq!(doc.version(), 0);

    // Nodes put back by the rollback forward their changes again.
    doc.node_mut(ids[1])
        .unwrap()
        .edit_text(|text| text.insert_text(0, "2: "))
        .unwrap();
    assert_eq!(count.get(), 1);
}

#[test]
fn deleted_nodes_no_longer_notify_the_document() {
    let (mut doc, ids) = document(&["keep", "drop"]);
    let count = notification_counter(&mut doc);

    let mut dropped = doc.delete_node(ids[1]).unwrap();
    assert_eq!(count.get(), 1);

    dropped
        .edit_text(|text| text.insert_text(0, "still editable "))
        .unwrap();
    assert_eq!(count.get(), 1);
}

#[test]
fn index_lookup_tracks_a_long_edit_sequence() {
    let (mut doc, _) = document(&["0", "1", "2", "3", "4", "5"]);

    // Deterministic shuffle of inserts, deletes and moves.
    let mut seed = 7usize;
    for step in 0..60 {
        seed = (seed * 31 + 17) % 101;
        let len = doc.len();
        match step % 3 {
            0 => doc
                .insert_node_at(seed % (len + 1), DocumentNode::paragraph("new"))
                .unwrap(),
            1 if len > 2 => {
                doc.delete_node_at(seed % len).unwrap();
            }
            _ => {
                let id = doc.get_node_at(seed % len).map(DocumentNode::id).unwrap();
                doc.move_node(id, (seed / 3) % len).unwrap();
            }
        }

        for (index, node) in doc.nodes().iter().enumerate() {
            assert_eq!(doc.get_node_index_by_id(node.id()), Some(index));
        }
    }
    assert_eq!(doc.get_node_index_by_id(NodeId::new()), None);
}

#[test]
fn nodes_inside_ignores_argument_order() {
    let (doc, ids) = document(&["a", "b", "c", "d", "e"]);
    let a = DocumentPosition::text(ids[3], 1);
    let b = DocumentPosition::before(ids[1]);

    let forward: Vec<NodeId> = doc.get_nodes_inside(&a, &b).unwrap().iter().map(DocumentNode::id).collect();
    let backward: Vec<NodeId> = doc.get_nodes_inside(&b, &a).unwrap().iter().map(DocumentNode::id).collect();
    assert_eq!(forward, backward);
    assert_eq!(forward, ids[1..=3].to_vec());
}

#[test]
fn documents_with_different_ids_are_equivalent() {
    let (a, _) = document(&["same", "content"]);
    let (b, _) = document(&["same", "content"]);
    assert!(a.has_equivalent_content(&b));

    let (mut c, ids) = document(&["same", "content"]);
    c.execute(&Cmd::InsertText {
        position: DocumentPosition::text(ids[1], 0),
        text: "other ".to_string(),
        attributions: None,
    })
    .unwrap();
    assert!(!a.has_equivalent_content(&c));
}

#[test]
fn range_normalizes_to_document_order() {
    let (doc, ids) = document(&["ab", "cd"]);
    let late = DocumentPosition::text(ids[1], 1);
    let early = DocumentPosition::text(ids[0], 2);
    let range = DocumentRange::new(late, early).normalize(&doc).unwrap();
    assert_eq!(range, DocumentRange::new(early, late));
}

#[test]
fn out_of_range_insert_is_rejected_by_default() {
    let (mut doc, _) = document(&["a"]);
    assert_eq!(
        doc.insert_node_at(3, DocumentNode::paragraph("b")),
        Err(DocumentError::IndexOutOfBounds { index: 3, len: 1 })
    );

    let mut clamping = Document::with_config(DocumentConfig {
        insert_policy: InsertPolicy::Clamp,
    });
    clamping.insert_node_at(3, DocumentNode::paragraph("b")).unwrap();
    assert_eq!(texts(&clamping), vec!["b"]);
}

#[test]
fn typing_then_splitting_then_backspacing() {
    let (mut doc, ids) = document(&["Hello world"]);
    let new_id = NodeId::new();

    doc.execute(&Cmd::SplitParagraph {
        position: DocumentPosition::text(ids[0], 5),
        new_node_id: new_id,
    })
    .unwrap();
    assert_eq!(texts(&doc), vec!["Hello", " world"]);

    let patch = doc
        .execute(&Cmd::DeleteUpstream {
            position: DocumentPosition::text(new_id, 0),
        })
        .unwrap();
    assert_eq!(texts(&doc), vec!["Hello world"]);
    assert_eq!(patch.removed, vec![new_id]);
    assert_eq!(patch.new_selection, Some(DocumentPosition::text(ids[0], 5)));
    assert_eq!(doc.version(), 2);
}
