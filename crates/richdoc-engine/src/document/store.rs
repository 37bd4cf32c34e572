use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use log::{debug, trace};

use crate::document::config::{DocumentConfig, InsertPolicy};
use crate::document::node::{DocumentNode, NodeId};
use crate::document::observers::{ChangeHub, SubscriptionId};
use crate::document::position::{DocumentPosition, NodePosition};
use crate::editing::{EditCommand, Patch};
use crate::error::{DocumentError, TextError};
use crate::text::offsets;

/// The ordered node store.
///
/// ## Identity lookup
///
/// `id -> index` lookups go through a cache that is rebuilt lazily on the
/// first lookup after a structural change and cleared wholesale by every
/// structural change. Lookups are O(1) amortised; the first one after an
/// edit is O(n).
///
/// ## Change notification
///
/// Every structural operation fires exactly one notification to the
/// observers registered with [`subscribe`](Self::subscribe). Each node in the
/// store has a forwarder subscribed on it, so editing a node's content in
/// place (through [`node_mut`](Self::node_mut) and
/// [`DocumentNode::edit`]) notifies too. Removing a node unsubscribes its
/// forwarder.
///
/// Multi-step edits should go through [`execute`](Self::execute), which
/// delivers a single notification per command.
pub struct Document {
    nodes: Vec<DocumentNode>,
    index_cache: RefCell<Option<HashMap<NodeId, usize>>>,
    hub: ChangeHub,
    config: DocumentConfig,
}

impl Document {
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    pub fn with_config(config: DocumentConfig) -> Self {
        Self {
            nodes: Vec::new(),
            index_cache: RefCell::new(None),
            hub: ChangeHub::default(),
            config,
        }
    }

    /// Builds a document from `nodes` in order, without notifying.
    pub fn from_nodes(nodes: impl IntoIterator<Item = DocumentNode>) -> Result<Self, DocumentError> {
        let mut document = Self::new();
        for node in nodes {
            let index = document.len();
            document.raw_insert(index, node)?;
        }
        Ok(document)
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[DocumentNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of change notifications delivered so far.
    pub fn version(&self) -> u64 {
        self.hub.version()
    }

    pub fn get_node_at(&self, index: usize) -> Option<&DocumentNode> {
        self.nodes.get(index)
    }

    pub fn get_node_index_by_id(&self, id: NodeId) -> Option<usize> {
        let mut cache = self.index_cache.borrow_mut();
        let index = cache.get_or_insert_with(|| {
            trace!("rebuilding node index cache ({} nodes)", self.nodes.len());
            self.nodes
                .iter()
                .enumerate()
                .map(|(index, node)| (node.id(), index))
                .collect()
        });
        index.get(&id).copied()
    }

    pub fn get_node_by_id(&self, id: NodeId) -> Option<&DocumentNode> {
        self.get_node_index_by_id(id).map(|index| &self.nodes[index])
    }

    /// Mutable access for in-place content edits.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut DocumentNode> {
        let index = self.get_node_index_by_id(id)?;
        self.nodes.get_mut(index)
    }

    pub fn get_node_before(&self, id: NodeId) -> Option<&DocumentNode> {
        let index = self.get_node_index_by_id(id)?;
        index.checked_sub(1).and_then(|before| self.nodes.get(before))
    }

    pub fn get_node_after(&self, id: NodeId) -> Option<&DocumentNode> {
        let index = self.get_node_index_by_id(id)?;
        self.nodes.get(index + 1)
    }

    pub fn first_node(&self) -> Option<&DocumentNode> {
        self.nodes.first()
    }

    pub fn last_node(&self) -> Option<&DocumentNode> {
        self.nodes.last()
    }

    /// Inserts `node` at `index`. An index past the end is handled according
    /// to the configured [`InsertPolicy`].
    pub fn insert_node_at(&mut self, index: usize, node: DocumentNode) -> Result<(), DocumentError> {
        let index = self.resolve_insert_index(index)?;
        let id = node.id();
        self.raw_insert(index, node)?;
        debug!("inserted node {id} at {index}");
        self.hub.changed();
        Ok(())
    }

    pub fn add_node(&mut self, node: DocumentNode) -> Result<(), DocumentError> {
        self.insert_node_at(self.len(), node)
    }

    pub fn insert_node_before(
        &mut self,
        existing: NodeId,
        node: DocumentNode,
    ) -> Result<(), DocumentError> {
        let index = self.index_of(existing)?;
        self.insert_node_at(index, node)
    }

    pub fn insert_node_after(
        &mut self,
        existing: NodeId,
        node: DocumentNode,
    ) -> Result<(), DocumentError> {
        let index = self.index_of(existing)?;
        self.insert_node_at(index + 1, node)
    }

    pub fn delete_node_at(&mut self, index: usize) -> Result<DocumentNode, DocumentError> {
        if index >= self.len() {
            return Err(DocumentError::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        let node = self.raw_remove(index);
        debug!("deleted node {} at {index}", node.id());
        self.hub.changed();
        Ok(node)
    }

    pub fn delete_node(&mut self, id: NodeId) -> Result<DocumentNode, DocumentError> {
        let index = self.index_of(id)?;
        self.delete_node_at(index)
    }

    /// Moves the node so that it ends up at `target_index`.
    ///
    /// Always notifies, even when the node is already there.
    pub fn move_node(&mut self, id: NodeId, target_index: usize) -> Result<(), DocumentError> {
        let from = self.index_of(id)?;
        self.check_index(target_index)?;
        self.raw_move(from, target_index);
        debug!("moved node {id} from {from} to {target_index}");
        self.hub.changed();
        Ok(())
    }

    /// Swaps the node `old` for `new` in place, returning the old node.
    pub fn replace_node(
        &mut self,
        old: NodeId,
        new: DocumentNode,
    ) -> Result<DocumentNode, DocumentError> {
        let index = self.index_of(old)?;
        let new_id = new.id();
        let replaced = self.raw_replace(index, new)?;
        debug!("replaced node {old} with {new_id} at {index}");
        self.hub.changed();
        Ok(replaced)
    }

    /// The nodes between the two positions, both ends included, regardless of
    /// which position comes first.
    pub fn get_nodes_inside(
        &self,
        a: &DocumentPosition,
        b: &DocumentPosition,
    ) -> Result<&[DocumentNode], DocumentError> {
        let a = self.index_of(a.node_id)?;
        let b = self.index_of(b.node_id)?;
        Ok(&self.nodes[a.min(b)..=a.max(b)])
    }

    /// Orders two positions in document order.
    pub fn compare_positions(
        &self,
        a: &DocumentPosition,
        b: &DocumentPosition,
    ) -> Result<Ordering, DocumentError> {
        let index_a = self.index_of(a.node_id)?;
        let index_b = self.index_of(b.node_id)?;
        Ok(index_a
            .cmp(&index_b)
            .then_with(|| a.node_position.cmp_within(&b.node_position)))
    }

    /// Checks that `position` names a node in this document and fits inside
    /// it, returning the node's index.
    pub fn resolve_position(&self, position: &DocumentPosition) -> Result<usize, DocumentError> {
        let index = self.index_of(position.node_id)?;
        if let NodePosition::Text { offset, .. } = position.node_position {
            let text = self.nodes[index]
                .text()
                .ok_or(DocumentError::InvalidPosition(*position))?;
            match offsets::utf16_to_byte(&text.text(), offset) {
                Ok(_) => {}
                Err(TextError::OffsetOutOfRange { .. }) => {
                    return Err(DocumentError::InvalidPosition(*position));
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(index)
    }

    /// Same node count and pairwise equivalent content, ignoring ids.
    pub fn has_equivalent_content(&self, other: &Document) -> bool {
        self.len() == other.len()
            && self
                .nodes
                .iter()
                .zip(&other.nodes)
                .all(|(a, b)| a.has_equivalent_content(b))
    }

    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> SubscriptionId {
        self.hub.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.hub.unsubscribe(id)
    }

    /// Runs `command` as one transaction.
    ///
    /// On success the observers are notified once (if anything changed) and
    /// the returned [`Patch`] lists what changed. On failure every sub-edit
    /// is undone, nobody is notified and the error is returned.
    pub fn execute<C: EditCommand + ?Sized>(&mut self, command: &C) -> Result<Patch, DocumentError> {
        crate::editing::transaction::execute(self, command)
    }

    pub(crate) fn hub(&self) -> &ChangeHub {
        &self.hub
    }

    pub(crate) fn index_of(&self, id: NodeId) -> Result<usize, DocumentError> {
        self.get_node_index_by_id(id).ok_or(DocumentError::NodeNotFound(id))
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<(), DocumentError> {
        if index < self.len() {
            Ok(())
        } else {
            Err(DocumentError::IndexOutOfBounds {
                index,
                len: self.len(),
            })
        }
    }

    pub(crate) fn resolve_insert_index(&self, index: usize) -> Result<usize, DocumentError> {
        let len = self.len();
        if index <= len {
            return Ok(index);
        }
        match self.config.insert_policy {
            InsertPolicy::Reject => Err(DocumentError::IndexOutOfBounds { index, len }),
            InsertPolicy::Clamp => {
                debug!("insert index {index} clamped to {len}");
                Ok(len)
            }
        }
    }

    /// Structural primitives shared with transactions. They keep the cache
    /// and forwarders right but never notify.
    pub(crate) fn raw_insert(
        &mut self,
        index: usize,
        mut node: DocumentNode,
    ) -> Result<(), DocumentError> {
        if self.get_node_index_by_id(node.id()).is_some() {
            return Err(DocumentError::DuplicateNodeId(node.id()));
        }
        if index > self.len() {
            return Err(DocumentError::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        self.attach(&mut node);
        self.nodes.insert(index, node);
        self.invalidate();
        Ok(())
    }

    pub(crate) fn raw_remove(&mut self, index: usize) -> DocumentNode {
        let mut node = self.nodes.remove(index);
        Self::detach(&mut node);
        self.invalidate();
        node
    }

    pub(crate) fn raw_move(&mut self, from: usize, to: usize) {
        let node = self.nodes.remove(from);
        self.nodes.insert(to, node);
        self.invalidate();
    }

    pub(crate) fn raw_replace(
        &mut self,
        index: usize,
        mut new: DocumentNode,
    ) -> Result<DocumentNode, DocumentError> {
        let old_id = self.nodes[index].id();
        if new.id() != old_id && self.get_node_index_by_id(new.id()).is_some() {
            return Err(DocumentError::DuplicateNodeId(new.id()));
        }
        self.attach(&mut new);
        let mut old = std::mem::replace(&mut self.nodes[index], new);
        Self::detach(&mut old);
        self.invalidate();
        Ok(old)
    }

    fn attach(&self, node: &mut DocumentNode) {
        let subscription = node.subscribe(self.hub.forwarder());
        node.forwarder_subscription = Some(subscription);
    }

    fn detach(node: &mut DocumentNode) {
        if let Some(subscription) = node.forwarder_subscription.take() {
            node.unsubscribe(subscription);
        }
    }

    fn invalidate(&mut self) {
        *self.index_cache.get_mut() = None;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes)
            .field("version", &self.version())
            .field("config", &self.config)
            .finish()
    }
}
