use crate::document::{DocumentPosition, NodeId};

/// Result of executing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Nodes inserted or edited by the command that are still in the document
    pub changed: Vec<NodeId>,
    /// Nodes the command removed
    pub removed: Vec<NodeId>,
    /// Where the caret should go, when the command has an opinion
    pub new_selection: Option<DocumentPosition>,
    /// Document version after the command
    pub version: u64,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}
