use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::document::{Document, NodeId};
use crate::error::DocumentError;

/// Which side of an offset a caret leans to, for offsets shared by two
/// characters (line wraps, attribution edges).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAffinity {
    Upstream,
    #[default]
    Downstream,
}

/// A position local to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodePosition {
    /// Before the whole node. The only positions non-text nodes have.
    Before,
    Text {
        offset: usize,
        #[serde(default)]
        affinity: TextAffinity,
    },
    /// After the whole node.
    After,
}

impl NodePosition {
    pub fn text(offset: usize) -> Self {
        Self::Text {
            offset,
            affinity: TextAffinity::Downstream,
        }
    }

    pub fn text_offset(&self) -> Option<usize> {
        match self {
            Self::Text { offset, .. } => Some(*offset),
            Self::Before | Self::After => None,
        }
    }

    /// Orders two positions inside the same node.
    pub fn cmp_within(&self, other: &NodePosition) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }

    fn sort_key(&self) -> (u8, usize, u8) {
        match self {
            Self::Before => (0, 0, 0),
            Self::Text { offset, affinity } => {
                (1, *offset, u8::from(*affinity == TextAffinity::Downstream))
            }
            Self::After => (2, 0, 0),
        }
    }
}

/// A weak reference to a location in a document: a node id plus a position
/// inside that node. The node may no longer exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPosition {
    pub node_id: NodeId,
    pub node_position: NodePosition,
}

impl DocumentPosition {
    pub fn new(node_id: NodeId, node_position: NodePosition) -> Self {
        Self {
            node_id,
            node_position,
        }
    }

    pub fn text(node_id: NodeId, offset: usize) -> Self {
        Self::new(node_id, NodePosition::text(offset))
    }

    pub fn before(node_id: NodeId) -> Self {
        Self::new(node_id, NodePosition::Before)
    }

    pub fn after(node_id: NodeId) -> Self {
        Self::new(node_id, NodePosition::After)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRange {
    pub start: DocumentPosition,
    pub end: DocumentPosition,
}

impl DocumentRange {
    pub fn new(start: DocumentPosition, end: DocumentPosition) -> Self {
        Self { start, end }
    }

    pub fn collapsed(position: DocumentPosition) -> Self {
        Self::new(position, position)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// The same range with `start` before or equal to `end` in document
    /// order.
    pub fn normalize(&self, document: &Document) -> Result<DocumentRange, DocumentError> {
        Ok(match document.compare_positions(&self.start, &self.end)? {
            Ordering::Greater => Self::new(self.end, self.start),
            Ordering::Less | Ordering::Equal => *self,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(NodePosition::Before, NodePosition::text(0), Ordering::Less)]
    #[case(NodePosition::text(3), NodePosition::text(1), Ordering::Greater)]
    #[case(NodePosition::text(9), NodePosition::After, Ordering::Less)]
    #[case(
        NodePosition::Text { offset: 2, affinity: TextAffinity::Upstream },
        NodePosition::Text { offset: 2, affinity: TextAffinity::Downstream },
        Ordering::Less
    )]
    #[case(NodePosition::After, NodePosition::After, Ordering::Equal)]
    fn positions_order_within_a_node(
        #[case] a: NodePosition,
        #[case] b: NodePosition,
        #[case] expected: Ordering,
    ) {
        assert_eq!(a.cmp_within(&b), expected);
        assert_eq!(b.cmp_within(&a), expected.reverse());
    }

    #[test]
    fn text_offsets() {
        assert_eq!(NodePosition::text(4).text_offset(), Some(4));
        assert_eq!(NodePosition::Before.text_offset(), None);
    }

    #[test]
    fn collapsed_range() {
        let id = NodeId::new();
        assert!(DocumentRange::collapsed(DocumentPosition::text(id, 1)).is_collapsed());
        assert!(
            !DocumentRange::new(DocumentPosition::before(id), DocumentPosition::after(id))
                .is_collapsed()
        );
    }
}
