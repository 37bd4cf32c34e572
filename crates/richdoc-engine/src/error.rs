use crate::document::{DocumentPosition, NodeId};

/// Failures of offset navigation and attributed-text range operations.
///
/// Offsets are never clamped: a bad offset is a bug in the caller and is
/// reported as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    #[error("offset {offset} out of range for text of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },
    #[error("offset {offset} is not on a character boundary")]
    NotOnCharBoundary { offset: usize },
    #[error("invalid range {start}..{end}: start > end")]
    MalformedRange { start: usize, end: usize },
    #[error("range {start}..{end} out of bounds for length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },
}

/// Failures of node store queries, structural edits and commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("no node with id {0}")]
    NodeNotFound(NodeId),
    #[error("index {index} out of bounds for document with {len} nodes")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("a node with id {0} is already in the document")]
    DuplicateNodeId(NodeId),
    #[error("node {0} does not hold text")]
    NotATextNode(NodeId),
    #[error("position {0:?} does not fit its node")]
    InvalidPosition(DocumentPosition),
    #[error(transparent)]
    Text(#[from] TextError),
}
