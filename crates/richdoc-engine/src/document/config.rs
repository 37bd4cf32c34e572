use serde::{Deserialize, Serialize};

/// What `insert_node_at` does with an index past the end of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPolicy {
    /// Fail with `DocumentError::IndexOutOfBounds`.
    #[default]
    Reject,
    /// Append at the end.
    Clamp,
}

/// Behaviour switches for a [`Document`](crate::document::Document).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub insert_policy: InsertPolicy,
}
