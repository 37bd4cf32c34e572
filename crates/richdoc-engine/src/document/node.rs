use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::observers::{Listeners, SubscriptionId};
use crate::error::DocumentError;
use crate::text::AttributedText;

/// Stable identity of a node, unique within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// A fresh random (v4) id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How a text block is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    #[default]
    Paragraph,
    Heading(u8),
    Blockquote,
    CodeBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListItemKind {
    Ordered,
    Unordered,
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeContent {
    Paragraph {
        text: AttributedText,
        #[serde(default)]
        block_type: BlockType,
    },
    ListItem {
        item_kind: ListItemKind,
        #[serde(default)]
        indent: usize,
        text: AttributedText,
    },
    HorizontalRule,
    Image {
        url: String,
        #[serde(default)]
        alt_text: String,
    },
}

impl NodeContent {
    pub fn paragraph(text: impl Into<AttributedText>) -> Self {
        Self::Paragraph {
            text: text.into(),
            block_type: BlockType::Paragraph,
        }
    }

    pub fn heading(level: u8, text: impl Into<AttributedText>) -> Self {
        Self::Paragraph {
            text: text.into(),
            block_type: BlockType::Heading(level),
        }
    }

    pub fn list_item(item_kind: ListItemKind, text: impl Into<AttributedText>) -> Self {
        Self::ListItem {
            item_kind,
            indent: 0,
            text: text.into(),
        }
    }

    pub fn image(url: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self::Image {
            url: url.into(),
            alt_text: alt_text.into(),
        }
    }

    /// The text of a text-bearing node.
    pub fn text(&self) -> Option<&AttributedText> {
        match self {
            Self::Paragraph { text, .. } | Self::ListItem { text, .. } => Some(text),
            Self::HorizontalRule | Self::Image { .. } => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut AttributedText> {
        match self {
            Self::Paragraph { text, .. } | Self::ListItem { text, .. } => Some(text),
            Self::HorizontalRule | Self::Image { .. } => None,
        }
    }

    /// Content for the node created when this one is split, holding `text`.
    ///
    /// List items continue as list items at the same indent; headings are
    /// followed by a plain paragraph.
    pub fn continuation(&self, text: AttributedText) -> Option<NodeContent> {
        match self {
            Self::Paragraph {
                block_type: BlockType::Heading(_),
                ..
            } => Some(Self::paragraph(text)),
            Self::Paragraph { block_type, .. } => Some(Self::Paragraph {
                text,
                block_type: *block_type,
            }),
            Self::ListItem {
                item_kind, indent, ..
            } => Some(Self::ListItem {
                item_kind: *item_kind,
                indent: *indent,
                text,
            }),
            Self::HorizontalRule | Self::Image { .. } => None,
        }
    }
}

/// One block of the document.
///
/// Content equivalence ignores the id. A node carries its own listener list;
/// [`edit`](Self::edit) and [`edit_text`](Self::edit_text) fire it after
/// mutating the content in place. Cloning a node copies id and content but
/// not listeners.
pub struct DocumentNode {
    id: NodeId,
    content: NodeContent,
    listeners: Listeners,
    /// The owning store's forwarder, while the node is in a store.
    pub(crate) forwarder_subscription: Option<SubscriptionId>,
}

impl DocumentNode {
    pub fn new(content: NodeContent) -> Self {
        Self::with_id(NodeId::new(), content)
    }

    pub fn with_id(id: NodeId, content: NodeContent) -> Self {
        Self {
            id,
            content,
            listeners: Listeners::default(),
            forwarder_subscription: None,
        }
    }

    pub fn paragraph(text: impl Into<AttributedText>) -> Self {
        Self::new(NodeContent::paragraph(text))
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    pub fn text(&self) -> Option<&AttributedText> {
        self.content.text()
    }

    pub fn has_equivalent_content(&self, other: &DocumentNode) -> bool {
        self.content == other.content
    }

    /// Mutates the content and notifies this node's listeners.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut NodeContent) -> R) -> R {
        let result = f(&mut self.content);
        self.listeners.notify();
        result
    }

    /// Mutates the text of a text-bearing node. Listeners are notified only
    /// when `f` succeeds.
    pub fn edit_text<R, E>(
        &mut self,
        f: impl FnOnce(&mut AttributedText) -> Result<R, E>,
    ) -> Result<R, DocumentError>
    where
        DocumentError: From<E>,
    {
        let id = self.id;
        let text = self
            .content
            .text_mut()
            .ok_or(DocumentError::NotATextNode(id))?;
        let result = f(text)?;
        self.listeners.notify();
        Ok(result)
    }

    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Content access that does not notify; pair with [`notify`](Self::notify).
    pub(crate) fn content_mut(&mut self) -> &mut NodeContent {
        &mut self.content
    }

    pub(crate) fn notify(&mut self) {
        self.listeners.notify();
    }

    /// Swaps the content without notifying.
    pub(crate) fn replace_content(&mut self, content: NodeContent) -> NodeContent {
        std::mem::replace(&mut self.content, content)
    }
}

impl Clone for DocumentNode {
    fn clone(&self) -> Self {
        Self::with_id(self.id, self.content.clone())
    }
}

impl fmt::Debug for DocumentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentNode")
            .field("id", &self.id)
            .field("content", &self.content)
            .finish()
    }
}
