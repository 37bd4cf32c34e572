use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::TextError;

/// A rich-text property that can be applied to a range of text.
///
/// Attributions are plain values: two attributions are the same attribution
/// exactly when their variant and parameters are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Attribution {
    Bold,
    Italics,
    Underline,
    Strikethrough,
    Code,
    Link { url: String },
    Custom { name: String, value: Option<String> },
}

impl Attribution {
    pub fn link(url: impl Into<String>) -> Self {
        Self::Link { url: url.into() }
    }

    pub fn custom(name: impl Into<String>, value: Option<String>) -> Self {
        Self::Custom {
            name: name.into(),
            value,
        }
    }

    /// The tag name, without parameters.
    pub fn name(&self) -> &str {
        match self {
            Self::Bold => "bold",
            Self::Italics => "italics",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
            Self::Code => "code",
            Self::Link { .. } => "link",
            Self::Custom { name, .. } => name,
        }
    }
}

impl fmt::Display for Attribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link { url } => write!(f, "link:{url}"),
            Self::Custom {
                name,
                value: Some(value),
            } => write!(f, "{name}:{value}"),
            other => f.write_str(other.name()),
        }
    }
}

/// The attributions active over one stretch of text, in a stable order.
pub type AttributionSet<'a> = BTreeSet<&'a Attribution>;

/// One attribution applied over the closed-open range `start..end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributionSpan {
    attribution: Attribution,
    start: usize,
    end: usize,
}

impl AttributionSpan {
    pub fn new(attribution: Attribution, start: usize, end: usize) -> Result<Self, TextError> {
        if start > end {
            return Err(TextError::MalformedRange { start, end });
        }
        Ok(Self {
            attribution,
            start,
            end,
        })
    }

    pub(crate) fn from_range(attribution: Attribution, range: Range<usize>) -> Self {
        debug_assert!(range.start <= range.end);
        Self {
            attribution,
            start: range.start,
            end: range.end,
        }
    }

    pub fn attribution(&self) -> &Attribution {
        &self.attribution
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub(crate) fn into_parts(self) -> (Attribution, Range<usize>) {
        (self.attribution, self.start..self.end)
    }
}
