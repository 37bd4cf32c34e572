use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use xi_rope::Rope;
use xi_rope::delta::Builder;
use xi_rope::rope::{BaseMetric, Utf16CodeUnitsMetric};

use crate::error::TextError;
use crate::text::attribution::{Attribution, AttributionSet, AttributionSpan};
use crate::text::offsets;
use crate::text::segments::Segments;
use crate::text::spans::AttributionSpans;

/// A text buffer together with the attribution spans laid over it.
///
/// ## Offsets
///
/// Offsets are UTF-16 code units (see [`crate::text::offsets`]). The buffer
/// itself is an `xi_rope::Rope` addressed in bytes; every public method
/// translates through the rope's UTF-16 metric, and rejects offsets that
/// would split a surrogate pair.
///
/// ## Span behaviour under edits
///
/// - [`insert_text`](Self::insert_text) inserts plain text. A span that
///   strictly contains the insertion point grows over the new text; a span
///   ending exactly at it does not.
/// - [`insert_attributed_text`](Self::insert_attributed_text) inserts text
///   carrying its own spans. Spans around the insertion point are split so
///   the inserted run has exactly its own attributions, which then coalesce
///   with equal neighbours.
/// - [`append_attributed_text`](Self::append_attributed_text) concatenates,
///   coalescing at the seam.
#[derive(Clone, Serialize, Deserialize)]
#[serde(into = "AttributedTextData", try_from = "AttributedTextData")]
pub struct AttributedText {
    text: Rope,
    spans: AttributionSpans,
}

/// One render segment, mapped through a caller-supplied style function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSegment<S> {
    pub range: Range<usize>,
    pub text: String,
    pub style: S,
}

impl AttributedText {
    pub fn new(text: &str) -> Self {
        Self {
            text: Rope::from(text),
            spans: AttributionSpans::new(offsets::len_utf16(text)),
        }
    }

    /// Creates attributed text with initial spans, validating each one.
    pub fn with_spans(
        text: &str,
        spans: impl IntoIterator<Item = AttributionSpan>,
    ) -> Result<Self, TextError> {
        let mut attributed = Self::new(text);
        for span in spans {
            let (attribution, range) = span.into_parts();
            attributed.add_attribution(attribution, range)?;
        }
        Ok(attributed)
    }

    pub fn text(&self) -> String {
        self.text.to_string()
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.spans.text_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn spans(&self) -> &AttributionSpans {
        &self.spans
    }

    pub fn add_attribution(
        &mut self,
        attribution: Attribution,
        range: Range<usize>,
    ) -> Result<(), TextError> {
        self.byte_range(&range)?;
        self.spans.add_attribution(attribution, range)
    }

    pub fn remove_attribution(
        &mut self,
        attribution: &Attribution,
        range: Range<usize>,
    ) -> Result<(), TextError> {
        self.byte_range(&range)?;
        self.spans.remove_attribution(attribution, range)
    }

    pub fn attributions_at(&self, offset: usize) -> Result<AttributionSet<'_>, TextError> {
        self.spans.attributions_at(offset)
    }

    /// Returns `true` when every character in the non-empty `range` carries
    /// `attribution`.
    pub fn covers(&self, attribution: &Attribution, range: Range<usize>) -> bool {
        self.spans.covers(attribution, range)
    }

    pub fn segments(&self) -> Segments<'_> {
        self.spans.segments()
    }

    /// Maps every segment through `style_fn`, called once per segment.
    ///
    /// Adjacent segments always differ in attribution set, so as long as the
    /// style is a pure function of the set the result needs no further
    /// merging.
    pub fn styled_segments<S>(
        &self,
        style_fn: impl Fn(&AttributionSet<'_>) -> S,
    ) -> Vec<StyledSegment<S>> {
        self.segments()
            .map(|segment| {
                let bytes = self.to_byte(segment.range.start)..self.to_byte(segment.range.end);
                StyledSegment {
                    style: style_fn(&segment.attributions),
                    text: self.text.slice_to_cow(bytes).into_owned(),
                    range: segment.range,
                }
            })
            .collect()
    }

    /// Inserts plain text at `offset`.
    pub fn insert_text(&mut self, offset: usize, text: &str) -> Result<(), TextError> {
        let byte = self.byte_offset(offset)?;
        self.splice_rope(byte..byte, Rope::from(text));
        self.spans.shift_for_insertion(offset, offsets::len_utf16(text))
    }

    /// Inserts `other` at `offset`, keeping exactly its attributions on the
    /// inserted run.
    pub fn insert_attributed_text(
        &mut self,
        offset: usize,
        other: &AttributedText,
    ) -> Result<(), TextError> {
        let byte = self.byte_offset(offset)?;
        self.splice_rope(byte..byte, other.text.clone());
        self.spans.splice(offset, &other.spans)
    }

    pub fn delete_range(&mut self, range: Range<usize>) -> Result<(), TextError> {
        let bytes = self.byte_range(&range)?;
        if bytes.is_empty() {
            return Ok(());
        }
        let mut builder = Builder::new(self.text.len());
        builder.delete(bytes);
        self.text = builder.build().apply(&self.text);
        self.spans.shift_for_deletion(range.start, range.end)
    }

    /// A new attributed text holding the text and truncated spans of
    /// `range`, rebased to start at zero.
    pub fn copy_range(&self, range: Range<usize>) -> Result<AttributedText, TextError> {
        let bytes = self.byte_range(&range)?;
        Ok(Self {
            text: self.text.subseq(bytes),
            spans: self.spans.slice(range)?,
        })
    }

    pub fn append_attributed_text(&mut self, other: &AttributedText) {
        let end = self.text.len();
        self.splice_rope(end..end, other.text.clone());
        self.spans.append(&other.spans);
    }

    /// Splits at `offset`, keeping the head and returning the tail.
    pub fn split_off(&mut self, offset: usize) -> Result<AttributedText, TextError> {
        let tail = self.copy_range(offset..self.len())?;
        self.delete_range(offset..self.len())?;
        Ok(tail)
    }

    pub fn previous_character_boundary(
        &self,
        offset: usize,
        count: usize,
    ) -> Result<Option<usize>, TextError> {
        offsets::previous_character_boundary(&self.as_str(), offset, count)
    }

    pub fn next_character_boundary(
        &self,
        offset: usize,
        count: usize,
    ) -> Result<Option<usize>, TextError> {
        offsets::next_character_boundary(&self.as_str(), offset, count)
    }

    pub fn previous_word_boundary(&self, offset: usize) -> Result<Option<usize>, TextError> {
        offsets::previous_word_boundary(&self.as_str(), offset)
    }

    pub fn next_word_boundary(&self, offset: usize) -> Result<Option<usize>, TextError> {
        offsets::next_word_boundary(&self.as_str(), offset)
    }

    fn splice_rope(&mut self, bytes: Range<usize>, inserted: Rope) {
        let mut builder = Builder::new(self.text.len());
        builder.replace(bytes, inserted);
        self.text = builder.build().apply(&self.text);
    }

    /// The whole text, borrowed when the rope is a single leaf.
    fn as_str(&self) -> Cow<'_, str> {
        self.text.slice_to_cow(0..self.text.len())
    }

    /// Byte index of a UTF-16 offset known to be a valid boundary.
    fn to_byte(&self, offset: usize) -> usize {
        self.text
            .convert_metrics::<Utf16CodeUnitsMetric, BaseMetric>(offset)
    }

    fn byte_offset(&self, offset: usize) -> Result<usize, TextError> {
        let len = self.len();
        if offset > len {
            return Err(TextError::OffsetOutOfRange { offset, len });
        }
        let byte = self.to_byte(offset);
        // An offset inside a surrogate pair does not survive the round trip.
        if self
            .text
            .convert_metrics::<BaseMetric, Utf16CodeUnitsMetric>(byte)
            != offset
        {
            return Err(TextError::NotOnCharBoundary { offset });
        }
        Ok(byte)
    }

    fn byte_range(&self, range: &Range<usize>) -> Result<Range<usize>, TextError> {
        if range.start > range.end {
            return Err(TextError::MalformedRange {
                start: range.start,
                end: range.end,
            });
        }
        if range.end > self.len() {
            return Err(TextError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len: self.len(),
            });
        }
        Ok(self.byte_offset(range.start)?..self.byte_offset(range.end)?)
    }
}

impl Default for AttributedText {
    fn default() -> Self {
        Self::new("")
    }
}

impl From<&str> for AttributedText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl PartialEq for AttributedText {
    fn eq(&self, other: &Self) -> bool {
        self.spans == other.spans && self.text() == other.text()
    }
}

impl Eq for AttributedText {}

impl fmt::Debug for AttributedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributedText")
            .field("text", &self.text())
            .field("spans", &self.spans.spans().collect::<Vec<_>>())
            .finish()
    }
}

/// Plain-data form used for serialisation.
#[derive(Serialize, Deserialize)]
struct AttributedTextData {
    text: String,
    #[serde(default)]
    spans: Vec<AttributionSpan>,
}

impl From<AttributedText> for AttributedTextData {
    fn from(attributed: AttributedText) -> Self {
        Self {
            text: attributed.text(),
            spans: attributed.spans.spans().collect(),
        }
    }
}

impl TryFrom<AttributedTextData> for AttributedText {
    type Error = TextError;

    fn try_from(data: AttributedTextData) -> Result<Self, Self::Error> {
        AttributedText::with_spans(&data.text, data.spans)
    }
}
