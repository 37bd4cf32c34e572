//! The attribution span engine.
//!
//! [`AttributionSpans`] maps each attribution to the character ranges it
//! covers within one text buffer. Ranges are closed-open. For every
//! attribution the ranges are kept sorted, disjoint, non-adjacent and
//! non-empty, so any edit that would make two ranges of the same attribution
//! touch merges them into one.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::TextError;
use crate::text::attribution::{Attribution, AttributionSet, AttributionSpan};
use crate::text::segments::Segments;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributionSpans {
    /// Length of the text the ranges are scoped to, in UTF-16 code units.
    len: usize,
    ranges: BTreeMap<Attribution, Vec<Range<usize>>>,
}

impl AttributionSpans {
    /// Creates an engine with no attributions for a text of `len` units.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            ranges: BTreeMap::new(),
        }
    }

    pub fn text_len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no attribution is applied anywhere.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Marks `attribution` present over `range`, coalescing with any
    /// overlapping or adjacent range of the same attribution.
    pub fn add_attribution(
        &mut self,
        attribution: Attribution,
        range: Range<usize>,
    ) -> Result<(), TextError> {
        self.check_range(&range)?;
        self.merge_range(attribution, range);
        Ok(())
    }

    /// Clears `attribution` over `range`, splitting ranges that only
    /// partially overlap it.
    pub fn remove_attribution(
        &mut self,
        attribution: &Attribution,
        range: Range<usize>,
    ) -> Result<(), TextError> {
        self.check_range(&range)?;
        if range.is_empty() {
            return Ok(());
        }
        let Some(ranges) = self.ranges.get_mut(attribution) else {
            return Ok(());
        };
        let first = ranges.partition_point(|r| r.end <= range.start);
        let last = ranges.partition_point(|r| r.start < range.end);
        if first >= last {
            return Ok(());
        }

        let mut remaining = Vec::with_capacity(2);
        if ranges[first].start < range.start {
            remaining.push(ranges[first].start..range.start);
        }
        if ranges[last - 1].end > range.end {
            remaining.push(range.end..ranges[last - 1].end);
        }
        ranges.splice(first..last, remaining);

        if ranges.is_empty() {
            self.ranges.remove(attribution);
        }
        Ok(())
    }

    /// Clears every attribution over `range`.
    pub fn remove_all(&mut self, range: Range<usize>) -> Result<(), TextError> {
        self.check_range(&range)?;
        let attributions: Vec<Attribution> = self.ranges.keys().cloned().collect();
        for attribution in &attributions {
            self.remove_attribution(attribution, range.clone())?;
        }
        Ok(())
    }

    /// The attributions whose range contains `offset` (`start <= offset < end`).
    pub fn attributions_at(&self, offset: usize) -> Result<AttributionSet<'_>, TextError> {
        if offset > self.len {
            return Err(TextError::OffsetOutOfRange {
                offset,
                len: self.len,
            });
        }
        Ok(self
            .ranges
            .iter()
            .filter(|(_, ranges)| {
                let index = ranges.partition_point(|r| r.end <= offset);
                ranges.get(index).is_some_and(|r| r.start <= offset)
            })
            .map(|(attribution, _)| attribution)
            .collect())
    }

    /// Returns `true` when `attribution` is present over the whole of a
    /// non-empty `range`.
    pub fn covers(&self, attribution: &Attribution, range: Range<usize>) -> bool {
        if range.is_empty() {
            return false;
        }
        let ranges = self.ranges(attribution);
        let index = ranges.partition_point(|r| r.end < range.end);
        ranges
            .get(index)
            .is_some_and(|r| r.start <= range.start && range.end <= r.end)
    }

    /// The ranges covered by `attribution`, sorted.
    pub fn ranges(&self, attribution: &Attribution) -> &[Range<usize>] {
        self.ranges.get(attribution).map_or(&[], Vec::as_slice)
    }

    /// Every attribution present somewhere in the text.
    pub fn attributions(&self) -> impl Iterator<Item = &Attribution> {
        self.ranges.keys()
    }

    /// All spans as plain data, grouped by attribution.
    pub fn spans(&self) -> impl Iterator<Item = AttributionSpan> + '_ {
        self.ranges.iter().flat_map(|(attribution, ranges)| {
            ranges
                .iter()
                .map(move |r| AttributionSpan::from_range(attribution.clone(), r.clone()))
        })
    }

    /// The non-overlapping segments of constant attribution set covering the
    /// whole text. Calling this again restarts the projection.
    pub fn segments(&self) -> Segments<'_> {
        Segments::new(self.len, &self.ranges)
    }

    /// Adjusts the ranges for `length` units of text inserted at `at`.
    ///
    /// Ranges starting at or after `at` move; a range strictly containing
    /// `at` grows to cover the inserted text. A range ending at `at` is left
    /// alone, since the text after it was never covered.
    pub fn shift_for_insertion(&mut self, at: usize, length: usize) -> Result<(), TextError> {
        if at > self.len {
            return Err(TextError::OffsetOutOfRange {
                offset: at,
                len: self.len,
            });
        }
        for ranges in self.ranges.values_mut() {
            for range in ranges.iter_mut() {
                if range.start >= at {
                    range.start += length;
                    range.end += length;
                } else if range.end > at {
                    range.end += length;
                }
            }
        }
        self.len += length;
        Ok(())
    }

    /// Adjusts the ranges for the text in `start..end` having been removed.
    pub fn shift_for_deletion(&mut self, start: usize, end: usize) -> Result<(), TextError> {
        self.check_range(&(start..end))?;
        let removed = end - start;
        let map = |offset: usize| {
            if offset <= start {
                offset
            } else if offset >= end {
                offset - removed
            } else {
                start
            }
        };

        for ranges in self.ranges.values_mut() {
            let mut shifted: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
            for range in ranges.drain(..) {
                let (new_start, new_end) = (map(range.start), map(range.end));
                if new_start == new_end {
                    continue;
                }
                match shifted.last_mut() {
                    Some(previous) if previous.end >= new_start => {
                        previous.end = previous.end.max(new_end);
                    }
                    _ => shifted.push(new_start..new_end),
                }
            }
            *ranges = shifted;
        }
        self.ranges.retain(|_, ranges| !ranges.is_empty());
        self.len -= removed;
        Ok(())
    }

    /// Shifts for an insertion at `at` and gives the inserted run exactly the
    /// attributions in `inserted`, splitting any range that straddled `at`.
    pub fn splice(&mut self, at: usize, inserted: &AttributionSpans) -> Result<(), TextError> {
        self.shift_for_insertion(at, inserted.len)?;
        self.remove_all(at..at + inserted.len)?;
        for (attribution, ranges) in &inserted.ranges {
            for range in ranges {
                self.merge_range(attribution.clone(), range.start + at..range.end + at);
            }
        }
        Ok(())
    }

    /// A new engine for the sub-range `range`, offsets rebased to zero.
    pub fn slice(&self, range: Range<usize>) -> Result<AttributionSpans, TextError> {
        self.check_range(&range)?;
        let mut sliced = AttributionSpans::new(range.len());
        for (attribution, ranges) in &self.ranges {
            let clipped: Vec<Range<usize>> = ranges
                .iter()
                .filter(|r| r.end > range.start && r.start < range.end)
                .map(|r| r.start.max(range.start) - range.start..r.end.min(range.end) - range.start)
                .collect();
            if !clipped.is_empty() {
                sliced.ranges.insert(attribution.clone(), clipped);
            }
        }
        Ok(sliced)
    }

    /// Appends the spans of a following text, coalescing at the seam.
    pub fn append(&mut self, other: &AttributionSpans) {
        let offset = self.len;
        self.len += other.len;
        for (attribution, ranges) in &other.ranges {
            for range in ranges {
                self.merge_range(attribution.clone(), range.start + offset..range.end + offset);
            }
        }
    }

    /// Removes every attribution, keeping the text length.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), TextError> {
        if range.start > range.end {
            return Err(TextError::MalformedRange {
                start: range.start,
                end: range.end,
            });
        }
        if range.end > self.len {
            return Err(TextError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len: self.len,
            });
        }
        Ok(())
    }

    fn merge_range(&mut self, attribution: Attribution, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        let ranges = self.ranges.entry(attribution).or_default();
        let first = ranges.partition_point(|r| r.end < range.start);
        let last = ranges.partition_point(|r| r.start <= range.end);
        let mut merged = range;
        if first < last {
            merged.start = merged.start.min(ranges[first].start);
            merged.end = merged.end.max(ranges[last - 1].end);
        }
        ranges.splice(first..last, std::iter::once(merged));
    }
}
