//! Projection of attribution spans into render segments.
//!
//! A segment is a maximal stretch of text over which the set of active
//! attributions does not change. The projection is a sweep over every span
//! start and end, sorted by offset, keeping a per-attribution counter of open
//! spans. It is computed lazily; calling [`AttributionSpans::segments`] again
//! (or cloning the iterator) restarts it.
//!
//! [`AttributionSpans::segments`]: crate::text::AttributionSpans::segments

use std::collections::BTreeMap;
use std::ops::Range;

use crate::text::attribution::{Attribution, AttributionSet};

/// One run of text with a constant attribution set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub range: Range<usize>,
    pub attributions: AttributionSet<'a>,
}

#[derive(Debug, Clone, Copy)]
struct Event<'a> {
    offset: usize,
    opens: bool,
    attribution: &'a Attribution,
}

/// Lazy iterator over the [`Segment`]s of one text.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    events: Vec<Event<'a>>,
    next_event: usize,
    open: BTreeMap<&'a Attribution, usize>,
    cursor: usize,
    len: usize,
}

impl<'a> Segments<'a> {
    pub(crate) fn new(len: usize, ranges: &'a BTreeMap<Attribution, Vec<Range<usize>>>) -> Self {
        let mut events: Vec<Event<'a>> = ranges
            .iter()
            .flat_map(|(attribution, ranges)| {
                ranges.iter().flat_map(move |r| {
                    [
                        Event {
                            offset: r.start,
                            opens: true,
                            attribution,
                        },
                        Event {
                            offset: r.end,
                            opens: false,
                            attribution,
                        },
                    ]
                })
            })
            .collect();
        events.sort_by_key(|event| event.offset);

        Self {
            events,
            next_event: 0,
            open: BTreeMap::new(),
            cursor: 0,
            len,
        }
    }

    /// Applies every event at or before `offset` that has not been applied.
    fn advance_to(&mut self, offset: usize) {
        while let Some(event) = self.events.get(self.next_event) {
            if event.offset > offset {
                break;
            }
            if event.opens {
                *self.open.entry(event.attribution).or_default() += 1;
            } else if let Some(count) = self.open.get_mut(event.attribution) {
                *count -= 1;
                if *count == 0 {
                    self.open.remove(event.attribution);
                }
            }
            self.next_event += 1;
        }
    }

    fn active(&self) -> AttributionSet<'a> {
        self.open.keys().copied().collect()
    }

    fn next_boundary(&self) -> usize {
        self.events
            .get(self.next_event)
            .map_or(self.len, |event| event.offset.min(self.len))
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }
        self.advance_to(self.cursor);
        let start = self.cursor;
        let attributions = self.active();

        loop {
            self.cursor = self.next_boundary();
            if self.cursor >= self.len {
                break;
            }
            self.advance_to(self.cursor);
            if self.active() != attributions {
                break;
            }
        }

        Some(Segment {
            range: start..self.cursor,
            attributions,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::text::{Attribution, AttributionSpans};
    use pretty_assertions::assert_eq;

    fn describe(spans: &AttributionSpans) -> Vec<(std::ops::Range<usize>, Vec<String>)> {
        spans
            .segments()
            .map(|segment| {
                let names = segment
                    .attributions
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                (segment.range, names)
            })
            .collect()
    }

    #[test]
    fn plain_text_is_one_segment() {
        let spans = AttributionSpans::new(5);
        assert_eq!(describe(&spans), vec![(0..5, vec![])]);
    }

    #[test]
    fn empty_text_has_no_segments() {
        let spans = AttributionSpans::new(0);
        assert_eq!(spans.segments().count(), 0);
    }

    #[test]
    fn overlapping_attributions_split_segments() {
        let mut spans = AttributionSpans::new(12);
        spans.add_attribution(Attribution::Bold, 2..8).unwrap();
        spans.add_attribution(Attribution::Italics, 5..10).unwrap();
        spans
            .add_attribution(Attribution::link("https://example.org"), 0..2)
            .unwrap();

        insta::assert_debug_snapshot!(describe(&spans), @r#"
        [
            (
                0..2,
                [
                    "link:https://example.org",
                ],
            ),
            (
                2..5,
                [
                    "bold",
                ],
            ),
            (
                5..8,
                [
                    "bold",
                    "italics",
                ],
            ),
            (
                8..10,
                [
                    "italics",
                ],
            ),
            (
                10..12,
                [],
            ),
        ]
        "#);
    }

    #[test]
    fn segments_partition_the_text_minimally() {
        let mut spans = AttributionSpans::new(30);
        spans.add_attribution(Attribution::Bold, 0..4).unwrap();
        spans.add_attribution(Attribution::Bold, 10..20).unwrap();
        spans.add_attribution(Attribution::Code, 3..12).unwrap();
        spans.add_attribution(Attribution::Underline, 12..30).unwrap();

        let segments: Vec<_> = spans.segments().collect();
        assert_eq!(segments.first().map(|s| s.range.start), Some(0));
        assert_eq!(segments.last().map(|s| s.range.end), Some(30));
        for pair in segments.windows(2) {
            assert_eq!(pair[0].range.end, pair[1].range.start);
            assert_ne!(pair[0].attributions, pair[1].attributions);
        }
        assert!(segments.iter().all(|s| !s.range.is_empty()));
    }

    #[test]
    fn projection_restarts() {
        let mut spans = AttributionSpans::new(6);
        spans.add_attribution(Attribution::Strikethrough, 1..3).unwrap();

        let mut first = spans.segments();
        let replay = first.clone();
        first.next();
        assert_eq!(replay.count(), 3);
        assert_eq!(spans.segments().count(), 3);
        assert_eq!(first.count(), 2);
    }

    #[test]
    fn span_reaching_the_end_closes_the_last_segment() {
        let mut spans = AttributionSpans::new(4);
        spans.add_attribution(Attribution::Italics, 2..4).unwrap();
        assert_eq!(
            describe(&spans),
            vec![(0..2, vec![]), (2..4, vec!["italics".to_string()])]
        );
    }
}
