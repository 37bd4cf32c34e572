//! Attributed text: a text buffer plus the attribution spans over it.

pub mod attributed_text;
pub mod attribution;
pub mod offsets;
pub mod segments;
pub mod spans;

pub use attributed_text::{AttributedText, StyledSegment};
pub use attribution::{Attribution, AttributionSet, AttributionSpan};
pub use segments::{Segment, Segments};
pub use spans::AttributionSpans;
