//! Unicode-aware cursor offset navigation.
//!
//! Every offset here counts UTF-16 code units, the unit platform text input
//! reports caret positions in. A character outside the Basic Multilingual
//! Plane (an emoji, say) is a surrogate pair and spans two offsets; the
//! offset between the two halves is never a valid boundary.
//!
//! All functions are pure. They return `Ok(None)` when no boundary exists in
//! the requested direction and `Err` when the starting offset itself is not a
//! valid position in `text`.

use unicode_segmentation::UnicodeSegmentation;

use crate::error::TextError;

/// Length of `text` in UTF-16 code units.
pub fn len_utf16(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Converts a UTF-16 offset into a byte index into `text`.
pub fn utf16_to_byte(text: &str, offset: usize) -> Result<usize, TextError> {
    let mut utf16 = 0;
    for (byte, ch) in text.char_indices() {
        if utf16 == offset {
            return Ok(byte);
        }
        if utf16 > offset {
            return Err(TextError::NotOnCharBoundary { offset });
        }
        utf16 += ch.len_utf16();
    }
    match offset.cmp(&utf16) {
        std::cmp::Ordering::Equal => Ok(text.len()),
        std::cmp::Ordering::Less => Err(TextError::NotOnCharBoundary { offset }),
        std::cmp::Ordering::Greater => Err(TextError::OffsetOutOfRange { offset, len: utf16 }),
    }
}

/// Converts a byte index into `text` into a UTF-16 offset.
pub fn byte_to_utf16(text: &str, byte: usize) -> Result<usize, TextError> {
    if byte > text.len() {
        return Err(TextError::OffsetOutOfRange {
            offset: byte,
            len: text.len(),
        });
    }
    if !text.is_char_boundary(byte) {
        return Err(TextError::NotOnCharBoundary { offset: byte });
    }
    Ok(len_utf16(&text[..byte]))
}

/// The offset one code point upstream of `offset`.
pub fn previous_code_point_boundary(text: &str, offset: usize) -> Result<Option<usize>, TextError> {
    let byte = utf16_to_byte(text, offset)?;
    Ok(text[..byte]
        .chars()
        .next_back()
        .map(|ch| offset - ch.len_utf16()))
}

/// The offset one code point downstream of `offset`.
pub fn next_code_point_boundary(text: &str, offset: usize) -> Result<Option<usize>, TextError> {
    let byte = utf16_to_byte(text, offset)?;
    Ok(text[byte..].chars().next().map(|ch| offset + ch.len_utf16()))
}

/// The offset `count` grapheme clusters upstream of `offset`.
///
/// A surrogate pair, a flag or a base letter with combining marks each count
/// as one unit.
pub fn previous_character_boundary(
    text: &str,
    offset: usize,
    count: usize,
) -> Result<Option<usize>, TextError> {
    utf16_to_byte(text, offset)?;
    if count == 0 {
        return Ok(Some(offset));
    }
    let boundaries = grapheme_boundaries(text);
    let before = boundaries.partition_point(|&b| b < offset);
    Ok(before.checked_sub(count).map(|i| boundaries[i]))
}

/// The offset `count` grapheme clusters downstream of `offset`.
pub fn next_character_boundary(
    text: &str,
    offset: usize,
    count: usize,
) -> Result<Option<usize>, TextError> {
    utf16_to_byte(text, offset)?;
    if count == 0 {
        return Ok(Some(offset));
    }
    let boundaries = grapheme_boundaries(text);
    let first_after = boundaries.partition_point(|&b| b <= offset);
    Ok(first_after
        .checked_add(count - 1)
        .and_then(|index| boundaries.get(index))
        .copied())
}

/// The start of the nearest word strictly upstream of `offset`.
///
/// Whitespace and punctuation before the word are skipped in one step. When
/// there is no word upstream the start of the text is returned.
pub fn previous_word_boundary(text: &str, offset: usize) -> Result<Option<usize>, TextError> {
    utf16_to_byte(text, offset)?;
    if offset == 0 {
        return Ok(None);
    }
    let clusters = word_clusters(text);
    let mut index = clusters.partition_point(|c| c.start < offset);
    while index > 0 && !clusters[index - 1].is_word {
        index -= 1;
    }
    while index > 0 && clusters[index - 1].is_word {
        index -= 1;
    }
    Ok(Some(clusters.get(index).map_or(0, |c| c.start)))
}

/// The end of the nearest word strictly downstream of `offset`.
///
/// When there is no word downstream the end of the text is returned.
pub fn next_word_boundary(text: &str, offset: usize) -> Result<Option<usize>, TextError> {
    utf16_to_byte(text, offset)?;
    let clusters = word_clusters(text);
    let mut index = clusters.partition_point(|c| c.end <= offset);
    if index == clusters.len() {
        return Ok(None);
    }
    while index < clusters.len() && !clusters[index].is_word {
        index += 1;
    }
    while index < clusters.len() && clusters[index].is_word {
        index += 1;
    }
    Ok(Some(clusters[index - 1].end))
}

/// Offsets of every grapheme cluster boundary, including `0` and the length.
fn grapheme_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries = Vec::with_capacity(text.len() + 1);
    let mut offset = 0;
    boundaries.push(offset);
    for grapheme in text.graphemes(true) {
        offset += len_utf16(grapheme);
        boundaries.push(offset);
    }
    boundaries
}

struct Cluster {
    start: usize,
    end: usize,
    is_word: bool,
}

fn word_clusters(text: &str) -> Vec<Cluster> {
    let mut offset = 0;
    text.graphemes(true)
        .map(|grapheme| {
            let start = offset;
            offset += len_utf16(grapheme);
            Cluster {
                start,
                end: offset,
                is_word: grapheme.chars().next().is_some_and(char::is_alphanumeric),
            }
        })
        .collect()
}
