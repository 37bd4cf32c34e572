// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use richdoc_engine::text::offsets::len_utf16;
use richdoc_engine::{AttributedText, Attribution, Document, DocumentNode};

const SENTENCE: &str = "Paragraph with some \u{1F499} content, a link and emphasis. ";

#[allow(dead_code)]
pub fn generate_text(size: usize) -> String {
    SENTENCE.repeat(size)
}

/// `size` sentences with overlapping bold, italic and link spans in each.
#[allow(dead_code)]
pub fn generate_attributed_text(size: usize) -> AttributedText {
    let mut text = AttributedText::new(&generate_text(size));
    let sentence_len = len_utf16(SENTENCE);
    for sentence in 0..size {
        let start = sentence * sentence_len;
        text.add_attribution(Attribution::Bold, start..start + 9)
            .unwrap();
        text.add_attribution(Attribution::Italics, start + 5..start + 19)
            .unwrap();
        text.add_attribution(
            Attribution::link(format!("https://example.org/{sentence}")),
            start + 34..start + 38,
        )
        .unwrap();
    }
    text
}

#[allow(dead_code)]
pub fn generate_document(nodes: usize) -> Document {
    Document::from_nodes(
        (0..nodes).map(|i| DocumentNode::paragraph(format!("Paragraph {i}").as_str())),
    )
    .unwrap()
}
