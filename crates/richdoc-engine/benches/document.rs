use criterion::{Criterion, criterion_group, criterion_main};
use richdoc_engine::{Cmd, DocumentNode, DocumentPosition};
use std::hint::black_box;
mod common;

fn bench_lookups(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_lookups");
    group.sample_size(20);

    let doc = common::generate_document(1_000);
    let last = doc.last_node().map(DocumentNode::id).unwrap();

    group.bench_function("index_by_id_cached", |b| {
        b.iter(|| black_box(doc.get_node_index_by_id(black_box(last))));
    });

    group.finish();
}

fn bench_structural_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_edits");
    group.sample_size(20);

    group.bench_function("insert_then_lookup", |b| {
        let mut doc = common::generate_document(1_000);
        let last = doc.last_node().map(DocumentNode::id).unwrap();
        b.iter(|| {
            doc.insert_node_at(0, DocumentNode::paragraph("new")).unwrap();
            black_box(doc.get_node_index_by_id(last));
            doc.delete_node_at(0).unwrap();
        });
    });

    group.bench_function("insert_text_command", |b| {
        let mut doc = common::generate_document(100);
        let id = doc.first_node().map(DocumentNode::id).unwrap();
        b.iter(|| {
            let patch = doc
                .execute(&Cmd::InsertText {
                    position: DocumentPosition::text(id, 0),
                    text: black_box("x".to_string()),
                    attributions: None,
                })
                .unwrap();
            black_box(patch);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_lookups, bench_structural_edits);
criterion_main!(benches);
