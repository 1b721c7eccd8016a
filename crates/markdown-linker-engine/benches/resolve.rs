use criterion::{Criterion, criterion_group, criterion_main};
use markdown_linker_engine::anchor::{self, LogicalSpan};
use markdown_linker_engine::document::DocumentSnapshot;
use markdown_linker_engine::layers::LayerId;
mod common;

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    group.sample_size(10);

    let snapshot = DocumentSnapshot::new(0, common::generate_note_content(1000));
    let phrases = vec![LogicalSpan::phrases(common::link_candidates())];
    let sections: Vec<_> = (0..50)
        .map(|i| LogicalSpan::markers(format!("### Workflow {i}"), format!("Done evolving {i}.")))
        .collect();

    group.bench_function("link_candidates", |b| {
        b.iter(|| {
            let ranges = anchor::resolve_all(std::hint::black_box(&snapshot), &phrases, LayerId(0));
            std::hint::black_box(ranges);
        });
    });

    group.bench_function("section_markers", |b| {
        b.iter(|| {
            let ranges = anchor::resolve_all(std::hint::black_box(&snapshot), &sections, LayerId(1));
            std::hint::black_box(ranges);
        });
    });

    group.bench_function("line_index", |b| {
        let text = snapshot.text().to_string();
        b.iter(|| {
            let snap = DocumentSnapshot::new(1, std::hint::black_box(text.as_str()));
            std::hint::black_box(snap.line_index().line_count());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_resolution);
criterion_main!(benches);
