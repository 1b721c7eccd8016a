use criterion::{Criterion, criterion_group, criterion_main};
use markdown_linker_engine::{
    AnnotationSession, ContentProvider, Document, LayerStyle, LogicalSpan, Span,
};
mod common;

fn bench_edit_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    group.sample_size(10);

    let content = common::generate_note_content(500);

    group.bench_function("keystroke_then_settle", |b| {
        let mut doc = Document::new(&content);
        let mut session = AnnotationSession::attach(&mut doc);
        let links = session.register_layer("links", LayerStyle::link_candidates());
        let sections = session.register_layer("sections", LayerStyle::sections());
        session.set_spans(links, vec![LogicalSpan::phrases(common::link_candidates())]);
        session.set_spans(
            sections,
            vec![LogicalSpan::markers("### Workflow 400", "Done evolving 400.")],
        );
        session.settle();

        b.iter(|| {
            doc.write(Span::new(0, 0), "x").unwrap();
            session.sync(&doc);
            std::hint::black_box(session.settle());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_edit_cycle);
criterion_main!(benches);
