//! Benchmarks for preview rendering.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use htmlpen::playground::DEFAULT_DOCUMENT;
use htmlpen::preview;

fn bench_render_default(c: &mut Criterion) {
    c.bench_function("preview_default", |b| {
        b.iter(|| preview::render(black_box(DEFAULT_DOCUMENT), black_box(80)))
    });
}

fn bench_visible_lines(c: &mut Criterion) {
    let html = "<p>Some <em>styled</em> paragraph text that wraps.</p>".repeat(400);
    let doc = preview::render(&html, 80);
    c.bench_function("preview_visible_lines", |b| {
        b.iter(|| doc.visible_lines(black_box(100), black_box(24)))
    });
}

criterion_group!(benches, bench_render_default, bench_visible_lines);
criterion_main!(benches);
