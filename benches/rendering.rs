//! Benchmarks for document rendering.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mdmd::config::RenderOptions;
use mdmd::diagram::TextRenderer;
use mdmd::format::{FormatOptions, format_markdown};
use mdmd::render::render_document;

fn bench_format_plain(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/diagrams.md");
    let options = FormatOptions {
        highlight: false,
        ..FormatOptions::default()
    };
    c.bench_function("format_plain", |b| {
        b.iter(|| format_markdown(black_box(md), &options))
    });
}

fn bench_render_document(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/diagrams.md");
    let options = RenderOptions {
        color: true,
        ..RenderOptions::default()
    };
    c.bench_function("render_document", |b| {
        b.iter(|| render_document(black_box(md), &options, &TextRenderer))
    });
}

criterion_group!(benches, bench_format_plain, bench_render_document);
criterion_main!(benches);
