//! Benchmarks for diagram block extraction and substitution.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mdmd::diagram::{DiagramError, DiagramOptions, TextRenderer};
use mdmd::extract::{Extractor, find_blocks};

fn echo(source: &str, _: &DiagramOptions) -> Result<String, DiagramError> {
    Ok(source.to_string())
}

fn bench_find_blocks(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/diagrams.md").repeat(50);
    c.bench_function("find_blocks", |b| {
        b.iter(|| find_blocks(black_box(&md), "mermaid"))
    });
}

fn bench_substitute_without_blocks(c: &mut Criterion) {
    let md = "# Plain\n\nNo diagrams here, just text.\n".repeat(500);
    let extractor = Extractor::new(&echo);
    c.bench_function("substitute_no_blocks", |b| {
        b.iter(|| extractor.substitute(black_box(&md)))
    });
}

fn bench_substitute_flowcharts(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/diagrams.md");
    let extractor = Extractor::new(&TextRenderer);
    c.bench_function("substitute_flowcharts", |b| {
        b.iter(|| extractor.substitute(black_box(md)))
    });
}

criterion_group!(
    benches,
    bench_find_blocks,
    bench_substitute_without_blocks,
    bench_substitute_flowcharts
);
criterion_main!(benches);
