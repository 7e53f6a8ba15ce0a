//! Grid Rendering Benchmarks
//!
//! Measures the pure render path that runs on every published count:
//! tile generation, row layout and text drawing.
//!
//! Run with: `cargo bench -p tilegrid`

#![allow(missing_docs)] // Benchmarks don't need extensive docs

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tilegrid::TextRenderer;
use tilegrid::grid::{GridConfig, layout, render};

fn benchmark_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let config = GridConfig::default();

    for count in [10_u64, 100, 1_000] {
        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::new("tiles", count), &count, |b, &count| {
            b.iter(|| render(black_box(count), &config));
        });
        group.bench_with_input(BenchmarkId::new("layout", count), &count, |b, &count| {
            b.iter(|| layout(black_box(count), &config));
        });
    }

    group.finish();
}

fn benchmark_text_renderer(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_renderer");
    let config = GridConfig::default();

    for color in [false, true] {
        let renderer = TextRenderer::new(color);
        let grid = layout(100, &config);
        let name = if color { "color" } else { "plain" };
        group.bench_function(name, |b| {
            b.iter(|| renderer.render(black_box(&grid)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_render, benchmark_text_renderer);
criterion_main!(benches);
