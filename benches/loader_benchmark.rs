//! Performance benchmarks for page decoding and loader transitions
//!
//! Tests envelope parsing and item accumulation for different page sizes.
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use curator::loader::CursorMachine;
use curator::models::{Cursor, Page, PageEnvelope};
use serde_json::{json, Value};

/// Generate a page envelope body with `size` results
fn generate_envelope(size: usize) -> String {
    let results: Vec<Value> = (0..size)
        .map(|i| {
            json!({
                "id": i,
                "title": format!("Asset {}", i),
                "url": format!("https://repo.example.com/media/{}.png", i),
                "tags": ["image", "lecture"],
            })
        })
        .collect();
    json!({
        "count": size * 10,
        "next": "https://repo.example.com/api/v0/assets/?cursor=cD0yMDI0",
        "previous": null,
        "results": results,
    })
    .to_string()
}

/// Benchmark decoding the JSON envelope into a page
fn bench_envelope_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_decode");

    for size in [10, 50, 100, 500].iter() {
        let body = generate_envelope(*size);
        group.throughput(Throughput::Bytes(body.len() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_items", size)),
            &body,
            |b, body| {
                b.iter(|| {
                    let envelope: PageEnvelope<Value> =
                        serde_json::from_str(black_box(body)).unwrap();
                    black_box(Page::from(envelope))
                });
            },
        );
    }

    group.finish();
}

/// Benchmark walking a collection through the state machine
fn bench_machine_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("machine_walk");

    for pages in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*pages as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_pages", pages)),
            pages,
            |b, &pages| {
                b.iter(|| {
                    let mut machine: CursorMachine<u64> = CursorMachine::new("/api/v0/assets/");
                    for n in 0..pages {
                        let ticket = machine.request_next_page().unwrap();
                        let next = (n + 1 < pages).then(|| Cursor::new(format!("c{}", n)));
                        let page = Page::new((0..20).collect(), next);
                        machine.complete(&ticket, Ok(page)).unwrap();
                    }
                    black_box(machine.status())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_envelope_decode, bench_machine_walk);

criterion_main!(benches);
