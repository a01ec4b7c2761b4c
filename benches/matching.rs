//! Throughput benchmarks for the host matching hot paths, over synthetic
//! multi-megabyte inputs.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vsed::command::{PatternKind, SubstFlags};
use vsed::compute::cpu;

fn synthetic_text(megabytes: usize) -> Vec<u8> {
    let line = b"the quick brown fox jumps over the lazy dog\n";
    let mut out = Vec::with_capacity(megabytes * 1024 * 1024 + line.len());
    while out.len() < megabytes * 1024 * 1024 {
        out.extend_from_slice(line);
    }
    out
}

fn bench_literal(c: &mut Criterion) {
    let text = synthetic_text(8);
    let flags = SubstFlags { global: true, ..Default::default() };
    c.bench_function("literal_global_search_8mib", |b| {
        b.iter(|| {
            cpu::find_matches(black_box(&text), black_box(b"fox"), PatternKind::Literal, flags).unwrap()
        })
    });
}

fn bench_literal_case_insensitive(c: &mut Criterion) {
    let text = synthetic_text(8);
    let flags = SubstFlags { global: true, case_insensitive: true, ..Default::default() };
    c.bench_function("literal_case_insensitive_search_8mib", |b| {
        b.iter(|| {
            cpu::find_matches(black_box(&text), black_box(b"FOX"), PatternKind::Literal, flags).unwrap()
        })
    });
}

fn bench_regex(c: &mut Criterion) {
    let text = synthetic_text(8);
    let flags = SubstFlags { global: true, ..Default::default() };
    c.bench_function("regex_global_search_8mib", |b| {
        b.iter(|| {
            cpu::find_matches(black_box(&text), black_box(b"[a-z]+ fox"), PatternKind::RegexExtended, flags).unwrap()
        })
    });
}

criterion_group!(benches, bench_literal, bench_literal_case_insensitive, bench_regex);
criterion_main!(benches);
