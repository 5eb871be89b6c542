//! Performance benchmarks for digest and cycle operations

use criterion::{criterion_group, criterion_main, Criterion};
use header_mine_sim::{
    BlockHeader, DoubleDigest, FixedClock, HashAlgorithm, HeaderBuffer, MiningCycle,
    MiningEvent,
};
use std::hint::black_box;
use std::sync::Arc;

fn bench_double_digest(c: &mut Criterion) {
    let header = HeaderBuffer::from_header(&BlockHeader::genesis()).serialized();

    c.bench_function("sha256d_header", |b| {
        let digest = DoubleDigest::new(HashAlgorithm::Sha256);
        b.iter(|| black_box(digest.digest(black_box(&header))));
    });

    c.bench_function("blake2s256d_header", |b| {
        let digest = DoubleDigest::new(HashAlgorithm::Blake2s256);
        b.iter(|| black_box(digest.digest(black_box(&header))));
    });
}

fn bench_header_fields(c: &mut Criterion) {
    let mut header = HeaderBuffer::from_header(&BlockHeader::genesis());

    c.bench_function("set_nonce", |b| {
        b.iter(|| header.set_nonce(black_box(12_345_678)));
    });

    c.bench_function("serialize_header", |b| {
        b.iter(|| black_box(header.serialized()));
    });
}

fn bench_mining_cycle(c: &mut Criterion) {
    let cycle = MiningCycle::new(DoubleDigest::default(), Arc::new(FixedClock::new(1_700_000_000)));
    let mut header = HeaderBuffer::from_header(&BlockHeader::genesis());
    let sink = |event: &MiningEvent| {
        black_box(event);
    };

    c.bench_function("mining_cycle", |b| {
        b.iter(|| black_box(cycle.run(&mut header, &sink)));
    });
}

criterion_group!(
    benches,
    bench_double_digest,
    bench_header_fields,
    bench_mining_cycle
);
criterion_main!(benches);
