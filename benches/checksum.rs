use std::hint::black_box;

use cabsum::{block::FOLDER_BLOCK_SIZE, checksum};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};

fn block_checksum(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum");

    for len in [FOLDER_BLOCK_SIZE, usize::from(u16::MAX)] {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();

        group.throughput(Throughput::Bytes(len as u64));
        group.bench_function(format!("{len} byte block"), |b| {
            b.iter(|| checksum(black_box(&data), black_box(0)));
        });
    }

    group.finish();
}

fn tail_lengths(c: &mut Criterion) {
    for tail in 0..4 {
        let data = vec![0xa5; 4096 + tail];

        c.bench_function(&format!("checksum (4096 + {tail} bytes)"), |b| {
            b.iter(|| checksum(black_box(&data), black_box(0x1234_5678)));
        });
    }
}

criterion_group!(benches, block_checksum, tail_lengths);
criterion_main!(benches);
