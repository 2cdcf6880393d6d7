//! Benchmarks for the hfile read path

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hfile::testutil::{key_int, write_fixture};
use hfile::{Compression, Reader};
use tempfile::TempDir;

fn bench_get_first(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench.hfile");
    write_fixture(&path, 100_000, 4096, Compression::Snappy).unwrap();
    let reader = Reader::open_path("bench", &path).unwrap();

    c.bench_function("scanner/get_first monotonic sweep", |b| {
        b.iter(|| {
            let mut scanner = reader.scanner();
            for i in (1..100_000u32).step_by(997) {
                black_box(scanner.get_first(&key_int(i)).unwrap());
            }
            scanner.release();
        })
    });
}

fn bench_full_iteration(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    for (name, compression) in [
        ("plain", Compression::None),
        ("snappy", Compression::Snappy),
    ] {
        let path = dir.path().join(format!("bench-{}.hfile", name));
        write_fixture(&path, 100_000, 4096, compression).unwrap();
        let reader = Reader::open_path(name, &path).unwrap();

        c.bench_function(&format!("iter/full traversal ({})", name), |b| {
            b.iter(|| {
                let mut it = reader.iter();
                let mut entries = 0u32;
                while it.next().unwrap() {
                    entries += 1;
                }
                it.release();
                black_box(entries)
            })
        });
    }
}

criterion_group!(benches, bench_get_first, bench_full_iteration);
criterion_main!(benches);
