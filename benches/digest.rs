use camino::Utf8PathBuf;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use jk2mm::services::digest::sha256_file;
use std::hint::black_box;
use tempfile::TempDir;

fn bench_sha256_file(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let mut group = c.benchmark_group("sha256_file");

    for size_mb in [1usize, 16] {
        let path = Utf8PathBuf::try_from(temp_dir.path().join(format!("{}mb.pk3", size_mb))).unwrap();
        let contents: Vec<u8> = (0..size_mb * 1024 * 1024).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &contents).unwrap();

        group.throughput(Throughput::Bytes(contents.len() as u64));
        group.bench_function(format!("{}MB", size_mb), |b| {
            b.iter(|| sha256_file(black_box(&path)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sha256_file);
criterion_main!(benches);
