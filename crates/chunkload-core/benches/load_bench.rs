use chunkload_core::{load_directory, split_file, LoaderConfigBuilder, SplitConfig};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use once_cell::sync::Lazy;
use std::fs::File;
use std::hint::black_box;
use std::io::{BufWriter, Write};
use tempfile::TempDir;

const ROWS: usize = 200_000;
const LINES_PER_CHUNK: usize = 10_000;

/// Source split once into chunks, shared by every benchmark
static CHUNK_DIR: Lazy<TempDir> = Lazy::new(|| {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("bench.csv");
    let mut writer = BufWriter::new(File::create(&source).unwrap());
    writeln!(writer, "id,price,label,flag").unwrap();
    for i in 0..ROWS {
        writeln!(
            writer,
            "{},{:.2},item-{},{}",
            i,
            i as f64 * 0.25,
            i % 1_000,
            i % 2 == 0
        )
        .unwrap();
    }
    writer.flush().unwrap();
    drop(writer);

    split_file(
        &source,
        &SplitConfig::new(dir.path().join("chunks"), LINES_PER_CHUNK).with_manifest(false),
    )
    .unwrap();
    dir
});

fn bench_load_workers(c: &mut Criterion) {
    let chunks = CHUNK_DIR.path().join("chunks");
    let mut group = c.benchmark_group("load_directory");
    group.sample_size(10);

    for workers in [1usize, 4, 16] {
        let config = LoaderConfigBuilder::new().with_workers(workers).build();
        group.bench_with_input(BenchmarkId::from_parameter(workers), &config, |b, config| {
            b.iter(|| {
                let outcome = load_directory(black_box(&chunks), config).unwrap();
                black_box(outcome.table.num_rows())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_load_workers);
criterion_main!(benches);
