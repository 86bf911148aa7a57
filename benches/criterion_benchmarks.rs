use criterion::{black_box, criterion_group, criterion_main, Criterion};
use disk_cache_rs::{DiskCache, RecencyIndex};

const ENTRIES: usize = 1000;
const PAYLOAD: &[u8] = &[7u8; 256];

fn make_cache(dir: &tempfile::TempDir, max_size: u64) -> DiskCache {
    DiskCache::new(dir.path().join("bench"), max_size).unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Disk Cache Operations");

    // Index only, no I/O
    {
        let mut index = RecencyIndex::new();
        for i in 0..ENTRIES {
            index.add(&format!("k{}", i), None, 1);
        }

        group.bench_function("index touch", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(index.touch(&format!("k{}", i % ENTRIES)));
                }
            });
        });

        group.bench_function("index add/remove_oldest", |b| {
            let mut next = ENTRIES;
            b.iter(|| {
                index.add(&format!("k{}", next), None, 1);
                black_box(index.remove_oldest());
                next += 1;
            });
        });
    }

    // Full engine
    {
        let dir = tempfile::tempdir().unwrap();
        let cache = make_cache(&dir, (ENTRIES * PAYLOAD.len()) as u64);
        for i in 0..ENTRIES {
            cache.set(&format!("/k/{}", i), PAYLOAD);
        }

        group.bench_function("get hit", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.get(&format!("/k/{}", i % ENTRIES)));
                }
            });
        });

        group.bench_function("get miss", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.get(&format!("/missing/{}", i)));
                }
            });
        });

        group.bench_function("set with eviction", |b| {
            let mut next = ENTRIES;
            b.iter(|| {
                cache.set(&format!("/k/{}", next), PAYLOAD);
                next += 1;
            });
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
