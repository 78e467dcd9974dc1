use criterion::{Criterion, Throughput, criterion_group, criterion_main};

use bfs::prelude::*;
use bfsio::prelude::*;

criterion_group!(benches, engine_bench, host_bench);
criterion_main!(benches);

const PAYLOAD: usize = 64 * 1024;

pub fn engine_bench(c: &mut Criterion) {
    let params = BfsParams::default();
    let mut buf = vec![0u8; params.size_bytes() as usize];
    let mut fs = Bfs::format(MemBfsIO::new(&mut buf), &params).expect("format failed");
    let data = vec![0x5Au8; PAYLOAD];

    let mut group = c.benchmark_group("engine_mem");
    group.throughput(Throughput::Bytes(PAYLOAD as u64));

    group.bench_function("write_aligned", |b| {
        b.iter(|| {
            let fd = fs.create("bench").expect("create failed");
            fs.write(fd, &data).expect("write failed");
            fs.close(fd).expect("close failed");
        });
    });

    group.bench_function("write_unaligned", |b| {
        b.iter(|| {
            let fd = fs.create("bench").expect("create failed");
            fs.seek(fd, 100, Whence::Set).expect("seek failed");
            fs.write(fd, &data[..PAYLOAD - 512]).expect("write failed");
            fs.close(fd).expect("close failed");
        });
    });

    let fd = fs.create("bench").expect("create failed");
    fs.write(fd, &data).expect("write failed");
    let mut out = vec![0u8; PAYLOAD];

    group.bench_function("read_aligned", |b| {
        b.iter(|| {
            fs.seek(fd, 0, Whence::Set).expect("seek failed");
            fs.read(fd, &mut out).expect("read failed");
        });
    });
    group.finish();
}

pub fn host_bench(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let path = dir.path().join("bench.img");
    let mut fs = HostBfs::format_path(&path, &BfsParams::default()).expect("format failed");
    let data = vec![0xA5u8; PAYLOAD];

    c.bench_function("engine_file_write", |b| {
        b.iter(|| {
            let fd = fs.create("bench").expect("create failed");
            fs.write(fd, &data).expect("write failed");
            fs.close(fd).expect("close failed");
        });
    });
}
