//! Benchmarks for kvbatch encoding and enqueue throughput

use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use kvbatch::{Client, Cmd, Config, Dialer, Transport};

/// Dialer whose connections discard everything
struct SinkDialer;

impl Dialer for SinkDialer {
    fn dial(&self, _network: &str, _addr: &str) -> io::Result<Box<dyn Transport>> {
        Ok(Box::new(io::sink()))
    }
}

fn encode_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_ex_to_bytes", |b| {
        b.iter(|| Cmd::new().set(black_box("session:12345"), black_box("alive")).ex(300).to_bytes())
    });

    let cmd = Cmd::new().set("session:12345", "x".repeat(256)).ex(300);
    let mut buf = BytesMut::with_capacity(32 * 1024);
    group.bench_function("set_ex_encode_into", |b| {
        b.iter(|| {
            if buf.len() > 16 * 1024 {
                buf.clear();
            }
            black_box(&cmd).encode_into(&mut buf);
        })
    });

    group.finish();
}

fn enqueue_benchmarks(c: &mut Criterion) {
    let client = Client::new(
        Config::builder()
            .addr("sink")
            .dialer(Arc::new(SinkDialer))
            .build(),
    )
    .expect("client");

    let mut group = c.benchmark_group("enqueue");
    group.throughput(Throughput::Elements(1));
    group.bench_function("set", |b| {
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            client
                .set(format!("key:{}", n), "value", Duration::from_secs(300))
                .expect("set");
        })
    });
    group.finish();

    client.wait_idle(Duration::from_secs(10));
}

criterion_group!(benches, encode_benchmarks, enqueue_benchmarks);
criterion_main!(benches);
