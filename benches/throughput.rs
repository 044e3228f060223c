//! Throughput Benchmark for lipbridge
//!
//! This benchmark measures the hot paths of a busy monitoring session:
//! matching response lines out of the read buffer and serializing commands.

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lipbridge::protocol::{parse_response, Action, Button, Command, Matcher, DEVICE, OUTPUT};

/// Benchmark response decoding
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(1));

    group.bench_function("single_response", |b| {
        b.iter(|| {
            let mut buf = BytesMut::from(&b"~OUTPUT,2,1,100.00\r\n"[..]);
            black_box(parse_response(&mut buf));
        });
    });

    group.bench_function("response_after_prompt_noise", |b| {
        b.iter(|| {
            let mut buf = BytesMut::from(&b"GNET> GNET> \r\n~DEVICE,12,3,0\r\n"[..]);
            black_box(parse_response(&mut buf));
        });
    });

    group.bench_function("incomplete_line", |b| {
        let buf = BytesMut::from(&b"~OUTPUT,2,1,100.0"[..]);
        let matcher = Matcher::response();
        b.iter(|| black_box(matcher.find(&buf)));
    });

    group.finish();
}

/// Benchmark draining a buffer full of pipelined responses
fn bench_drain(c: &mut Criterion) {
    let mut batch = Vec::new();
    for i in 0..100 {
        batch.extend_from_slice(format!("~OUTPUT,{},1,{}.00\r\n", i, i % 101).as_bytes());
    }

    let mut group = c.benchmark_group("drain");
    group.throughput(Throughput::Elements(100));

    group.bench_function("100_responses", |b| {
        b.iter(|| {
            let mut buf = BytesMut::from(&batch[..]);
            let mut count = 0;
            while let Some(result) = parse_response(&mut buf) {
                if result.is_ok() {
                    count += 1;
                }
            }
            black_box(count);
        });
    });

    group.finish();
}

/// Benchmark command serialization
fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    group.throughput(Throughput::Elements(1));

    let set = Command::execute(OUTPUT, 2, Action::Set)
        .with_value(75.0)
        .with_arg(Some("00:02"));
    group.bench_function("execute", |b| {
        let mut buf = Vec::with_capacity(64);
        b.iter(|| {
            buf.clear();
            set.serialize_into(&mut buf);
            black_box(&buf);
        });
    });

    let query = Command::query(DEVICE, 1, Button::LedState);
    group.bench_function("query", |b| {
        b.iter(|| black_box(query.serialize()));
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_drain, bench_serialize);
criterion_main!(benches);
