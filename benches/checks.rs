//! 检测结果处理基准测试

use criterion::{criterion_group, criterion_main, Criterion};
use netwatch::checks::ping::parse_latency;
use netwatch::{CheckResult, CheckType, Target};
use std::hint::black_box;

const PING_OUTPUT: &str = "PING 8.8.8.8 (8.8.8.8) 56(84) bytes of data.
64 bytes from 8.8.8.8: icmp_seq=1 ttl=117 time=12.4 ms

--- 8.8.8.8 ping statistics ---
1 packets transmitted, 1 received, 0% packet loss, time 0ms
rtt min/avg/max/mdev = 12.400/12.400/12.400/0.000 ms
";

fn parse_latency_benchmark(c: &mut Criterion) {
    c.bench_function("parse_latency", |b| {
        b.iter(|| black_box(parse_latency(black_box(PING_OUTPUT))))
    });
}

fn check_result_benchmark(c: &mut Criterion) {
    let target = Target::new("SSH Prod", "example.com", CheckType::Tcp).with_port(22);
    let result = CheckResult::new(target, true, Some(12.4), "TCP connection successful");

    c.bench_function("check_result_to_json", |b| {
        b.iter(|| black_box(result.to_json().unwrap()))
    });

    let json = result.to_json().unwrap();
    c.bench_function("check_result_from_json", |b| {
        b.iter(|| black_box(CheckResult::from_json(black_box(&json)).unwrap()))
    });
}

criterion_group!(benches, parse_latency_benchmark, check_result_benchmark);
criterion_main!(benches);
