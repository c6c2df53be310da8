//! Benchmark for config digest computation

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ocr_node::{ContractConfig, CustomEndpointDigester, EndpointIdentity, OffchainConfigDigester};

fn bench_config_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_digest");
    group.throughput(Throughput::Elements(1));

    let digester = CustomEndpointDigester::new(EndpointIdentity::new("dydx", "bridge", "ETHUSD"));
    let config = ContractConfig {
        config_count: 7,
        signers: vec![vec![0xab; 20]; 31],
        transmitters: (0..31).map(|i| format!("0x{:040x}", i)).collect(),
        f: 10,
        ..Default::default()
    };

    group.bench_function("custom_endpoint", |b| {
        b.iter(|| digester.config_digest(black_box(&config)).unwrap());
    });

    let long_target = "x".repeat(4096);
    let long = CustomEndpointDigester::new(EndpointIdentity::new("dydx", long_target, "ETHUSD"));
    group.bench_function("custom_endpoint_long_target", |b| {
        b.iter(|| long.config_digest(black_box(&config)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_config_digest);
criterion_main!(benches);
