use criterion::{Criterion, black_box, criterion_group, criterion_main};

use stubgen::{Config, Expander};

const SIGNATURES: [&str; 6] = [
    "() -> Void",
    "(Int) -> Void",
    "(String, Int) throws -> Bool",
    "(URL) async throws -> Data",
    "@Sendable (Int, Int, Int) async -> [String]",
    "() -> Bool",
];

fn build_unit(declarations: usize) -> String {
    // Every sixth declaration fails with a missing default.
    let mut source = String::from("import Foundation\n\nstruct Client: Sendable {\n");
    for n in 0..declarations {
        let attribute = if n % 2 == 0 {
            "@Unimplemented"
        } else {
            "@DependencyEndpoint"
        };
        source.push_str(&format!(
            "  {attribute}\n  var endpoint{n}: {}\n",
            SIGNATURES[n % SIGNATURES.len()]
        ));
    }
    source.push_str("}\n");
    source
}

fn bench_expand(c: &mut Criterion) {
    let small = build_unit(12);
    let large = build_unit(600);
    let sequential = Expander::default();
    let parallel = Expander::new(Config {
        parallel: true,
        ..Config::default()
    });

    c.bench_function("expand_small", |b| {
        b.iter(|| sequential.expand(black_box(&small)))
    });
    c.bench_function("expand_large_sequential", |b| {
        b.iter(|| sequential.expand(black_box(&large)))
    });
    c.bench_function("expand_large_parallel", |b| {
        b.iter(|| parallel.expand(black_box(&large)))
    });
    c.bench_function("check_large", |b| {
        b.iter(|| sequential.check(black_box(&large)))
    });
}

criterion_group!(benches, bench_expand);
criterion_main!(benches);
