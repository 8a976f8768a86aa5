//! Criterion benchmarks for command encoding and alias lookup.
//!
//! Run with:
//! ```bash
//! cargo bench --package brewlink-core --bench command_bench
//! ```

use std::time::{Duration, UNIX_EPOCH};

use brewlink_core::command::{CommandCodec, TimestampFormat};
use brewlink_core::{AliasResolver, CommandDescriptor};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn build_resolver(n: usize) -> AliasResolver {
    let commands = (0..n).map(|i| {
        let raw = format!("0d{:02x}", i % 256);
        (format!("Recipe_{i}"), CommandDescriptor::new(raw))
    });
    let properties = (0..n).map(|i| (format!("prop_{i}"), format!("d{i:03}_raw")));
    AliasResolver::new(commands, properties)
}

// ── Benchmarks: encode ────────────────────────────────────────────────────────

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_encode");
    let at = UNIX_EPOCH + Duration::from_secs(1_700_000_000);

    let minimal = CommandCodec::default();
    group.bench_function("minimal_timestamp", |b| {
        b.iter(|| minimal.encode(black_box("0d07840f0201"), black_box(at)))
    });

    let fixed = CommandCodec::new(TimestampFormat::FixedWidth(8));
    group.bench_function("fixed_width_timestamp", |b| {
        b.iter(|| fixed.encode(black_box("0d07840f0201"), black_box(at)))
    });

    group.finish();
}

// ── Benchmarks: alias lookup ──────────────────────────────────────────────────

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("alias_resolve");
    let resolver = build_resolver(128);

    group.bench_function("command_hit_mixed_case", |b| {
        b.iter(|| resolver.resolve_command(black_box("  RECIPE_64 ")))
    });
    group.bench_function("command_miss", |b| {
        b.iter(|| resolver.resolve_command(black_box("cappuccino")))
    });
    group.bench_function("property_passthrough", |b| {
        b.iter(|| resolver.resolve_property(black_box("uptime")).len())
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_resolve);
criterion_main!(benches);
