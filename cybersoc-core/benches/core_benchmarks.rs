use criterion::{Criterion, black_box, criterion_group, criterion_main};
use cybersoc_core::metrics::{MetricsSource, RandomMetrics};
use cybersoc_core::scenarios::source_tag_for;
use cybersoc_core::{ActionCatalog, ScenarioCatalog, is_resolving_action};

fn bench_catalogs(c: &mut Criterion) {
    let scenarios = ScenarioCatalog::builtin();
    let actions = ActionCatalog::builtin();

    c.bench_function("scenario_lookup_hit", |b| {
        b.iter(|| scenarios.lookup(black_box("data-exfiltration")))
    });

    c.bench_function("scenario_lookup_miss", |b| {
        b.iter(|| scenarios.lookup(black_box("ransomware")))
    });

    c.bench_function("action_describe_fallback", |b| {
        b.iter(|| actions.describe(black_box("Reboot Domain Controller")))
    });

    c.bench_function("resolving_action_check", |b| {
        b.iter(|| is_resolving_action(black_box("Isolate Infected Computer")))
    });

    c.bench_function("source_tag_classification", |b| {
        b.iter(|| source_tag_for(black_box("Failed login attempt from 192.168.1.100")))
    });
}

fn bench_metrics(c: &mut Criterion) {
    let source = RandomMetrics::seeded(1);
    c.bench_function("random_metrics_sample", |b| b.iter(|| source.sample()));
}

criterion_group!(benches, bench_catalogs, bench_metrics);
criterion_main!(benches);
