use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use timrx_core::synth::{Si57x, SynthesizerSetting};

fn compute_settings(c: &mut Criterion) {
    let si57x = Si57x::default();
    let mut group = c.benchmark_group("compute_settings");
    // 700 MHz is only reachable through the last HS_DIV entry
    for frequency in [10e6, 100e6, 700e6] {
        group.bench_function(format!("{} MHz", frequency / 1e6), |b| {
            b.iter(|| si57x.compute_settings(black_box(frequency)))
        });
    }
    group.finish();
}

fn compute_frequency(c: &mut Criterion) {
    let si57x = Si57x::default();
    let setting = SynthesizerSetting {
        n1: 5,
        hs_div: 5,
        rfreq_lo: 79273,
        rfreq_hi: 12096,
    };
    c.bench_function("compute_frequency", |b| {
        b.iter(|| si57x.compute_frequency(black_box(&setting)))
    });
}

criterion_group!(benches, compute_settings, compute_frequency);
criterion_main!(benches);
