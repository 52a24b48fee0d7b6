use anyhow::Result;
use tsagg_core::metrics::Scorer;
use tsagg_core::raster::encode_png;
use tsagg_core::{Backend, RenderConfig};
use criterion::{criterion_group, criterion_main, Criterion, black_box};

fn gen_xy(n: usize) -> (Vec<f64>, Vec<f64>) {
    let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let y = x.iter().map(|&v| (v * 0.01).sin() * 10.0 + v * 0.0001).collect();
    (x, y)
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_png_bytes");
    for backend in [Backend::Skia, Backend::Plotters] {
        for &n in &[1_000usize, 50_000usize] {
            let (x, y) = gen_xy(n);
            let cfg = RenderConfig::default();
            group.bench_function(format!("{backend}_{n}"), |b| {
                b.iter(|| -> Result<()> {
                    let raster = backend.render(&x, &y, &cfg)?;
                    black_box(encode_png(&raster)?);
                    Ok(())
                });
            });
        }
    }
    group.finish();
}

fn bench_score(c: &mut Criterion) {
    let (x, y) = gen_xy(50_000);
    let cfg = RenderConfig::default();
    let reference = Backend::Skia.render(&x, &y, &cfg).expect("render reference");
    let agg = Backend::Skia.render(&x[..10_000], &y[..10_000], &cfg).expect("render aggregate");
    let scorer = Scorer::default();
    c.bench_function("score_skia_800x250", |b| {
        b.iter(|| black_box(scorer.score(&agg, &reference, Backend::Skia.signal_channel()).expect("score")));
    });
}

criterion_group!(benches, bench_render, bench_score);
criterion_main!(benches);
