use criterion::{black_box, criterion_group, criterion_main, Criterion};

use visual_player::audio::FrequencyFrame;
use visual_player::config::{BarsConfig, FireConfig, FractalConfig};
use visual_player::viz::{
    FireAutomaton, FractalZoom, PixelSurface, RenderAlgorithm, SpectrumBars,
};

fn synthetic_frame() -> FrequencyFrame {
    let mut frame = FrequencyFrame::zeroed(2048);
    for (i, v) in frame.freq_domain.iter_mut().enumerate() {
        *v = (255 - (i / 4).min(255)) as u8;
    }
    for (i, v) in frame.time_domain.iter_mut().enumerate() {
        *v = (128.0 + 90.0 * (i as f32 * 0.05).sin()) as u8;
    }
    frame
}

fn bench_render(c: &mut Criterion) {
    let frame = synthetic_frame();

    c.bench_function("spectrum_bars_480x200", |b| {
        let mut bars = SpectrumBars::new(&BarsConfig::default(), 480, 200);
        let mut surface = PixelSurface::new(480, 200);
        b.iter(|| bars.render(black_box(&frame), 1.0, &mut surface));
    });

    c.bench_function("fire_640x360", |b| {
        let mut fire = FireAutomaton::new(&FireConfig::default(), 640, 360);
        let mut surface = PixelSurface::new(640, 360);
        b.iter(|| fire.render(black_box(&frame), 1.0, &mut surface));
    });

    c.bench_function("fractal_320x180", |b| {
        let mut fractal = FractalZoom::new(&FractalConfig::default(), 320, 180);
        let mut surface = PixelSurface::new(320, 180);
        b.iter(|| fractal.render(black_box(&frame), 1.0, &mut surface));
    });
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
