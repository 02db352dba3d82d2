//! Benchmarks for the clipsift classification pipeline.
//!
//! Run with: cargo bench -p clipsift-core

use clipsift_core::backend::preprocess::preprocess;
use clipsift_core::config::{LimitsConfig, ThumbnailConfig};
use clipsift_core::math::{argmax, softmax};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, Rgb, RgbImage};

fn benchmark_preprocess(c: &mut Criterion) {
    let img = DynamicImage::new_rgb8(1920, 1080);

    c.bench_function("clip_preprocess_1080p", |b| {
        b.iter(|| {
            let _ = preprocess(black_box(&img), 224);
        })
    });
}

fn benchmark_softmax_argmax(c: &mut Criterion) {
    let logits: Vec<f32> = (0..32).map(|i| (i as f32 * 0.37).sin() * 30.0).collect();

    c.bench_function("softmax_argmax_32_labels", |b| {
        b.iter(|| {
            let probs = softmax(black_box(&logits));
            let _ = argmax(&probs);
        })
    });
}

fn benchmark_decode(c: &mut Criterion) {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Skipping decode benchmark: {e}");
            return;
        }
    };
    let path = dir.path().join("bench.png");
    if let Err(e) = RgbImage::from_pixel(640, 480, Rgb([200, 40, 40])).save(&path) {
        eprintln!("Skipping decode benchmark: {e}");
        return;
    }

    let decoder = clipsift_core::pipeline::ImageDecoder::new(LimitsConfig::default());

    c.bench_function("decode_png_640x480", |b| {
        b.iter(|| {
            let _ = decoder.decode(black_box(&path));
        })
    });
}

fn benchmark_thumbnail(c: &mut Criterion) {
    let img = DynamicImage::new_rgb8(1920, 1080);
    let generator = clipsift_core::pipeline::ThumbnailGenerator::new(ThumbnailConfig {
        enabled: true,
        ..ThumbnailConfig::default()
    });

    c.bench_function("thumbnail_100px", |b| {
        b.iter(|| {
            let _ = generator.generate(black_box(&img));
        })
    });
}

criterion_group!(
    benches,
    benchmark_preprocess,
    benchmark_softmax_argmax,
    benchmark_decode,
    benchmark_thumbnail,
);
criterion_main!(benches);
