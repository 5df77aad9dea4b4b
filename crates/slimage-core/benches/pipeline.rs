//! Benchmarks for the slimage transcoding pipeline.
//!
//! Run with: cargo bench -p slimage-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use slimage_core::pipeline::{
    payload, target_dimensions, CsvRecordSink, CsvRecordSource, ImageTranscoder,
};
use slimage_core::{Config, NoopObserver, PipelineDriver};
use std::io::Cursor;

fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }));
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("encode fixture");
    buffer.into_inner()
}

fn benchmark_target_dimensions(c: &mut Criterion) {
    c.bench_function("target_dimensions", |b| {
        b.iter(|| target_dimensions(black_box(4032), black_box(3024), black_box(800)))
    });
}

fn benchmark_transcode(c: &mut Criterion) {
    let transcoder = ImageTranscoder::from_config(&Config::default());
    let small = sample_png(640, 480);
    let wide = sample_png(1920, 1080);

    c.bench_function("transcode_640px_passthrough_size", |b| {
        b.iter(|| {
            let _ = transcoder.transcode(black_box(&small));
        })
    });

    c.bench_function("transcode_1920px_downscale", |b| {
        b.iter(|| {
            let _ = transcoder.transcode(black_box(&wide));
        })
    });
}

fn benchmark_payload(c: &mut Criterion) {
    let raw = sample_png(1024, 768);
    let encoded = payload::encode_inline(&raw);

    c.bench_function("payload_decode_inline", |b| {
        b.iter(|| {
            let _ = payload::decode_inline(black_box(encoded.as_bytes()));
        })
    });
}

fn benchmark_run_records(c: &mut Criterion) {
    let encoded = payload::encode_inline(&sample_png(1200, 900));
    let mut csv = String::from("id,imagen_base64\n");
    for i in 0..20 {
        csv.push_str(&format!("{i},{encoded}\n"));
    }

    let driver = PipelineDriver::new(Config::default());
    let rt = tokio::runtime::Runtime::new().expect("runtime");

    c.bench_function("run_records_20_rows", |b| {
        b.iter(|| {
            let mut source =
                CsvRecordSource::from_reader(csv.as_bytes(), "imagen_base64").expect("source");
            let mut sink =
                CsvRecordSink::from_writer(Vec::new(), source.schema()).expect("sink");
            let _ = rt.block_on(driver.run_records(&mut source, &mut sink, 20, &mut NoopObserver));
        })
    });
}

criterion_group!(
    benches,
    benchmark_target_dimensions,
    benchmark_transcode,
    benchmark_payload,
    benchmark_run_records,
);
criterion_main!(benches);
