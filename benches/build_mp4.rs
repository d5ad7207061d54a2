//! Benchmark virtual `.mp4` layout with varying recording sizes.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use uuid::Uuid;

use vod_media::{Mp4FileBuilder, Recording, SampleFileDir, SampleIndexEncoder, VideoSampleEntry};

/// 30 fps recording with a key frame every 2 seconds.
fn make_recording(frames: i32) -> Recording {
    let mut e = SampleIndexEncoder::new();
    for i in 0..frames {
        let is_key = i % 60 == 0;
        let bytes = if is_key { 50_000 } else { 3_000 + (i % 7) * 100 };
        e.add_sample(3000, bytes, is_key);
    }
    Recording {
        sample_file_uuid: Uuid::nil(),
        sample_file_sha1: [0; 20],
        sample_file_bytes: e.sample_file_bytes,
        video_samples: e.video_samples,
        video_sync_samples: e.video_sync_samples,
        start_time_90k: 0,
        end_time_90k: e.total_duration_90k as i64,
        video_sample_entry_id: 1,
        video_index: e.video_index,
    }
}

fn make_entry() -> VideoSampleEntry {
    VideoSampleEntry {
        id: 1,
        sha1: [0x11; 20],
        width: 1920,
        height: 1080,
        data: vec![0u8; 100],
    }
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("mp4_build");
    let dir = Arc::new(SampleFileDir::new("/nonexistent"));

    // 1 minute: 1800 frames at 30 fps.
    let rec_1min = make_recording(1800);
    group.bench_function("full_1min_1800f", |b| {
        b.iter(|| {
            let mut builder = Mp4FileBuilder::new();
            builder.set_sample_entry(make_entry());
            builder.append(black_box(rec_1min.clone()), 0, 60 * 90000);
            builder.build(dir.clone()).unwrap()
        });
    });

    // Same recording, clipped window: forces the index scan.
    group.bench_function("clipped_1min_1800f", |b| {
        b.iter(|| {
            let mut builder = Mp4FileBuilder::new();
            builder.set_sample_entry(make_entry());
            builder.append(black_box(rec_1min.clone()), 15 * 90000, 45 * 90000);
            builder.build(dir.clone()).unwrap()
        });
    });

    // 10 minutes: 18000 frames.
    let rec_10min = make_recording(18_000);
    group.bench_function("full_10min_18000f", |b| {
        b.iter(|| {
            let mut builder = Mp4FileBuilder::new();
            builder.set_sample_entry(make_entry());
            builder.append(black_box(rec_10min.clone()), 0, 600 * 90000);
            builder.build(dir.clone()).unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
