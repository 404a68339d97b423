use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mask_blur::{
    blur_ground_truth, blur_rect, blur_with_path, BlurPath, BlurQuality, BlurStyle, CreateMode,
    Mask, RectF, RectI,
};

fn disc(n: i32) -> Mask {
    let c = (n - 1) as f32 / 2.0;
    let r = n as f32 / 3.0;
    let mut pixels = Vec::with_capacity((n * n) as usize);
    for y in 0..n {
        for x in 0..n {
            let (dx, dy) = (x as f32 - c, y as f32 - c);
            pixels.push(if dx * dx + dy * dy <= r * r { 255 } else { 0 });
        }
    }
    Mask::from_a8_pixels(RectI::new(0, 0, n, n), n as u32, pixels).unwrap()
}

fn bench_mask_paths(c: &mut Criterion) {
    let src = disc(256);
    let mut group = c.benchmark_group("mask_blur");
    for &(radius, quality) in &[
        (2.0f32, BlurQuality::Low),
        (8.0, BlurQuality::Low),
        (8.0, BlurQuality::High),
        (20.0, BlurQuality::High),
    ] {
        for path in [BlurPath::Separable, BlurPath::SummedArea] {
            let id = BenchmarkId::new(format!("{path:?}/{quality:?}"), radius);
            group.bench_with_input(id, &radius, |b, &radius| {
                b.iter(|| {
                    black_box(
                        blur_with_path(&src, radius, BlurStyle::Normal, quality, path).unwrap(),
                    )
                })
            });
        }
    }
    group.finish();
}

fn bench_rect(c: &mut Criterion) {
    let rect = RectF::new(10.0, 10.0, 310.0, 210.0);
    c.bench_function("blur_rect_r12", |b| {
        b.iter(|| {
            black_box(
                blur_rect(
                    black_box(rect),
                    12.0,
                    BlurStyle::Normal,
                    CreateMode::ComputeBoundsAndRenderImage,
                )
                .unwrap(),
            )
        })
    });
}

fn bench_ground_truth(c: &mut Criterion) {
    let src = disc(64);
    c.bench_function("ground_truth_r8", |b| {
        b.iter(|| black_box(blur_ground_truth(&src, 8.0, BlurStyle::Normal).unwrap()))
    });
}

criterion_group!(mask_blur_benches, bench_mask_paths, bench_rect, bench_ground_truth);
criterion_main!(mask_blur_benches);
