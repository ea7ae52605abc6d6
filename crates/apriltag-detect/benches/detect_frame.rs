use criterion::{criterion_group, criterion_main, Criterion};

use apriltag_detect::{Detector, DetectorConfig};
use apriltag_families::builtins::TAG36H11;
use apriltag_print::{corners_from_similarity, Scene};

fn vga_scene() -> apriltag_core::GrayImage {
    let mut scene = Scene::new(640, 480, 255);
    for (id, cx, cy, side, theta) in [
        (11u32, 160.0f32, 140.0f32, 120.0f32, 0.1f32),
        (42, 420.0, 160.0, 96.0, -0.35),
        (310, 330.0, 360.0, 140.0, 0.7),
    ] {
        scene
            .place_tag(
                TAG36H11,
                id,
                16,
                &corners_from_similarity(cx, cy, side, theta),
            )
            .expect("place tag");
    }
    scene.into_image()
}

fn bench_detect(c: &mut Criterion) {
    let image = vga_scene();
    let detector = Detector::new(DetectorConfig::new(TAG36H11));

    c.bench_function("detect_vga_3tags", |b| {
        b.iter(|| {
            let dets = detector.detect(&image.view()).expect("detect");
            assert_eq!(dets.len(), 3);
            dets
        })
    });
}

criterion_group!(benches, bench_detect);
criterion_main!(benches);
