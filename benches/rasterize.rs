use criterion::{criterion_group, criterion_main, Criterion};
use image::{Rgba, RgbaImage};
use render_annotator::draw::assets::LoadedImage;
use render_annotator::draw::geometry::Rect;
use render_annotator::draw::render::{render_pass, LayerPass, RasterFrame};
use render_annotator::draw::{AnnotationSession, Color, LayerKind, PointerEvent, StrokeKind};
use std::time::Instant;

fn annotated_session() -> AnnotationSession {
    let mut session = AnnotationSession::default();
    session.import_base(LoadedImage::new(
        "bench",
        RgbaImage::from_pixel(2048, 1536, Rgba([90, 90, 90, 255])),
    ));
    session.set_container(Rect::new(0.0, 0.0, 1024.0, 768.0));
    let now = Instant::now();

    for row in 0..20u64 {
        let y = 20.0 + row as f32 * 35.0;
        session.pointer_down(PointerEvent::primary(row, 10.0, y), now);
        for step in 1..=50 {
            let x = 10.0 + step as f32 * 19.0;
            session.pointer_move(PointerEvent::primary(row, x, y + (step % 7) as f32), now);
        }
        session.pointer_up(PointerEvent::primary(row, 1000.0, y), now);
    }

    session.set_active_layer(LayerKind::Materiality);
    session.set_tool_kind(LayerKind::Materiality, StrokeKind::Polygon);
    for (i, corner) in [(100.0, 100.0), (600.0, 120.0), (640.0, 600.0), (80.0, 560.0)]
        .into_iter()
        .enumerate()
    {
        let id = 100 + i as u64;
        session.pointer_down(PointerEvent::primary(id, corner.0, corner.1), now);
        session.pointer_up(PointerEvent::primary(id, corner.0, corner.1), now);
    }
    session.double_click(now);
    session
}

fn bench_rasterize(c: &mut Criterion) {
    let session = annotated_session();
    let Some(base) = session.base() else {
        return;
    };
    let frame = RasterFrame::full(base.size());
    let lighting = LayerPass::committed(session.strokes().strokes(LayerKind::Lighting));

    c.bench_function("lighting_full_resolution", |b| {
        b.iter(|| render_pass(&frame, Color::TRANSPARENT, Some(&base.pixels), &[lighting]))
    });
    c.bench_function("viewport_1024x768", |b| b.iter(|| session.render_viewport()));
    c.bench_function("compile_request", |b| b.iter(|| session.compile()));
}

criterion_group!(benches, bench_rasterize);
criterion_main!(benches);
