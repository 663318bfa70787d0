use crate::draw::composite::{blank_surface, blend_into, composite_over, draw_image_into};
use crate::draw::geometry::{compute_image_bounds, ImageBounds, ImageSize, Rect, ViewTransform};
use crate::draw::model::{Color, LayerKind, Stroke, StrokeKind};
use crate::draw::strokes::StrokeStore;
use image::{Rgba, RgbaImage};

const ARROW_HEAD_ANGLE_DEG: f32 = 30.0;
/// Arrow head length in base-image pixels before the width-proportional part is added.
const ARROW_HEAD_BASE_LEN: f32 = 10.0;
const ARROW_HEAD_WIDTH_FACTOR: f32 = 3.0;
const MIN_STROKE_RADIUS_PX: f32 = 0.5;

/// Target of one raster pass: surface size, where the image sits on it, and how many
/// surface pixels one base-image pixel covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterFrame {
    pub size: ImageSize,
    pub bounds: ImageBounds,
    pub unit_scale: f32,
}

impl RasterFrame {
    /// Full-resolution frame: the surface is the base image.
    pub fn full(intrinsic: ImageSize) -> Self {
        Self {
            size: intrinsic,
            bounds: ImageBounds::full(intrinsic),
            unit_scale: 1.0,
        }
    }

    /// The image letterboxed into a surface of `target` pixels.
    pub fn fitted(target: ImageSize, intrinsic: ImageSize) -> Option<Self> {
        let container = Rect::from_size(target.width, target.height);
        let bounds = compute_image_bounds(container, intrinsic)?;
        Some(Self {
            size: target,
            bounds,
            unit_scale: bounds.w / intrinsic.width as f32,
        })
    }

    /// The on-screen frame for `container` under `view`. Surface pixel `(0, 0)` is the
    /// container's top-left corner.
    pub fn viewport(container: Rect, intrinsic: ImageSize, view: &ViewTransform) -> Option<Self> {
        let fitted = compute_image_bounds(container, intrinsic)?;
        let on_screen = view.transform_bounds(fitted);
        Some(Self {
            size: ImageSize::new(
                container.width.round() as u32,
                container.height.round() as u32,
            ),
            bounds: ImageBounds {
                x: on_screen.x - container.x,
                y: on_screen.y - container.y,
                ..on_screen
            },
            unit_scale: fitted.w / intrinsic.width as f32 * view.scale,
        })
    }

    fn to_pixels(&self, stroke: &Stroke) -> Vec<(f32, f32)> {
        stroke
            .points
            .iter()
            .map(|point| self.bounds.denormalize(*point))
            .collect()
    }
}

/// Strokes of one layer for a pass, committed plus an optional in-progress stroke on top.
#[derive(Debug, Clone, Copy)]
pub struct LayerPass<'a> {
    pub strokes: &'a [Stroke],
    pub active: Option<&'a Stroke>,
}

impl<'a> LayerPass<'a> {
    pub fn committed(strokes: &'a [Stroke]) -> Self {
        Self {
            strokes,
            active: None,
        }
    }

    fn iter(&self) -> impl Iterator<Item = &'a Stroke> {
        self.strokes.iter().chain(self.active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlendMode {
    Paint(Color),
    Clear,
}

/// Per-stroke coverage, clipped to the surface. Each stroke is stamped fully before it is
/// blended so overlapping segments of one stroke never double-blend.
struct CoverageMask {
    width: u32,
    height: u32,
    covered: Vec<bool>,
    min: (u32, u32),
    max: (u32, u32),
    any: bool,
}

impl CoverageMask {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            covered: vec![false; width as usize * height as usize],
            min: (u32::MAX, u32::MAX),
            max: (0, 0),
            any: false,
        }
    }

    fn mark(&mut self, x: u32, y: u32) {
        self.covered[y as usize * self.width as usize + x as usize] = true;
        self.min = (self.min.0.min(x), self.min.1.min(y));
        self.max = (self.max.0.max(x), self.max.1.max(y));
        self.any = true;
    }

    /// Pixel index range `[lo, hi)` along one axis for the continuous span `[a, b]`.
    fn clip_span(a: f32, b: f32, limit: u32) -> Option<(u32, u32)> {
        let lo = a.floor().max(0.0);
        let hi = (b.ceil() + 1.0).min(limit as f32);
        if !(lo < hi) {
            return None;
        }
        Some((lo as u32, hi as u32))
    }

    fn stamp_capsule(&mut self, start: (f32, f32), end: (f32, f32), radius: f32) {
        let min_x = start.0.min(end.0) - radius;
        let max_x = start.0.max(end.0) + radius;
        let min_y = start.1.min(end.1) - radius;
        let max_y = start.1.max(end.1) + radius;
        let Some((x0, x1)) = Self::clip_span(min_x, max_x, self.width) else {
            return;
        };
        let Some((y0, y1)) = Self::clip_span(min_y, max_y, self.height) else {
            return;
        };
        let radius_sq = radius * radius;
        for y in y0..y1 {
            for x in x0..x1 {
                let center = (x as f32 + 0.5, y as f32 + 0.5);
                if point_segment_distance_sq(center, start, end) <= radius_sq {
                    self.mark(x, y);
                }
            }
        }
    }

    /// Even-odd scanline fill sampled at pixel centers.
    fn fill_polygon(&mut self, vertices: &[(f32, f32)]) {
        if vertices.len() < 3 {
            return;
        }
        let min_y = vertices.iter().map(|v| v.1).fold(f32::INFINITY, f32::min);
        let max_y = vertices.iter().map(|v| v.1).fold(f32::NEG_INFINITY, f32::max);
        let Some((y0, y1)) = Self::clip_span(min_y, max_y, self.height) else {
            return;
        };
        let mut crossings = Vec::with_capacity(vertices.len());
        for y in y0..y1 {
            let yc = y as f32 + 0.5;
            crossings.clear();
            for (i, a) in vertices.iter().enumerate() {
                let b = vertices[(i + 1) % vertices.len()];
                if (a.1 <= yc) != (b.1 <= yc) {
                    crossings.push(a.0 + (yc - a.1) * (b.0 - a.0) / (b.1 - a.1));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for pair in crossings.chunks_exact(2) {
                let start = (pair[0] - 0.5).ceil().max(0.0);
                let end = (pair[1] - 0.5).ceil().min(self.width as f32);
                if !(start < end) {
                    continue;
                }
                for x in start as u32..end as u32 {
                    self.mark(x, y);
                }
            }
        }
    }

    fn apply(&self, surface: &mut RgbaImage, mode: BlendMode) {
        if !self.any {
            return;
        }
        for y in self.min.1..=self.max.1 {
            let row = y as usize * self.width as usize;
            for x in self.min.0..=self.max.0 {
                if !self.covered[row + x as usize] {
                    continue;
                }
                match mode {
                    BlendMode::Paint(color) => blend_into(surface, x, y, color),
                    BlendMode::Clear => surface.put_pixel(x, y, Rgba([0, 0, 0, 0])),
                }
            }
        }
    }
}

fn point_segment_distance_sq(point: (f32, f32), start: (f32, f32), end: (f32, f32)) -> f32 {
    let vx = end.0 - start.0;
    let vy = end.1 - start.1;
    let wx = point.0 - start.0;
    let wy = point.1 - start.1;
    let len_sq = vx * vx + vy * vy;
    if len_sq <= f32::EPSILON {
        return wx * wx + wy * wy;
    }
    let t = ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0);
    let dx = point.0 - (start.0 + vx * t);
    let dy = point.1 - (start.1 + vy * t);
    dx * dx + dy * dy
}

fn stamp_polyline(mask: &mut CoverageMask, points: &[(f32, f32)], radius: f32) {
    match points {
        [] => {}
        [only] => mask.stamp_capsule(*only, *only, radius),
        _ => {
            for segment in points.windows(2) {
                mask.stamp_capsule(segment[0], segment[1], radius);
            }
        }
    }
}

fn stamp_arrow(mask: &mut CoverageMask, points: &[(f32, f32)], radius: f32, head_len: f32) {
    let (Some(&start), Some(&end)) = (points.first(), points.last()) else {
        return;
    };
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let len = (dx * dx + dy * dy).sqrt();
    if len <= 0.5 {
        mask.stamp_capsule(start, end, radius);
        return;
    }
    let unit = (dx / len, dy / len);
    let head_len = head_len.min(len * 0.5);
    let angle = ARROW_HEAD_ANGLE_DEG.to_radians();
    let rotate = |(x, y): (f32, f32), theta: f32| {
        let (sin, cos) = theta.sin_cos();
        (x * cos - y * sin, x * sin + y * cos)
    };
    let wing = |theta: f32| {
        let dir = rotate(unit, theta);
        (end.0 - dir.0 * head_len, end.1 - dir.1 * head_len)
    };
    let left = wing(angle);
    let right = wing(-angle);
    let shaft_end = (
        end.0 - unit.0 * head_len * angle.cos(),
        end.1 - unit.1 * head_len * angle.cos(),
    );

    mask.stamp_capsule(start, shaft_end, radius);
    mask.fill_polygon(&[end, left, right]);
}

/// Rasterize one stroke onto a layer surface. Degenerate geometry draws nothing.
pub fn rasterize_stroke(surface: &mut RgbaImage, stroke: &Stroke, frame: &RasterFrame) {
    if !stroke.visible || !stroke.is_drawable() {
        return;
    }
    let (width, height) = surface.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let points = frame.to_pixels(stroke);
    let width_px = stroke.width.max(0.0) * frame.unit_scale;
    let radius = (width_px * 0.5).max(MIN_STROKE_RADIUS_PX);
    let mut mask = CoverageMask::new(width, height);

    let mode = match stroke.kind {
        StrokeKind::Freehand | StrokeKind::Line => {
            stamp_polyline(&mut mask, &points, radius);
            BlendMode::Paint(stroke.color)
        }
        StrokeKind::Arrow => {
            let head_len =
                ARROW_HEAD_BASE_LEN * frame.unit_scale + width_px * ARROW_HEAD_WIDTH_FACTOR;
            stamp_arrow(&mut mask, &points, radius, head_len);
            BlendMode::Paint(stroke.color)
        }
        StrokeKind::Polygon => {
            mask.fill_polygon(&points);
            BlendMode::Paint(stroke.color)
        }
        StrokeKind::Eraser => {
            stamp_polyline(&mut mask, &points, radius);
            BlendMode::Clear
        }
    };
    mask.apply(surface, mode);
}

/// One layer's strokes, in creation order, on a transparent surface.
pub fn render_layer_overlay(frame: &RasterFrame, layer: LayerPass<'_>) -> RgbaImage {
    let mut surface = blank_surface(frame.size.width, frame.size.height, Color::TRANSPARENT);
    for stroke in layer.iter() {
        rasterize_stroke(&mut surface, stroke, frame);
    }
    surface
}

/// Background, then the base image, then each layer composited in order.
///
/// Erasers clear only their own layer's surface, never the base image.
pub fn render_pass(
    frame: &RasterFrame,
    background: Color,
    base: Option<&RgbaImage>,
    layers: &[LayerPass<'_>],
) -> RgbaImage {
    let mut surface = blank_surface(frame.size.width, frame.size.height, background);
    if let Some(base) = base {
        draw_image_into(&mut surface, base, frame.bounds);
    }
    for layer in layers {
        if layer.iter().next().is_none() {
            continue;
        }
        let overlay = render_layer_overlay(frame, *layer);
        composite_over(&mut surface, &overlay);
    }
    surface
}

/// What the canvas shows: letterbox background, base image under the view transform, then
/// every visible layer including its in-progress stroke.
pub fn render_viewport(
    container: Rect,
    base: &RgbaImage,
    store: &StrokeStore,
    view: &ViewTransform,
    background: Color,
) -> Option<RgbaImage> {
    let intrinsic = ImageSize::new(base.width(), base.height());
    let frame = RasterFrame::viewport(container, intrinsic, view)?;
    let layers: Vec<LayerPass<'_>> = LayerKind::ALL
        .into_iter()
        .map(|kind| store.layer(kind))
        .filter(|layer| layer.visible)
        .map(|layer| LayerPass {
            strokes: &layer.strokes,
            active: layer.active.as_ref(),
        })
        .collect();
    Some(render_pass(&frame, background, Some(base), &layers))
}
