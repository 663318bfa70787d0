use crate::draw::model::Point;

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 10.0;

/// A position in device pixels, relative to the container's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: ScreenPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(self, other: ScreenPoint) -> ScreenPoint {
        ScreenPoint::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width > f32::EPSILON && self.height > f32::EPSILON)
            || !self.width.is_finite()
            || !self.height.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Largest size with the same aspect ratio whose longer edge is at most `max_edge`.
    pub fn fit_within(self, max_edge: u32) -> ImageSize {
        let longest = self.width.max(self.height);
        if longest <= max_edge || longest == 0 {
            return self;
        }
        let ratio = max_edge as f64 / longest as f64;
        ImageSize {
            width: ((self.width as f64 * ratio).round() as u32).max(1),
            height: ((self.height as f64 * ratio).round() as u32).max(1),
        }
    }
}

/// Where the image sits inside a container after aspect-preserving fit.
///
/// This is the origin of every normalized-point conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageBounds {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl ImageBounds {
    /// Bounds covering a raster of `size` exactly, for full-resolution passes.
    pub fn full(size: ImageSize) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: size.width as f32,
            h: size.height as f32,
        }
    }

    pub fn denormalize(&self, point: Point) -> (f32, f32) {
        (self.x + point.x * self.w, self.y + point.y * self.h)
    }

    pub fn normalize(&self, x: f32, y: f32) -> Option<Point> {
        if self.w.abs() <= f32::EPSILON || self.h.abs() <= f32::EPSILON {
            return None;
        }
        Some(Point::new((x - self.x) / self.w, (y - self.y) / self.h))
    }
}

/// Letterbox/pillarbox fit of `intrinsic` inside `container`.
///
/// Returns `None` for a zero-sized container or image; callers treat that as a no-op.
pub fn compute_image_bounds(container: Rect, intrinsic: ImageSize) -> Option<ImageBounds> {
    if container.is_degenerate() || intrinsic.is_empty() {
        return None;
    }
    let iw = intrinsic.width as f32;
    let ih = intrinsic.height as f32;
    let scale = (container.width / iw).min(container.height / ih);
    let w = iw * scale;
    let h = ih * scale;
    Some(ImageBounds {
        x: container.x + (container.width - w) * 0.5,
        y: container.y + (container.height - h) * 0.5,
        w,
        h,
    })
}

/// Pan/zoom mapping from world (container) space to screen pixels:
/// `screen = world * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        offset_x: 0.0,
        offset_y: 0.0,
        scale: 1.0,
    };

    pub fn apply(&self, x: f32, y: f32) -> ScreenPoint {
        ScreenPoint::new(x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }

    pub fn invert(&self, screen: ScreenPoint) -> Option<(f32, f32)> {
        if self.scale.abs() <= f32::EPSILON || !self.scale.is_finite() {
            return None;
        }
        Some((
            (screen.x - self.offset_x) / self.scale,
            (screen.y - self.offset_y) / self.scale,
        ))
    }

    /// Image bounds as they appear on screen under this transform.
    pub fn transform_bounds(&self, bounds: ImageBounds) -> ImageBounds {
        let origin = self.apply(bounds.x, bounds.y);
        ImageBounds {
            x: origin.x,
            y: origin.y,
            w: bounds.w * self.scale,
            h: bounds.h * self.scale,
        }
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Set the scale to `target_scale` (clamped) while keeping the world point under
    /// `anchor` fixed on screen. Shared by wheel zoom and pinch zoom.
    pub fn zoom_about(&mut self, anchor: ScreenPoint, target_scale: f32) {
        if !target_scale.is_finite() {
            return;
        }
        let Some((world_x, world_y)) = self.invert(anchor) else {
            return;
        };
        self.scale = target_scale.clamp(MIN_SCALE, MAX_SCALE);
        self.offset_x = anchor.x - world_x * self.scale;
        self.offset_y = anchor.y - world_y * self.scale;
    }

    /// Multiply the current scale by `factor` about `anchor`.
    pub fn zoom_by(&mut self, anchor: ScreenPoint, factor: f32) {
        self.zoom_about(anchor, self.scale * factor);
    }
}

/// Screen pixel → normalized image point, through the view transform and the image's
/// letterboxed bounds inside `container`.
pub fn to_world(
    screen: ScreenPoint,
    view: &ViewTransform,
    container: Rect,
    intrinsic: ImageSize,
) -> Option<Point> {
    let bounds = compute_image_bounds(container, intrinsic)?;
    let (world_x, world_y) = view.invert(screen)?;
    bounds.normalize(world_x, world_y)
}

/// Normalized image point → screen pixel. Exact inverse of [`to_world`].
pub fn to_screen(point: Point, bounds: ImageBounds, view: &ViewTransform) -> ScreenPoint {
    let (world_x, world_y) = bounds.denormalize(point);
    view.apply(world_x, world_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn wide_image_is_letterboxed_vertically() {
        let bounds = compute_image_bounds(
            Rect::new(0.0, 0.0, 400.0, 400.0),
            ImageSize::new(200, 100),
        )
        .expect("bounds");
        assert_eq!(bounds.x, 0.0);
        assert_eq!(bounds.w, 400.0);
        assert_eq!(bounds.h, 200.0);
        assert_eq!(bounds.y, 100.0);
    }

    #[test]
    fn tall_image_is_pillarboxed_with_container_offset() {
        let bounds = compute_image_bounds(
            Rect::new(10.0, 20.0, 300.0, 100.0),
            ImageSize::new(50, 100),
        )
        .expect("bounds");
        assert_eq!(bounds.h, 100.0);
        assert_eq!(bounds.w, 50.0);
        assert_eq!(bounds.x, 10.0 + 125.0);
        assert_eq!(bounds.y, 20.0);
    }

    #[test]
    fn zero_sized_container_short_circuits() {
        let flat = Rect::new(0.0, 0.0, 0.0, 300.0);
        assert!(compute_image_bounds(flat, ImageSize::new(10, 10)).is_none());
        assert!(to_world(
            ScreenPoint::new(5.0, 5.0),
            &ViewTransform::IDENTITY,
            Rect::default(),
            ImageSize::new(10, 10),
        )
        .is_none());
    }

    #[test]
    fn screen_world_roundtrip_across_transforms_and_containers() {
        let containers = [
            Rect::new(0.0, 0.0, 800.0, 600.0),
            Rect::new(13.0, 7.0, 333.0, 901.0),
            Rect::new(0.0, 0.0, 1920.0, 1080.0),
        ];
        let images = [ImageSize::new(1024, 768), ImageSize::new(300, 1200)];
        let views = [
            ViewTransform::IDENTITY,
            ViewTransform {
                offset_x: -120.0,
                offset_y: 45.5,
                scale: 2.5,
            },
            ViewTransform {
                offset_x: 300.0,
                offset_y: -80.0,
                scale: 0.1,
            },
            ViewTransform {
                offset_x: 1.0,
                offset_y: 2.0,
                scale: 10.0,
            },
        ];
        let points = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.25, 0.75),
            Point::new(0.5, 0.1),
        ];

        for container in containers {
            for image in images {
                let bounds = compute_image_bounds(container, image).expect("bounds");
                for view in views {
                    for point in points {
                        let screen = to_screen(point, bounds, &view);
                        let back = to_world(screen, &view, container, image).expect("world");
                        assert!(
                            close(back.x, point.x) && close(back.y, point.y),
                            "{point:?} -> {screen:?} -> {back:?} ({view:?}, {container:?})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn repeated_zoom_about_keeps_anchor_world_point_fixed() {
        let mut view = ViewTransform {
            offset_x: 37.0,
            offset_y: -22.0,
            scale: 1.0,
        };
        let anchor = ScreenPoint::new(211.0, 189.0);
        let (wx, wy) = view.invert(anchor).expect("invertible");

        for _ in 0..40 {
            view.zoom_by(anchor, 1.1);
            let projected = view.apply(wx, wy);
            assert!(close(projected.x, anchor.x) && close(projected.y, anchor.y));
        }
        assert_eq!(view.scale, MAX_SCALE);

        for _ in 0..80 {
            view.zoom_by(anchor, 0.9);
        }
        assert_eq!(view.scale, MIN_SCALE);
        let projected = view.apply(wx, wy);
        assert!(close(projected.x, anchor.x) && close(projected.y, anchor.y));
    }

    #[test]
    fn fit_within_preserves_aspect_ratio() {
        let fitted = ImageSize::new(4000, 3000).fit_within(2048);
        assert_eq!(fitted, ImageSize::new(2048, 1536));
        assert_eq!(ImageSize::new(640, 480).fit_within(2048), ImageSize::new(640, 480));
    }
}
