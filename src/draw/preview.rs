use crate::draw::composite::{composite_over, draw_image_into};
use crate::draw::geometry::ImageSize;
use crate::draw::model::LayerKind;
use crate::draw::render::{render_layer_overlay, LayerPass, RasterFrame};
use crate::draw::strokes::StrokeStore;
use image::RgbaImage;
use std::time::{Duration, Instant};

pub const PREVIEW_MAX_EDGE_LIMIT: u32 = 2048;

/// Fires once after mutations stop for `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewScheduler {
    delay: Duration,
    dirty_since: Option<Instant>,
}

impl PreviewScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            dirty_since: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a mutation. Each call restarts the idle window.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.dirty_since = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.dirty_since.is_some()
    }

    pub fn cancel(&mut self) {
        self.dirty_since = None;
    }

    /// `true` exactly once per quiet period, when `delay` has elapsed since the last mark.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.dirty_since {
            Some(since) if now.saturating_duration_since(since) >= self.delay => {
                self.dirty_since = None;
                true
            }
            _ => false,
        }
    }
}

/// The two preview passes for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerPreview {
    pub layer: LayerKind,
    /// Base image with this layer composited on top.
    pub composite: RgbaImage,
    /// The layer alone on a transparent surface.
    pub overlay: RgbaImage,
}

/// Render thumbnails for both layers at no more than `max_edge` pixels on the long side.
/// A hidden layer yields an empty overlay.
pub fn render_layer_previews(
    base: &RgbaImage,
    strokes: &StrokeStore,
    max_edge: u32,
) -> Vec<LayerPreview> {
    let intrinsic = ImageSize::new(base.width(), base.height());
    let target = intrinsic.fit_within(max_edge.clamp(1, PREVIEW_MAX_EDGE_LIMIT));
    let Some(frame) = RasterFrame::fitted(target, intrinsic) else {
        return Vec::new();
    };

    // Resample the base once; both layers reuse it.
    let mut scaled_base = RgbaImage::new(target.width, target.height);
    draw_image_into(&mut scaled_base, base, frame.bounds);

    let previews: Vec<LayerPreview> = LayerKind::ALL
        .into_iter()
        .map(|layer| {
            let state = strokes.layer(layer);
            let committed = if state.visible { state.strokes.as_slice() } else { &[] };
            let pass = LayerPass::committed(committed);
            let overlay = render_layer_overlay(&frame, pass);
            let mut composite = scaled_base.clone();
            composite_over(&mut composite, &overlay);
            LayerPreview {
                layer,
                composite,
                overlay,
            }
        })
        .collect();
    tracing::debug!(
        width = target.width,
        height = target.height,
        "layer previews rendered"
    );
    previews
}
