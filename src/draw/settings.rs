use crate::draw::assets::DEFAULT_REFERENCE_PALETTE;
use crate::draw::compile::{OutputResolution, MAX_CREATIVE_FREEDOM};
use crate::draw::model::{Color, LayerKind, StrokeStyle};
use crate::draw::preview::PREVIEW_MAX_EDGE_LIMIT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MIN_PREVIEW_EDGE: u32 = 64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineSettings {
    #[serde(default = "default_lighting_color")]
    pub lighting_color: Color,
    #[serde(default = "default_lighting_width")]
    pub lighting_width: f32,
    #[serde(default = "default_materiality_color")]
    pub materiality_color: Color,
    #[serde(default = "default_materiality_width")]
    pub materiality_width: f32,
    #[serde(default = "default_eraser_width")]
    pub eraser_width: f32,
    #[serde(default = "default_wheel_zoom_step")]
    pub wheel_zoom_step: f32,
    #[serde(default = "default_preview_debounce_ms")]
    #[serde(alias = "preview_delay_ms")]
    pub preview_debounce_ms: u64,
    #[serde(default = "default_preview_max_edge")]
    pub preview_max_edge: u32,
    #[serde(default = "default_letterbox_color")]
    pub letterbox_color: Color,
    #[serde(default = "default_creative_freedom")]
    pub creative_freedom: u8,
    #[serde(default)]
    pub output_resolution: OutputResolution,
    #[serde(default = "default_reference_palette")]
    pub reference_palette: Vec<Color>,
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_lighting_color() -> Color {
    Color::rgb(255, 214, 102)
}

fn default_lighting_width() -> f32 {
    24.0
}

fn default_materiality_color() -> Color {
    DEFAULT_REFERENCE_PALETTE[0]
}

fn default_materiality_width() -> f32 {
    12.0
}

fn default_eraser_width() -> f32 {
    32.0
}

fn default_wheel_zoom_step() -> f32 {
    1.1
}

fn default_preview_debounce_ms() -> u64 {
    300
}

fn default_preview_max_edge() -> u32 {
    1024
}

fn default_letterbox_color() -> Color {
    Color::rgb(24, 24, 28)
}

fn default_creative_freedom() -> u8 {
    35
}

fn default_reference_palette() -> Vec<Color> {
    DEFAULT_REFERENCE_PALETTE.to_vec()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            lighting_color: default_lighting_color(),
            lighting_width: default_lighting_width(),
            materiality_color: default_materiality_color(),
            materiality_width: default_materiality_width(),
            eraser_width: default_eraser_width(),
            wheel_zoom_step: default_wheel_zoom_step(),
            preview_debounce_ms: default_preview_debounce_ms(),
            preview_max_edge: default_preview_max_edge(),
            letterbox_color: default_letterbox_color(),
            creative_freedom: default_creative_freedom(),
            output_resolution: OutputResolution::default(),
            reference_palette: default_reference_palette(),
            debug_logging: false,
        }
    }
}

fn sanitize_width(width: &mut f32, fallback: f32) -> bool {
    if width.is_finite() && *width > 0.0 {
        return false;
    }
    *width = fallback;
    true
}

impl EngineSettings {
    pub fn stroke_style(&self, layer: LayerKind) -> StrokeStyle {
        match layer {
            LayerKind::Lighting => StrokeStyle {
                color: self.lighting_color,
                width: self.lighting_width,
            },
            LayerKind::Materiality => StrokeStyle {
                color: self.materiality_color,
                width: self.materiality_width,
            },
        }
    }

    pub fn preview_delay(&self) -> Duration {
        Duration::from_millis(self.preview_debounce_ms)
    }

    /// Pull out-of-range values back to something usable. Returns whether anything changed.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;

        let edge = self.preview_max_edge.clamp(MIN_PREVIEW_EDGE, PREVIEW_MAX_EDGE_LIMIT);
        changed |= edge != self.preview_max_edge;
        self.preview_max_edge = edge;

        if !(self.wheel_zoom_step.is_finite() && self.wheel_zoom_step > 1.0) {
            self.wheel_zoom_step = default_wheel_zoom_step();
            changed = true;
        }

        let freedom = self.creative_freedom.min(MAX_CREATIVE_FREEDOM);
        changed |= freedom != self.creative_freedom;
        self.creative_freedom = freedom;

        changed |= sanitize_width(&mut self.lighting_width, default_lighting_width());
        changed |= sanitize_width(&mut self.materiality_width, default_materiality_width());
        changed |= sanitize_width(&mut self.eraser_width, default_eraser_width());

        if self.reference_palette.is_empty() {
            self.reference_palette = default_reference_palette();
            changed = true;
        }

        changed
    }
}
