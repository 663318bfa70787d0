use serde::{Deserialize, Serialize};
use std::fmt;

/// A coordinate normalized to the image's intrinsic bounding box.
///
/// `(0, 0)` is the top-left corner of the image and `(1, 1)` the bottom-right corner,
/// independent of zoom, pan or container size. Values slightly outside `[0, 1]` are legal
/// (a stroke may run past the image edge) and are clipped at rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub fn to_rgba_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_rgba_array(color: [u8; 4]) -> Self {
        Self::rgba(color[0], color[1], color[2], color[3])
    }

    /// `#rrggbb`, alpha dropped. Used when naming colors in instruction text.
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeKind {
    Freehand,
    Line,
    Arrow,
    Polygon,
    Eraser,
}

impl StrokeKind {
    /// Kinds whose geometry is always exactly a start and an end point.
    pub fn is_segment(self) -> bool {
        matches!(self, StrokeKind::Line | StrokeKind::Arrow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Lighting,
    Materiality,
}

impl LayerKind {
    pub const ALL: [LayerKind; 2] = [LayerKind::Lighting, LayerKind::Materiality];

    pub fn as_label(self) -> &'static str {
        match self {
            LayerKind::Lighting => "lighting",
            LayerKind::Materiality => "materiality",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StrokeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Color,
    /// Width in base-image pixels; scaled to each raster target.
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Color::rgb(255, 255, 255),
            width: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    pub kind: StrokeKind,
    pub points: Vec<Point>,
    pub color: Color,
    pub width: f32,
    pub visible: bool,
}

impl Stroke {
    pub fn new(id: StrokeId, kind: StrokeKind, start: Point, style: StrokeStyle) -> Self {
        Self {
            id,
            kind,
            points: vec![start],
            color: style.color,
            width: style.width,
            visible: true,
        }
    }

    /// Whether rasterizing this stroke can change any pixel.
    pub fn is_drawable(&self) -> bool {
        match self.kind {
            StrokeKind::Polygon => self.points.len() >= 3,
            kind if kind.is_segment() => match self.points.as_slice() {
                [start, .., end] => start.distance_sq(*end) > 0.0,
                _ => false,
            },
            _ => !self.points.is_empty(),
        }
    }
}

/// The tool a pointer gesture draws with: target layer, stroke kind and style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolConfig {
    pub layer: LayerKind,
    pub kind: StrokeKind,
    pub style: StrokeStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub strokes: Vec<Stroke>,
    pub visible: bool,
    pub active: Option<Stroke>,
}

impl Layer {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            strokes: Vec::new(),
            visible: true,
            active: None,
        }
    }

    /// Visible and holding at least one visible, drawable committed stroke.
    pub fn has_visible_strokes(&self) -> bool {
        self.visible
            && self
                .strokes
                .iter()
                .any(|stroke| stroke.visible && stroke.is_drawable())
    }
}
