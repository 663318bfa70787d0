use crate::draw::model::{Layer, LayerKind, Point, Stroke, StrokeId, StrokeKind, ToolConfig};

/// Two vertices closer than this (in normalized units) are treated as the same vertex.
/// A double click delivers its own pointer-down at the closing vertex; this keeps it from
/// being added twice.
const POLYGON_VERTEX_EPSILON_SQ: f32 = 1e-8;

/// Owns both annotation layers and the single in-progress stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStore {
    lighting: Layer,
    materiality: Layer,
    next_id: u64,
}

impl Default for StrokeStore {
    fn default() -> Self {
        Self {
            lighting: Layer::new(LayerKind::Lighting),
            materiality: Layer::new(LayerKind::Materiality),
            next_id: 1,
        }
    }
}

impl StrokeStore {
    pub fn layer(&self, kind: LayerKind) -> &Layer {
        match kind {
            LayerKind::Lighting => &self.lighting,
            LayerKind::Materiality => &self.materiality,
        }
    }

    fn layer_mut(&mut self, kind: LayerKind) -> &mut Layer {
        match kind {
            LayerKind::Lighting => &mut self.lighting,
            LayerKind::Materiality => &mut self.materiality,
        }
    }

    pub fn strokes(&self, kind: LayerKind) -> &[Stroke] {
        &self.layer(kind).strokes
    }

    pub fn set_visible(&mut self, kind: LayerKind, visible: bool) {
        self.layer_mut(kind).visible = visible;
    }

    /// The in-progress stroke and the layer it belongs to.
    pub fn active(&self) -> Option<(LayerKind, &Stroke)> {
        LayerKind::ALL
            .into_iter()
            .find_map(|kind| self.layer(kind).active.as_ref().map(|stroke| (kind, stroke)))
    }

    pub fn has_active(&self) -> bool {
        self.active().is_some()
    }

    fn active_mut(&mut self) -> Option<&mut Stroke> {
        if self.lighting.active.is_some() {
            self.lighting.active.as_mut()
        } else {
            self.materiality.active.as_mut()
        }
    }

    fn allocate_id(&mut self) -> StrokeId {
        let id = StrokeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Start a new in-progress stroke. Any previous uncommitted stroke is dropped.
    pub fn begin_stroke(&mut self, tool: ToolConfig, start: Point) -> StrokeId {
        self.discard_active();
        let id = self.allocate_id();
        self.layer_mut(tool.layer).active = Some(Stroke::new(id, tool.kind, start, tool.style));
        id
    }

    /// Feed a pointer sample into the in-progress stroke.
    ///
    /// Freehand and eraser strokes keep every sample. Line and arrow strokes keep exactly
    /// two points, the second one following the pointer. Polygons only grow through
    /// [`StrokeStore::add_polygon_vertex`].
    pub fn append_point(&mut self, point: Point) -> bool {
        let Some(stroke) = self.active_mut() else {
            return false;
        };
        match stroke.kind {
            StrokeKind::Freehand | StrokeKind::Eraser => {
                stroke.points.push(point);
                true
            }
            StrokeKind::Line | StrokeKind::Arrow => {
                stroke.points.truncate(1);
                stroke.points.push(point);
                true
            }
            StrokeKind::Polygon => false,
        }
    }

    /// Move the in-progress stroke into its layer's committed list.
    ///
    /// Polygons are only committed through [`StrokeStore::close_polygon`]. A line or arrow
    /// that ends where it started is dropped.
    pub fn commit_stroke(&mut self) -> Option<StrokeId> {
        let (kind, stroke) = self.active()?;
        if stroke.kind == StrokeKind::Polygon {
            return None;
        }
        let layer = self.layer_mut(kind);
        let stroke = layer.active.take()?;
        if !stroke.is_drawable() {
            tracing::debug!(stroke = stroke.id.0, "zero-length stroke discarded");
            return None;
        }
        let id = stroke.id;
        layer.strokes.push(stroke);
        Some(id)
    }

    /// Append a vertex to the in-progress polygon, starting one with `tool` if none is open.
    pub fn add_polygon_vertex(&mut self, tool: ToolConfig, point: Point) -> StrokeId {
        if let Some(stroke) = self.active_mut() {
            if stroke.kind == StrokeKind::Polygon {
                let duplicate = stroke
                    .points
                    .last()
                    .is_some_and(|last| last.distance_sq(point) <= POLYGON_VERTEX_EPSILON_SQ);
                if !duplicate {
                    stroke.points.push(point);
                }
                return stroke.id;
            }
        }
        self.begin_stroke(
            ToolConfig {
                kind: StrokeKind::Polygon,
                ..tool
            },
            point,
        )
    }

    /// Commit the open polygon if it has at least three vertices.
    pub fn close_polygon(&mut self) -> Option<StrokeId> {
        let (kind, stroke) = self.active()?;
        if stroke.kind != StrokeKind::Polygon || stroke.points.len() < 3 {
            return None;
        }
        let layer = self.layer_mut(kind);
        let stroke = layer.active.take()?;
        let id = stroke.id;
        layer.strokes.push(stroke);
        Some(id)
    }

    /// Drop the in-progress stroke without touching committed strokes.
    pub fn discard_active(&mut self) -> Option<Stroke> {
        self.lighting
            .active
            .take()
            .or_else(|| self.materiality.active.take())
    }

    /// Replace both committed lists wholesale (undo/redo).
    pub fn restore(&mut self, lighting: Vec<Stroke>, materiality: Vec<Stroke>) {
        self.discard_active();
        self.lighting.strokes = lighting;
        self.materiality.strokes = materiality;
    }

    /// Forget everything, including visibility toggles. Used when a new base image arrives.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
