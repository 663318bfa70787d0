use crate::draw::geometry::{to_world, ImageSize, Rect, ScreenPoint, ViewTransform};
use crate::draw::history::DrawHistory;
use crate::draw::keyboard::{map_key_event_to_command, KeyCommand, KeyEvent};
use crate::draw::model::{Point, StrokeId, StrokeKind, ToolConfig};
use crate::draw::strokes::StrokeStore;

/// Pinch baselines shorter than this can't produce a meaningful ratio.
const MIN_PINCH_DISTANCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub id: PointerId,
    pub position: ScreenPoint,
    pub button: PointerButton,
}

impl PointerEvent {
    pub fn primary(id: u64, x: f32, y: f32) -> Self {
        Self {
            id: PointerId(id),
            position: ScreenPoint::new(x, y),
            button: PointerButton::Primary,
        }
    }
}

/// Everything a gesture may read or mutate. Borrowed per event so the dispatcher never
/// caches container or image geometry across frames.
pub struct GestureTarget<'a> {
    pub view: &'a mut ViewTransform,
    pub strokes: &'a mut StrokeStore,
    pub history: &'a mut DrawHistory,
    pub container: Rect,
    pub image_size: Option<ImageSize>,
    pub tool: ToolConfig,
}

impl GestureTarget<'_> {
    fn world_point(&self, screen: ScreenPoint) -> Option<Point> {
        to_world(screen, &*self.view, self.container, self.image_size?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Ignored,
    StrokeStarted(StrokeId),
    StrokeExtended,
    StrokeCommitted(StrokeId),
    StrokeAbandoned,
    PolygonVertexAdded(StrokeId),
    PolygonClosed(StrokeId),
    ViewChanged,
    PanEnded,
}

impl GestureOutcome {
    /// Whether the committed stroke lists changed.
    pub fn mutated_strokes(self) -> bool {
        matches!(
            self,
            GestureOutcome::StrokeCommitted(_) | GestureOutcome::PolygonClosed(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    Undo,
    Redo,
    PanModeToggled(bool),
    StrokeCancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureMode {
    Idle,
    Drawing { pointer: PointerId },
    Panning { last: ScreenPoint },
    Pinching { distance: f32, midpoint: ScreenPoint },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TrackedPointer {
    id: PointerId,
    position: ScreenPoint,
}

/// Turns raw pointer, wheel and key events into draw, pan and pinch intents.
///
/// Pointers are kept in arrival order; pinches always track the two most recent ones.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureDispatcher {
    pointers: Vec<TrackedPointer>,
    mode: GestureMode,
    pan_mode: bool,
    pan_key_held: bool,
}

impl Default for GestureDispatcher {
    fn default() -> Self {
        Self {
            pointers: Vec::new(),
            mode: GestureMode::Idle,
            pan_mode: false,
            pan_key_held: false,
        }
    }
}

impl GestureDispatcher {
    pub fn pan_mode(&self) -> bool {
        self.pan_mode
    }

    pub fn set_pan_mode(&mut self, enabled: bool) {
        self.pan_mode = enabled;
    }

    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.mode, GestureMode::Drawing { .. })
    }

    pub fn is_pinching(&self) -> bool {
        matches!(self.mode, GestureMode::Pinching { .. })
    }

    /// Drop all tracked pointers and transient state. Pan mode survives.
    pub fn reset(&mut self) {
        self.pointers.clear();
        self.mode = GestureMode::Idle;
        self.pan_key_held = false;
    }

    pub fn pointer_down(
        &mut self,
        event: PointerEvent,
        target: &mut GestureTarget<'_>,
    ) -> GestureOutcome {
        self.track(event.id, event.position);

        if self.pointers.len() >= 2 {
            let abandoned = target.strokes.discard_active().is_some();
            if abandoned {
                tracing::debug!("second pointer landed; in-progress stroke abandoned");
            }
            self.start_pinch();
            return if abandoned {
                GestureOutcome::StrokeAbandoned
            } else {
                GestureOutcome::Ignored
            };
        }

        if self.pan_mode || self.pan_key_held || event.button == PointerButton::Middle {
            self.mode = GestureMode::Panning {
                last: event.position,
            };
            return GestureOutcome::Ignored;
        }

        if event.button != PointerButton::Primary {
            return GestureOutcome::Ignored;
        }

        let Some(point) = target.world_point(event.position) else {
            return GestureOutcome::Ignored;
        };

        self.mode = GestureMode::Drawing { pointer: event.id };
        if target.tool.kind == StrokeKind::Polygon {
            let id = target.strokes.add_polygon_vertex(target.tool, point);
            GestureOutcome::PolygonVertexAdded(id)
        } else {
            GestureOutcome::StrokeStarted(target.strokes.begin_stroke(target.tool, point))
        }
    }

    pub fn pointer_move(
        &mut self,
        event: PointerEvent,
        target: &mut GestureTarget<'_>,
    ) -> GestureOutcome {
        let Some(tracked) = self.pointers.iter_mut().find(|p| p.id == event.id) else {
            return GestureOutcome::Ignored;
        };
        tracked.position = event.position;

        match self.mode {
            GestureMode::Idle => GestureOutcome::Ignored,
            GestureMode::Drawing { pointer } => {
                if pointer != event.id {
                    return GestureOutcome::Ignored;
                }
                match target.world_point(event.position) {
                    Some(point) if target.strokes.append_point(point) => {
                        GestureOutcome::StrokeExtended
                    }
                    _ => GestureOutcome::Ignored,
                }
            }
            GestureMode::Panning { last } => {
                target
                    .view
                    .pan(event.position.x - last.x, event.position.y - last.y);
                self.mode = GestureMode::Panning {
                    last: event.position,
                };
                GestureOutcome::ViewChanged
            }
            GestureMode::Pinching { distance, midpoint } => {
                let Some((a, b)) = self.pinch_pair() else {
                    return GestureOutcome::Ignored;
                };
                let new_distance = a.distance(b);
                let new_midpoint = a.midpoint(b);
                target
                    .view
                    .pan(new_midpoint.x - midpoint.x, new_midpoint.y - midpoint.y);
                if distance >= MIN_PINCH_DISTANCE && new_distance >= MIN_PINCH_DISTANCE {
                    let scale = target.view.scale * new_distance / distance;
                    target.view.zoom_about(new_midpoint, scale);
                }
                self.mode = GestureMode::Pinching {
                    distance: new_distance,
                    midpoint: new_midpoint,
                };
                GestureOutcome::ViewChanged
            }
        }
    }

    pub fn pointer_up(
        &mut self,
        event: PointerEvent,
        target: &mut GestureTarget<'_>,
    ) -> GestureOutcome {
        if !self.pointers.iter().any(|p| p.id == event.id) {
            return GestureOutcome::Ignored;
        }

        let outcome = match self.mode {
            GestureMode::Drawing { pointer } if pointer == event.id => {
                self.mode = GestureMode::Idle;
                self.finish_stroke(event.position, target)
            }
            _ => GestureOutcome::Ignored,
        };
        self.pointers.retain(|p| p.id != event.id);

        match self.mode {
            GestureMode::Pinching { .. } => match self.pointers.len() {
                0 => {
                    self.mode = GestureMode::Idle;
                    GestureOutcome::PanEnded
                }
                1 => {
                    // Remaining finger keeps panning until it lifts too.
                    self.mode = GestureMode::Panning {
                        last: self.pointers[0].position,
                    };
                    GestureOutcome::ViewChanged
                }
                _ => {
                    self.start_pinch();
                    GestureOutcome::ViewChanged
                }
            },
            GestureMode::Panning { .. } if self.pointers.is_empty() => {
                self.mode = GestureMode::Idle;
                GestureOutcome::PanEnded
            }
            _ => outcome,
        }
    }

    /// Cancelled pointers resolve exactly like a release.
    pub fn pointer_cancel(
        &mut self,
        event: PointerEvent,
        target: &mut GestureTarget<'_>,
    ) -> GestureOutcome {
        self.pointer_up(event, target)
    }

    pub fn double_click(&mut self, target: &mut GestureTarget<'_>) -> GestureOutcome {
        match target.strokes.close_polygon() {
            Some(id) => {
                target.history.snapshot_store(target.strokes);
                tracing::debug!(stroke = id.0, "polygon closed");
                GestureOutcome::PolygonClosed(id)
            }
            None => GestureOutcome::Ignored,
        }
    }

    pub fn wheel(
        &mut self,
        delta_y: f32,
        anchor: ScreenPoint,
        zoom_step: f32,
        target: &mut GestureTarget<'_>,
    ) -> GestureOutcome {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return GestureOutcome::Ignored;
        }
        let factor = zoom_step.powf(-delta_y / 100.0);
        target.view.zoom_by(anchor, factor);
        GestureOutcome::ViewChanged
    }

    pub fn key_event(
        &mut self,
        event: KeyEvent,
        text_input_focused: bool,
        target: &mut GestureTarget<'_>,
    ) -> Option<InputCommand> {
        match map_key_event_to_command(text_input_focused, event)? {
            KeyCommand::Undo => {
                let entry = target.history.undo()?;
                entry.apply_to(target.strokes);
                tracing::debug!(cursor = ?target.history.cursor(), "undo");
                Some(InputCommand::Undo)
            }
            KeyCommand::Redo => {
                let entry = target.history.redo()?;
                entry.apply_to(target.strokes);
                tracing::debug!(cursor = ?target.history.cursor(), "redo");
                Some(InputCommand::Redo)
            }
            KeyCommand::TogglePanMode => {
                self.pan_mode = !self.pan_mode;
                Some(InputCommand::PanModeToggled(self.pan_mode))
            }
            KeyCommand::PanKeyHeld(held) => {
                self.pan_key_held = held;
                None
            }
            KeyCommand::CancelStroke => {
                target.strokes.discard_active()?;
                if self.is_drawing() {
                    self.mode = GestureMode::Idle;
                }
                Some(InputCommand::StrokeCancelled)
            }
        }
    }

    fn finish_stroke(
        &mut self,
        position: ScreenPoint,
        target: &mut GestureTarget<'_>,
    ) -> GestureOutcome {
        if let Some(point) = target.world_point(position) {
            target.strokes.append_point(point);
        }
        match target.strokes.commit_stroke() {
            Some(id) => {
                target.history.snapshot_store(target.strokes);
                tracing::debug!(stroke = id.0, "stroke committed");
                GestureOutcome::StrokeCommitted(id)
            }
            None if !target.strokes.has_active() => GestureOutcome::StrokeAbandoned,
            // Open polygons stay in progress across releases.
            None => GestureOutcome::Ignored,
        }
    }

    fn track(&mut self, id: PointerId, position: ScreenPoint) {
        self.pointers.retain(|p| p.id != id);
        self.pointers.push(TrackedPointer { id, position });
    }

    fn pinch_pair(&self) -> Option<(ScreenPoint, ScreenPoint)> {
        let [.., a, b] = self.pointers.as_slice() else {
            return None;
        };
        Some((a.position, b.position))
    }

    fn start_pinch(&mut self) {
        if let Some((a, b)) = self.pinch_pair() {
            self.mode = GestureMode::Pinching {
                distance: a.distance(b),
                midpoint: a.midpoint(b),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::geometry::{MAX_SCALE, MIN_SCALE};
    use crate::draw::keyboard::{KeyCode, KeyModifiers};
    use crate::draw::model::{LayerKind, StrokeStyle};

    struct Fixture {
        view: ViewTransform,
        strokes: StrokeStore,
        history: DrawHistory,
        dispatcher: GestureDispatcher,
        tool: ToolConfig,
    }

    impl Fixture {
        fn new(kind: StrokeKind) -> Self {
            Self {
                view: ViewTransform::IDENTITY,
                strokes: StrokeStore::default(),
                history: DrawHistory::default(),
                dispatcher: GestureDispatcher::default(),
                tool: ToolConfig {
                    layer: LayerKind::Lighting,
                    kind,
                    style: StrokeStyle::default(),
                },
            }
        }

        fn run<R>(
            &mut self,
            f: impl FnOnce(&mut GestureDispatcher, &mut GestureTarget<'_>) -> R,
        ) -> R {
            let mut target = GestureTarget {
                view: &mut self.view,
                strokes: &mut self.strokes,
                history: &mut self.history,
                container: Rect::new(0.0, 0.0, 400.0, 400.0),
                image_size: Some(ImageSize::new(400, 400)),
                tool: self.tool,
            };
            f(&mut self.dispatcher, &mut target)
        }

        fn down(&mut self, id: u64, x: f32, y: f32) -> GestureOutcome {
            self.run(|d, t| d.pointer_down(PointerEvent::primary(id, x, y), t))
        }

        fn moved(&mut self, id: u64, x: f32, y: f32) -> GestureOutcome {
            self.run(|d, t| d.pointer_move(PointerEvent::primary(id, x, y), t))
        }

        fn up(&mut self, id: u64, x: f32, y: f32) -> GestureOutcome {
            self.run(|d, t| d.pointer_up(PointerEvent::primary(id, x, y), t))
        }

        fn key(&mut self, event: KeyEvent, focused: bool) -> Option<InputCommand> {
            self.run(|d, t| d.key_event(event, focused, t))
        }
    }

    #[test]
    fn single_pointer_draws_and_commits_with_snapshot() {
        let mut fx = Fixture::new(StrokeKind::Freehand);
        assert!(matches!(fx.down(1, 40.0, 40.0), GestureOutcome::StrokeStarted(_)));
        assert_eq!(fx.moved(1, 60.0, 40.0), GestureOutcome::StrokeExtended);
        assert!(matches!(fx.up(1, 80.0, 40.0), GestureOutcome::StrokeCommitted(_)));

        let strokes = fx.strokes.strokes(LayerKind::Lighting);
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].points.len(), 3);
        assert_eq!(strokes[0].points[0], Point::new(0.1, 0.1));
        assert_eq!(fx.history.len(), 1);
        assert!(!fx.strokes.has_active());
    }

    #[test]
    fn second_pointer_abandons_stroke_and_pinches() {
        let mut fx = Fixture::new(StrokeKind::Freehand);
        fx.down(1, 100.0, 200.0);
        fx.moved(1, 110.0, 200.0);
        assert_eq!(fx.down(2, 300.0, 200.0), GestureOutcome::StrokeAbandoned);
        assert!(fx.dispatcher.is_pinching());
        assert!(!fx.strokes.has_active());

        fx.up(1, 110.0, 200.0);
        fx.up(2, 300.0, 200.0);
        assert!(fx.strokes.strokes(LayerKind::Lighting).is_empty());
        assert!(fx.history.is_empty());
    }

    #[test]
    fn pinch_to_double_distance_doubles_scale_about_midpoint() {
        let mut fx = Fixture::new(StrokeKind::Freehand);
        let midpoint = ScreenPoint::new(200.0, 200.0);
        let anchor_world = fx.view.invert(midpoint).expect("invertible");

        fx.down(1, 150.0, 200.0);
        fx.down(2, 250.0, 200.0);
        fx.moved(1, 100.0, 200.0);
        fx.moved(2, 300.0, 200.0);

        assert!((fx.view.scale - 2.0).abs() < 1e-4);
        let projected = fx.view.apply(anchor_world.0, anchor_world.1);
        assert!((projected.x - midpoint.x).abs() < 1e-3);
        assert!((projected.y - midpoint.y).abs() < 1e-3);
    }

    #[test]
    fn pinch_scale_is_clamped() {
        let mut fx = Fixture::new(StrokeKind::Freehand);
        fx.view.scale = 8.0;
        fx.down(1, 190.0, 200.0);
        fx.down(2, 210.0, 200.0);
        fx.moved(2, 390.0, 200.0);
        assert_eq!(fx.view.scale, MAX_SCALE);

        let mut fx = Fixture::new(StrokeKind::Freehand);
        fx.view.scale = 0.2;
        fx.down(1, 0.0, 200.0);
        fx.down(2, 400.0, 200.0);
        fx.moved(2, 10.0, 200.0);
        assert_eq!(fx.view.scale, MIN_SCALE);
    }

    #[test]
    fn remaining_finger_after_pinch_pans_until_released() {
        let mut fx = Fixture::new(StrokeKind::Freehand);
        fx.down(1, 100.0, 100.0);
        fx.down(2, 200.0, 100.0);
        assert_eq!(fx.up(2, 200.0, 100.0), GestureOutcome::ViewChanged);

        fx.moved(1, 130.0, 110.0);
        assert_eq!(fx.view.offset_x, 30.0);
        assert_eq!(fx.view.offset_y, 10.0);
        assert_eq!(fx.up(1, 130.0, 110.0), GestureOutcome::PanEnded);
        assert!(fx.strokes.strokes(LayerKind::Lighting).is_empty());
    }

    #[test]
    fn pan_mode_and_middle_button_pan_by_screen_delta() {
        let mut fx = Fixture::new(StrokeKind::Freehand);
        fx.dispatcher.set_pan_mode(true);
        fx.down(1, 10.0, 10.0);
        assert_eq!(fx.moved(1, 25.0, 5.0), GestureOutcome::ViewChanged);
        assert_eq!(fx.up(1, 25.0, 5.0), GestureOutcome::PanEnded);
        assert_eq!((fx.view.offset_x, fx.view.offset_y), (15.0, -5.0));

        let mut fx = Fixture::new(StrokeKind::Freehand);
        let middle = PointerEvent {
            button: PointerButton::Middle,
            ..PointerEvent::primary(1, 10.0, 10.0)
        };
        fx.run(|d, t| d.pointer_down(middle, t));
        fx.moved(1, 20.0, 30.0);
        assert_eq!((fx.view.offset_x, fx.view.offset_y), (10.0, 20.0));
        assert!(!fx.strokes.has_active());
    }

    #[test]
    fn space_held_pans_and_release_is_honored_in_text_input() {
        let mut fx = Fixture::new(StrokeKind::Freehand);
        fx.key(KeyEvent::press(KeyCode::Space, KeyModifiers::default()), false);
        fx.down(1, 10.0, 10.0);
        fx.moved(1, 20.0, 10.0);
        fx.up(1, 20.0, 10.0);
        assert_eq!(fx.view.offset_x, 10.0);

        fx.key(KeyEvent::release(KeyCode::Space), true);
        assert!(matches!(fx.down(2, 10.0, 10.0), GestureOutcome::StrokeStarted(_)));
    }

    #[test]
    fn polygon_vertices_accumulate_and_double_click_closes() {
        let mut fx = Fixture::new(StrokeKind::Polygon);
        for (x, y) in [(40.0, 40.0), (200.0, 40.0), (200.0, 200.0)] {
            assert!(matches!(fx.down(1, x, y), GestureOutcome::PolygonVertexAdded(_)));
            assert_eq!(fx.up(1, x, y), GestureOutcome::Ignored);
        }
        // The double click's own press lands on the last vertex.
        fx.down(1, 200.0, 200.0);
        fx.up(1, 200.0, 200.0);
        assert!(fx.history.is_empty());

        let closed = fx.run(|d, t| d.double_click(t));
        assert!(matches!(closed, GestureOutcome::PolygonClosed(_)));
        let strokes = fx.strokes.strokes(LayerKind::Lighting);
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].points.len(), 3);
        assert_eq!(fx.history.len(), 1);
    }

    #[test]
    fn double_click_on_short_polygon_is_ignored() {
        let mut fx = Fixture::new(StrokeKind::Polygon);
        fx.down(1, 40.0, 40.0);
        fx.up(1, 40.0, 40.0);
        fx.down(1, 90.0, 40.0);
        fx.up(1, 90.0, 40.0);
        assert_eq!(fx.run(|d, t| d.double_click(t)), GestureOutcome::Ignored);
        assert!(fx.strokes.has_active());
    }

    #[test]
    fn cancel_commits_like_pointer_up() {
        let mut fx = Fixture::new(StrokeKind::Line);
        fx.down(1, 40.0, 40.0);
        let outcome = fx.run(|d, t| d.pointer_cancel(PointerEvent::primary(1, 120.0, 40.0), t));
        assert!(matches!(outcome, GestureOutcome::StrokeCommitted(_)));
        assert!(!fx.strokes.has_active());
        assert_eq!(fx.strokes.strokes(LayerKind::Lighting)[0].points.len(), 2);
    }

    #[test]
    fn tapping_with_the_line_tool_leaves_nothing_behind() {
        for kind in [StrokeKind::Line, StrokeKind::Arrow] {
            let mut fx = Fixture::new(kind);
            assert!(matches!(fx.down(1, 40.0, 40.0), GestureOutcome::StrokeStarted(_)));
            assert_eq!(fx.up(1, 40.0, 40.0), GestureOutcome::StrokeAbandoned);
            assert!(fx.strokes.strokes(LayerKind::Lighting).is_empty());
            assert!(!fx.strokes.has_active());
            assert!(fx.history.is_empty());
            assert!(!fx.strokes.layer(LayerKind::Lighting).has_visible_strokes());
        }
    }

    #[test]
    fn undo_redo_shortcuts_replace_layers_unless_text_focused() {
        let mut fx = Fixture::new(StrokeKind::Line);
        fx.down(1, 40.0, 40.0);
        fx.up(1, 80.0, 80.0);
        let ctrl = KeyModifiers {
            ctrl: true,
            shift: false,
        };

        assert_eq!(fx.key(KeyEvent::press(KeyCode::Z, ctrl), true), None);
        assert_eq!(fx.strokes.strokes(LayerKind::Lighting).len(), 1);

        assert_eq!(
            fx.key(KeyEvent::press(KeyCode::Z, ctrl), false),
            Some(InputCommand::Undo)
        );
        assert!(fx.strokes.strokes(LayerKind::Lighting).is_empty());
        assert_eq!(
            fx.key(KeyEvent::press(KeyCode::Y, ctrl), false),
            Some(InputCommand::Redo)
        );
        assert_eq!(fx.strokes.strokes(LayerKind::Lighting).len(), 1);
    }

    #[test]
    fn h_toggles_pan_mode_and_escape_abandons() {
        let mut fx = Fixture::new(StrokeKind::Freehand);
        assert_eq!(
            fx.key(KeyEvent::press(KeyCode::H, KeyModifiers::default()), false),
            Some(InputCommand::PanModeToggled(true))
        );
        fx.key(KeyEvent::press(KeyCode::H, KeyModifiers::default()), false);

        fx.down(1, 40.0, 40.0);
        assert_eq!(
            fx.key(KeyEvent::press(KeyCode::Escape, KeyModifiers::default()), false),
            Some(InputCommand::StrokeCancelled)
        );
        assert_eq!(fx.up(1, 60.0, 40.0), GestureOutcome::Ignored);
        assert!(fx.strokes.strokes(LayerKind::Lighting).is_empty());
    }

    #[test]
    fn wheel_zooms_about_cursor() {
        let mut fx = Fixture::new(StrokeKind::Freehand);
        let anchor = ScreenPoint::new(100.0, 300.0);
        let outcome = fx.run(|d, t| d.wheel(-100.0, anchor, 1.25, t));
        assert_eq!(outcome, GestureOutcome::ViewChanged);
        assert!((fx.view.scale - 1.25).abs() < 1e-5);
        let projected = fx.view.apply(100.0, 300.0);
        assert!((projected.x - anchor.x).abs() < 1e-3);
    }

    #[test]
    fn missing_image_makes_drawing_a_no_op() {
        let mut fx = Fixture::new(StrokeKind::Freehand);
        let outcome = {
            let mut target = GestureTarget {
                view: &mut fx.view,
                strokes: &mut fx.strokes,
                history: &mut fx.history,
                container: Rect::new(0.0, 0.0, 0.0, 0.0),
                image_size: Some(ImageSize::new(10, 10)),
                tool: fx.tool,
            };
            fx.dispatcher
                .pointer_down(PointerEvent::primary(1, 5.0, 5.0), &mut target)
        };
        assert_eq!(outcome, GestureOutcome::Ignored);
        assert!(!fx.strokes.has_active());
    }
}
