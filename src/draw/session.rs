use crate::draw::assets::{
    load_image, AssetError, ImageSource, LoadedImage, MaterialSlots, PriorRenders,
};
use crate::draw::compile::{compile_request, CompileError, CompileInputs, CompiledRequest};
use crate::draw::compile::{OutputResolution, MAX_CREATIVE_FREEDOM};
use crate::draw::generation::{
    decode_response_image, run_generation, GenerationClient, GenerationError, GenerationResponse,
    PayloadInspector,
};
use crate::draw::geometry::{ImageSize, Rect, ScreenPoint, ViewTransform};
use crate::draw::history::DrawHistory;
use crate::draw::input::{
    GestureDispatcher, GestureOutcome, GestureTarget, InputCommand, PointerEvent,
};
use crate::draw::keyboard::KeyEvent;
use crate::draw::model::{Color, LayerKind, StrokeKind, StrokeStyle, ToolConfig};
use crate::draw::preview::{render_layer_previews, LayerPreview, PreviewScheduler};
use crate::draw::render::render_viewport;
use crate::draw::save::DisplayedKind;
use crate::draw::settings::EngineSettings;
use crate::draw::strokes::StrokeStore;
use image::RgbaImage;
use std::time::Instant;

/// One editing session over a single base image.
#[derive(Debug)]
pub struct AnnotationSession {
    settings: EngineSettings,
    base: Option<LoadedImage>,
    result: Option<LoadedImage>,
    container: Rect,
    view: ViewTransform,
    strokes: StrokeStore,
    history: DrawHistory,
    gestures: GestureDispatcher,
    lighting_tool: ToolConfig,
    materiality_tool: ToolConfig,
    active_layer: LayerKind,
    references: MaterialSlots,
    selected_reference: Option<usize>,
    prior_renders: PriorRenders,
    preview: PreviewScheduler,
    previews: Vec<LayerPreview>,
    creative_freedom: u8,
    resolution: OutputResolution,
    prompt: String,
    text_input_focused: bool,
}

impl Default for AnnotationSession {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl AnnotationSession {
    pub fn new(mut settings: EngineSettings) -> Self {
        settings.sanitize();
        Self {
            base: None,
            result: None,
            container: Rect::default(),
            view: ViewTransform::IDENTITY,
            strokes: StrokeStore::default(),
            history: DrawHistory::default(),
            gestures: GestureDispatcher::default(),
            lighting_tool: ToolConfig {
                layer: LayerKind::Lighting,
                kind: StrokeKind::Freehand,
                style: settings.stroke_style(LayerKind::Lighting),
            },
            materiality_tool: ToolConfig {
                layer: LayerKind::Materiality,
                kind: StrokeKind::Polygon,
                style: settings.stroke_style(LayerKind::Materiality),
            },
            active_layer: LayerKind::Lighting,
            references: MaterialSlots::with_palette(&settings.reference_palette),
            selected_reference: None,
            prior_renders: PriorRenders::default(),
            preview: PreviewScheduler::new(settings.preview_delay()),
            previews: Vec::new(),
            creative_freedom: settings.creative_freedom,
            resolution: settings.output_resolution,
            prompt: String::new(),
            text_input_focused: false,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn base(&self) -> Option<&LoadedImage> {
        self.base.as_ref()
    }

    pub fn result(&self) -> Option<&LoadedImage> {
        self.result.as_ref()
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn strokes(&self) -> &StrokeStore {
        &self.strokes
    }

    pub fn history(&self) -> &DrawHistory {
        &self.history
    }

    pub fn gestures(&self) -> &GestureDispatcher {
        &self.gestures
    }

    pub fn references(&self) -> &MaterialSlots {
        &self.references
    }

    pub fn prior_renders(&self) -> &PriorRenders {
        &self.prior_renders
    }

    pub fn previews(&self) -> &[LayerPreview] {
        &self.previews
    }

    /// Replace the base image and start over: strokes, history, view, result and any
    /// gesture in flight are all cleared. References and prior renders are kept.
    pub fn import_base(&mut self, image: LoadedImage) {
        tracing::info!(
            origin = %image.origin,
            width = image.pixels.width(),
            height = image.pixels.height(),
            "base image imported; session reset"
        );
        self.base = Some(image);
        self.result = None;
        self.strokes.reset();
        self.history.clear();
        self.view = ViewTransform::IDENTITY;
        self.gestures.reset();
        self.preview.cancel();
        self.previews.clear();
    }

    pub fn import_base_from(&mut self, source: &ImageSource) -> Result<ImageSize, AssetError> {
        let image = load_image(source)?;
        let size = image.size();
        self.import_base(image);
        Ok(size)
    }

    pub fn set_container(&mut self, container: Rect) {
        self.container = container;
    }

    pub fn fit_view(&mut self) {
        self.view = ViewTransform::IDENTITY;
    }

    pub fn active_layer(&self) -> LayerKind {
        self.active_layer
    }

    pub fn set_active_layer(&mut self, layer: LayerKind) {
        if self.active_layer != layer {
            self.strokes.discard_active();
            self.active_layer = layer;
        }
    }

    pub fn tool(&self, layer: LayerKind) -> ToolConfig {
        match layer {
            LayerKind::Lighting => self.lighting_tool,
            LayerKind::Materiality => self.materiality_tool,
        }
    }

    fn tool_mut(&mut self, layer: LayerKind) -> &mut ToolConfig {
        match layer {
            LayerKind::Lighting => &mut self.lighting_tool,
            LayerKind::Materiality => &mut self.materiality_tool,
        }
    }

    pub fn set_tool_kind(&mut self, layer: LayerKind, kind: StrokeKind) {
        self.tool_mut(layer).kind = kind;
    }

    pub fn set_tool_style(&mut self, layer: LayerKind, style: StrokeStyle) {
        self.tool_mut(layer).style = style;
    }

    /// The tool a new gesture draws with. Erasers use the configured eraser width.
    pub fn current_tool(&self) -> ToolConfig {
        let mut tool = self.tool(self.active_layer);
        if tool.kind == StrokeKind::Eraser {
            tool.style.width = self.settings.eraser_width;
        }
        tool
    }

    pub fn set_layer_visible(&mut self, layer: LayerKind, visible: bool, now: Instant) {
        self.strokes.set_visible(layer, visible);
        self.preview.mark_dirty(now);
    }

    pub fn set_text_input_focus(&mut self, focused: bool) {
        self.text_input_focused = focused;
    }

    fn dispatch<R>(
        &mut self,
        f: impl FnOnce(&mut GestureDispatcher, &mut GestureTarget<'_>) -> R,
    ) -> R {
        let tool = self.current_tool();
        let mut target = GestureTarget {
            view: &mut self.view,
            strokes: &mut self.strokes,
            history: &mut self.history,
            container: self.container,
            image_size: self.base.as_ref().map(LoadedImage::size),
            tool,
        };
        f(&mut self.gestures, &mut target)
    }

    fn note_outcome(&mut self, outcome: GestureOutcome, now: Instant) -> GestureOutcome {
        if outcome.mutated_strokes() {
            self.preview.mark_dirty(now);
        }
        outcome
    }

    pub fn pointer_down(&mut self, event: PointerEvent, now: Instant) -> GestureOutcome {
        let outcome = self.dispatch(|d, t| d.pointer_down(event, t));
        self.note_outcome(outcome, now)
    }

    pub fn pointer_move(&mut self, event: PointerEvent, now: Instant) -> GestureOutcome {
        let outcome = self.dispatch(|d, t| d.pointer_move(event, t));
        self.note_outcome(outcome, now)
    }

    pub fn pointer_up(&mut self, event: PointerEvent, now: Instant) -> GestureOutcome {
        let outcome = self.dispatch(|d, t| d.pointer_up(event, t));
        self.note_outcome(outcome, now)
    }

    pub fn pointer_cancel(&mut self, event: PointerEvent, now: Instant) -> GestureOutcome {
        let outcome = self.dispatch(|d, t| d.pointer_cancel(event, t));
        self.note_outcome(outcome, now)
    }

    pub fn double_click(&mut self, now: Instant) -> GestureOutcome {
        let outcome = self.dispatch(|d, t| d.double_click(t));
        self.note_outcome(outcome, now)
    }

    pub fn wheel(&mut self, delta_y: f32, anchor: ScreenPoint) -> GestureOutcome {
        let step = self.settings.wheel_zoom_step;
        self.dispatch(|d, t| d.wheel(delta_y, anchor, step, t))
    }

    pub fn key_event(&mut self, event: KeyEvent, now: Instant) -> Option<InputCommand> {
        let focused = self.text_input_focused;
        let command = self.dispatch(|d, t| d.key_event(event, focused, t))?;
        if matches!(command, InputCommand::Undo | InputCommand::Redo) {
            self.preview.mark_dirty(now);
        }
        Some(command)
    }

    pub fn undo(&mut self, now: Instant) -> bool {
        let Some(entry) = self.history.undo() else {
            return false;
        };
        entry.apply_to(&mut self.strokes);
        self.preview.mark_dirty(now);
        true
    }

    pub fn redo(&mut self, now: Instant) -> bool {
        let Some(entry) = self.history.redo() else {
            return false;
        };
        entry.apply_to(&mut self.strokes);
        self.preview.mark_dirty(now);
        true
    }

    pub fn attach_reference(
        &mut self,
        slot: usize,
        image: LoadedImage,
        color: Option<Color>,
    ) -> Result<Color, AssetError> {
        // Swapping the image of a slot that already paints regions keeps its color.
        let color = self.painted_slot_color(slot).or(color);
        let color = self.references.attach(slot, image, color)?;
        if self.selected_reference == Some(slot) {
            self.materiality_tool.style.color = color;
        }
        Ok(color)
    }

    /// Rebind a slot's color. Refused while committed materiality regions are painted with
    /// the current color, since those regions would lose their reference.
    pub fn set_reference_color(&mut self, slot: usize, color: Color) -> Result<bool, AssetError> {
        if let Some(bound) = self.painted_slot_color(slot) {
            if bound != color {
                tracing::warn!(slot, color = %bound, "reference color is painted on the canvas");
                return Ok(false);
            }
        }
        let changed = self.references.set_color(slot, color)?;
        if changed && self.selected_reference == Some(slot) {
            self.materiality_tool.style.color = color;
        }
        Ok(changed)
    }

    pub fn clear_reference(&mut self, slot: usize) -> bool {
        if let Some(bound) = self.painted_slot_color(slot) {
            tracing::warn!(slot, color = %bound, "cleared reference leaves regions unbound");
        }
        if self.selected_reference == Some(slot) {
            self.selected_reference = None;
        }
        self.references.clear(slot).is_some()
    }

    /// Make materiality fills use the color bound to `slot`.
    pub fn select_reference(&mut self, slot: usize) -> Option<Color> {
        let color = self.references.color_for(slot)?;
        self.selected_reference = Some(slot);
        self.materiality_tool.style.color = color;
        Some(color)
    }

    pub fn selected_reference(&self) -> Option<usize> {
        self.selected_reference
    }

    /// The slot's color, if a committed materiality fill uses it.
    fn painted_slot_color(&self, slot: usize) -> Option<Color> {
        let color = self.references.color_for(slot)?;
        self.strokes
            .strokes(LayerKind::Materiality)
            .iter()
            .any(|stroke| stroke.kind != StrokeKind::Eraser && stroke.color == color)
            .then_some(color)
    }

    pub fn attach_prior_render(
        &mut self,
        slot: usize,
        image: LoadedImage,
    ) -> Result<(), AssetError> {
        self.prior_renders.attach(slot, image)
    }

    pub fn clear_prior_render(&mut self, slot: usize) -> bool {
        self.prior_renders.clear(slot).is_some()
    }

    pub fn set_creative_freedom(&mut self, level: u8) {
        self.creative_freedom = level.min(MAX_CREATIVE_FREEDOM);
    }

    pub fn set_output_resolution(&mut self, resolution: OutputResolution) {
        self.resolution = resolution;
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Regenerate layer thumbnails once the debounce window has passed.
    pub fn poll_preview(&mut self, now: Instant) -> bool {
        if !self.preview.poll(now) {
            return false;
        }
        let Some(base) = self.base.as_ref() else {
            return false;
        };
        self.previews =
            render_layer_previews(&base.pixels, &self.strokes, self.settings.preview_max_edge);
        true
    }

    pub fn render_viewport(&self) -> Option<RgbaImage> {
        let base = self.base.as_ref()?;
        render_viewport(
            self.container,
            &base.pixels,
            &self.strokes,
            &self.view,
            self.settings.letterbox_color,
        )
    }

    pub fn compile(&self) -> Result<CompiledRequest, CompileError> {
        compile_request(&CompileInputs {
            base: self.base.as_ref(),
            strokes: &self.strokes,
            references: &self.references,
            prior_renders: &self.prior_renders,
            creative_freedom: self.creative_freedom,
            resolution: self.resolution,
            prompt: Some(self.prompt.as_str()),
        })
    }

    /// Compile, inspect, send, and show the returned image. Strokes and history are never
    /// touched, whatever the outcome.
    pub fn generate(
        &mut self,
        inspector: &mut dyn PayloadInspector,
        client: &mut dyn GenerationClient,
    ) -> Result<GenerationResponse, GenerationError> {
        let compiled = self.compile()?;
        let response = run_generation(&compiled.payload, inspector, client)?;
        if let Some(image) = decode_response_image(&response)? {
            self.result = Some(image);
        }
        Ok(response)
    }

    /// Dismiss the generated result. An in-progress stroke left behind is dropped.
    pub fn close_result(&mut self) {
        self.result = None;
        if self.strokes.discard_active().is_some() {
            tracing::debug!("in-progress stroke discarded on result close");
        }
        self.gestures.reset();
    }

    pub fn displayed(&self) -> Option<(&RgbaImage, DisplayedKind)> {
        if let Some(result) = self.result.as_ref() {
            return Some((&result.pixels, DisplayedKind::Result));
        }
        self.base
            .as_ref()
            .map(|base| (&base.pixels, DisplayedKind::Base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::assets::encode_png;
    use crate::draw::compile::{InlineData, RequestPayload};
    use crate::draw::generation::ApproveAll;
    use image::Rgba;
    use std::time::Duration;

    fn session() -> AnnotationSession {
        let mut session = AnnotationSession::default();
        session.import_base(LoadedImage::new(
            "base",
            RgbaImage::from_pixel(100, 100, Rgba([50, 50, 50, 255])),
        ));
        session.set_container(Rect::new(0.0, 0.0, 100.0, 100.0));
        session
    }

    fn draw_line(session: &mut AnnotationSession, now: Instant) {
        session.pointer_down(PointerEvent::primary(1, 10.0, 10.0), now);
        session.pointer_move(PointerEvent::primary(1, 50.0, 50.0), now);
        session.pointer_up(PointerEvent::primary(1, 90.0, 90.0), now);
    }

    struct Echo(Option<InlineData>);

    impl GenerationClient for Echo {
        fn generate(
            &mut self,
            _payload: &RequestPayload,
        ) -> Result<GenerationResponse, GenerationError> {
            match self.0.clone() {
                Some(image) => Ok(GenerationResponse {
                    image: Some(image),
                    message: None,
                }),
                None => Err(GenerationError::Transport("offline".into())),
            }
        }
    }

    #[test]
    fn importing_a_base_resets_editing_state() {
        let now = Instant::now();
        let mut session = session();
        draw_line(&mut session, now);
        session.wheel(-100.0, ScreenPoint::new(10.0, 10.0));
        assert_eq!(session.history().len(), 1);

        session.import_base(LoadedImage::new(
            "next",
            RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255])),
        ));
        assert!(session.strokes().strokes(LayerKind::Lighting).is_empty());
        assert!(session.history().is_empty());
        assert_eq!(session.view(), ViewTransform::IDENTITY);
        assert!(session.result().is_none());
    }

    #[test]
    fn committed_strokes_schedule_a_debounced_preview() {
        let now = Instant::now();
        let mut session = session();
        draw_line(&mut session, now);
        assert!(!session.poll_preview(now));
        let later = now + session.settings().preview_delay() + Duration::from_millis(1);
        assert!(session.poll_preview(later));
        assert_eq!(session.previews().len(), 2);
        assert!(!session.poll_preview(later));
    }

    #[test]
    fn eraser_tool_uses_configured_width() {
        let mut session = session();
        session.set_tool_kind(LayerKind::Lighting, StrokeKind::Eraser);
        assert_eq!(
            session.current_tool().style.width,
            session.settings().eraser_width
        );
    }

    #[test]
    fn selecting_a_reference_drives_materiality_fill_color() {
        let mut session = session();
        let reference = LoadedImage::new(
            "brick",
            RgbaImage::from_pixel(4, 4, Rgba([180, 60, 40, 255])),
        );
        session
            .attach_reference(2, reference, None)
            .expect("attach");
        assert_eq!(session.select_reference(2), Some(Color::rgb(180, 60, 40)));
        assert_eq!(
            session.tool(LayerKind::Materiality).style.color,
            Color::rgb(180, 60, 40)
        );
        session
            .set_reference_color(2, Color::rgb(1, 2, 3))
            .expect("in range");
        assert_eq!(
            session.tool(LayerKind::Materiality).style.color,
            Color::rgb(1, 2, 3)
        );
        assert_eq!(session.select_reference(4), None);
    }

    #[test]
    fn painted_reference_color_stays_bound_until_the_fill_is_undone() {
        let now = Instant::now();
        let mut session = session();
        let brick = Color::rgb(180, 60, 40);
        session
            .attach_reference(2, LoadedImage::new("brick", RgbaImage::new(4, 4)), Some(brick))
            .expect("attach");
        session.select_reference(2);
        session.set_active_layer(LayerKind::Materiality);
        for (id, (x, y)) in [(1, (10.0, 10.0)), (2, (60.0, 10.0)), (3, (60.0, 60.0))] {
            session.pointer_down(PointerEvent::primary(id, x, y), now);
            session.pointer_up(PointerEvent::primary(id, x, y), now);
        }
        assert!(matches!(
            session.double_click(now),
            GestureOutcome::PolygonClosed(_)
        ));

        let changed = session.set_reference_color(2, Color::rgb(1, 2, 3)).expect("in range");
        assert!(!changed);
        assert_eq!(session.references().color_for(2), Some(brick));
        assert_eq!(session.tool(LayerKind::Materiality).style.color, brick);
        session
            .attach_reference(2, LoadedImage::new("tile", RgbaImage::new(4, 4)), None)
            .expect("replace");
        assert_eq!(session.references().color_for(2), Some(brick));

        let compiled = session.compile().expect("compile");
        let text = compiled.payload.instructions().expect("text");
        assert!(text.contains(&format!("regions painted {brick}")));

        assert!(session.undo(now));
        let changed = session.set_reference_color(2, Color::rgb(1, 2, 3)).expect("in range");
        assert!(changed);
        assert_eq!(session.references().color_for(2), Some(Color::rgb(1, 2, 3)));
    }

    #[test]
    fn failed_generation_leaves_strokes_and_history_alone() {
        let now = Instant::now();
        let mut session = session();
        draw_line(&mut session, now);
        let before = session.strokes().clone();

        let err = session
            .generate(&mut ApproveAll, &mut Echo(None))
            .expect_err("offline");
        assert!(matches!(err, GenerationError::Transport(_)));
        assert_eq!(session.strokes(), &before);
        assert_eq!(session.history().len(), 1);
        assert!(session.result().is_none());
    }

    #[test]
    fn generated_image_becomes_the_displayed_raster_until_closed() {
        let mut session = session();
        let generated = RgbaImage::from_pixel(8, 8, Rgba([9, 8, 7, 255]));
        let data = InlineData::png(&encode_png(&generated).expect("png"));

        session
            .generate(&mut ApproveAll, &mut Echo(Some(data)))
            .expect("generate");
        let (pixels, kind) = session.displayed().expect("displayed");
        assert_eq!(kind, DisplayedKind::Result);
        assert_eq!(pixels, &generated);

        session.pointer_down(PointerEvent::primary(1, 10.0, 10.0), Instant::now());
        session.close_result();
        assert!(!session.strokes().has_active());
        assert_eq!(
            session.displayed().map(|(_, kind)| kind),
            Some(DisplayedKind::Base)
        );
    }

    #[test]
    fn compile_without_base_is_an_error() {
        let session = AnnotationSession::default();
        assert!(matches!(session.compile(), Err(CompileError::MissingBaseImage)));
        assert!(session.render_viewport().is_none());
    }
}
