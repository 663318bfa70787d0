use crate::draw::assets::{encode_png, LoadedImage, MaterialSlots, PriorRenders};
use crate::draw::model::{Color, LayerKind};
use crate::draw::render::{render_pass, LayerPass, RasterFrame};
use crate::draw::strokes::StrokeStore;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PNG_MIME_TYPE: &str = "image/png";
pub const MAX_CREATIVE_FREEDOM: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputResolution {
    #[serde(rename = "1K")]
    OneK,
    #[default]
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl OutputResolution {
    pub fn as_label(self) -> &'static str {
        match self {
            OutputResolution::OneK => "1K",
            OutputResolution::TwoK => "2K",
            OutputResolution::FourK => "4K",
        }
    }
}

/// What one image part of the payload is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Base,
    LayerComposite(LayerKind),
    MaterialReference { slot: usize },
    PriorRender { slot: usize },
}

/// 1-based payload positions, as they appear in `IMG_n` labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLabels {
    pub base: usize,
    pub lighting: Option<usize>,
    pub materiality: Option<usize>,
    /// `(slot, label, fill color)` in slot order.
    pub references: Vec<(usize, usize, Color)>,
    /// `(slot, label)` in slot order.
    pub prior_renders: Vec<(usize, usize)>,
}

impl ImageLabels {
    pub fn layer(&self, kind: LayerKind) -> Option<usize> {
        match kind {
            LayerKind::Lighting => self.lighting,
            LayerKind::Materiality => self.materiality,
        }
    }
}

const LABEL_PREFIX: &str = "IMG_";

pub fn image_label(index: usize) -> String {
    format!("{LABEL_PREFIX}{index}")
}

/// Everything a generation request is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct CompileInputs<'a> {
    pub base: Option<&'a LoadedImage>,
    pub strokes: &'a StrokeStore,
    pub references: &'a MaterialSlots,
    pub prior_renders: &'a PriorRenders,
    pub creative_freedom: u8,
    pub resolution: OutputResolution,
    pub prompt: Option<&'a str>,
}

/// A layer contributes a raster only when it is visible and holds a visible stroke.
fn layer_included(strokes: &StrokeStore, kind: LayerKind) -> bool {
    strokes.layer(kind).has_visible_strokes()
}

/// The ordered image list and the label each image receives, from one walk over the
/// inputs. Instruction text only ever reads labels produced here.
pub fn plan_payload(inputs: &CompileInputs<'_>) -> (Vec<ImageRole>, ImageLabels) {
    fn next(plan: &mut Vec<ImageRole>, role: ImageRole) -> usize {
        plan.push(role);
        plan.len()
    }

    let mut plan = vec![ImageRole::Base];

    let lighting = layer_included(inputs.strokes, LayerKind::Lighting)
        .then(|| next(&mut plan, ImageRole::LayerComposite(LayerKind::Lighting)));
    let materiality = layer_included(inputs.strokes, LayerKind::Materiality)
        .then(|| next(&mut plan, ImageRole::LayerComposite(LayerKind::Materiality)));

    let references = inputs
        .references
        .iter_populated()
        .map(|(slot, reference)| {
            let label = next(&mut plan, ImageRole::MaterialReference { slot });
            (slot, label, reference.color)
        })
        .collect();
    let prior_renders = inputs
        .prior_renders
        .iter_populated()
        .map(|(slot, _)| (slot, next(&mut plan, ImageRole::PriorRender { slot })))
        .collect();

    let labels = ImageLabels {
        base: 1,
        lighting,
        materiality,
        references,
        prior_renders,
    };
    (plan, labels)
}

fn creative_freedom_sentence(level: u8) -> &'static str {
    match level.min(MAX_CREATIVE_FREEDOM) {
        0..=25 => {
            "Stay strictly faithful to the base image: keep geometry, camera and composition \
             unchanged and only apply the requested edits."
        }
        26..=60 => {
            "Keep the geometry and camera of the base image, with moderate freedom to refine \
             surfaces and atmosphere around the requested edits."
        }
        61..=85 => {
            "Keep the overall composition of the base image but feel free to reinterpret \
             details, surfaces and atmosphere."
        }
        _ => {
            "Treat the base image as loose inspiration; composition and details may be \
             reinterpreted freely."
        }
    }
}

/// Instruction text for a planned payload. Images are named only by their label.
pub fn build_instructions(labels: &ImageLabels, inputs: &CompileInputs<'_>) -> String {
    let mut lines = vec![format!(
        "{} is the base render to edit.",
        image_label(labels.base)
    )];

    if let Some(index) = labels.lighting {
        lines.push(format!(
            "{} is the base render with a lighting overlay: painted strokes mark where light \
             should be added or intensified, arrows give the direction of the light, and \
             erased areas carry no instruction.",
            image_label(index)
        ));
    }

    if let Some(index) = labels.materiality {
        lines.push(format!(
            "{} is the base render with a materiality overlay: each colored region marks a \
             surface whose material should change. Leave unpainted surfaces as they are.",
            image_label(index)
        ));
        for (_, reference, color) in &labels.references {
            lines.push(format!(
                "Apply the material shown in {} to the regions painted {} in {}.",
                image_label(*reference),
                color,
                image_label(index)
            ));
        }
    } else {
        for (_, reference, _) in &labels.references {
            lines.push(format!(
                "{} is a material reference; use it to guide surface finishes.",
                image_label(*reference)
            ));
        }
    }

    for (_, index) in &labels.prior_renders {
        lines.push(format!(
            "{} is an earlier render of this scene; keep the result visually consistent \
             with it.",
            image_label(*index)
        ));
    }

    lines.push(creative_freedom_sentence(inputs.creative_freedom).to_string());
    lines.push(format!(
        "Produce a single image at {} resolution.",
        inputs.resolution.as_label()
    ));

    if let Some(prompt) = inputs.prompt.map(str::trim).filter(|p| !p.is_empty()) {
        lines.push(format!("Additional direction: {}", escape_labels(prompt)));
    }

    lines.join("\n")
}

/// Free text must not reference images the payload does not carry, so `IMG_` becomes `IMG-`.
fn escape_labels(text: &str) -> String {
    text.replace(LABEL_PREFIX, "IMG-")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 (standard alphabet) encoded bytes.
    pub data: String,
}

impl InlineData {
    pub fn png(bytes: &[u8]) -> Self {
        Self {
            mime_type: PNG_MIME_TYPE.to_string(),
            data: general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        general_purpose::STANDARD.decode(&self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    Text(String),
    InlineData(InlineData),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub creative_freedom: u8,
    pub image_size: OutputResolution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPayload {
    pub parts: Vec<Part>,
    pub config: GenerationConfig,
}

impl RequestPayload {
    pub fn image_parts(&self) -> impl Iterator<Item = &InlineData> {
        self.parts.iter().filter_map(|part| match part {
            Part::InlineData(data) => Some(data),
            Part::Text(_) => None,
        })
    }

    pub fn image_count(&self) -> usize {
        self.image_parts().count()
    }

    pub fn instructions(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            Part::Text(text) => Some(text.as_str()),
            Part::InlineData(_) => None,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRequest {
    pub payload: RequestPayload,
    pub plan: Vec<ImageRole>,
    pub labels: ImageLabels,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    MissingBaseImage,
    Encode { role: ImageRole, message: String },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::MissingBaseImage => f.write_str("no base image has been imported"),
            CompileError::Encode { role, message } => {
                write!(f, "failed to encode {role:?} as PNG: {message}")
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// Rasterize and encode every planned image at the base image's full resolution, followed
/// by the instruction text.
pub fn compile_request(inputs: &CompileInputs<'_>) -> Result<CompiledRequest, CompileError> {
    let base = inputs.base.ok_or(CompileError::MissingBaseImage)?;
    let (plan, labels) = plan_payload(inputs);
    let frame = RasterFrame::full(base.size());

    let mut parts = Vec::with_capacity(plan.len() + 1);
    for role in &plan {
        let composite;
        let pixels = match *role {
            ImageRole::Base => &base.pixels,
            ImageRole::LayerComposite(kind) => {
                let layer = LayerPass::committed(inputs.strokes.strokes(kind));
                composite = render_pass(&frame, Color::TRANSPARENT, Some(&base.pixels), &[layer]);
                &composite
            }
            ImageRole::MaterialReference { slot } => match inputs.references.get(slot) {
                Some(reference) => &reference.image.pixels,
                None => continue,
            },
            ImageRole::PriorRender { slot } => match inputs.prior_renders.get(slot) {
                Some(image) => &image.pixels,
                None => continue,
            },
        };
        let bytes = encode_png(pixels).map_err(|err| CompileError::Encode {
            role: *role,
            message: err.to_string(),
        })?;
        parts.push(Part::InlineData(InlineData::png(&bytes)));
    }
    parts.push(Part::Text(build_instructions(&labels, inputs)));

    let payload = RequestPayload {
        parts,
        config: GenerationConfig {
            creative_freedom: inputs.creative_freedom.min(MAX_CREATIVE_FREEDOM),
            image_size: inputs.resolution,
        },
    };
    tracing::info!(
        images = payload.image_count(),
        lighting = ?labels.lighting,
        materiality = ?labels.materiality,
        references = labels.references.len(),
        prior_renders = labels.prior_renders.len(),
        "generation request compiled"
    );
    Ok(CompiledRequest {
        payload,
        plan,
        labels,
    })
}

/// Every distinct `IMG_n` label mentioned in `text`, ascending.
pub fn referenced_labels(text: &str) -> Vec<usize> {
    let mut found: Vec<usize> = text
        .match_indices(LABEL_PREFIX)
        .filter_map(|(start, _)| {
            let digits: String = text[start + LABEL_PREFIX.len()..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        })
        .collect();
    found.sort_unstable();
    found.dedup();
    found
}
