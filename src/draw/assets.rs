use crate::draw::geometry::ImageSize;
use crate::draw::model::Color;
use base64::{engine::general_purpose, Engine as _};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageResult, RgbaImage};
use std::fmt;
use std::path::PathBuf;

pub const MATERIAL_SLOT_COUNT: usize = 5;
pub const MAX_PRIOR_RENDERS: usize = 3;

/// Upper bound on the sampling grid used by [`suggest_dominant_color`], per axis.
const COLOR_SAMPLE_GRID: u32 = 64;

pub const DEFAULT_REFERENCE_PALETTE: [Color; MATERIAL_SLOT_COUNT] = [
    Color::rgb(230, 57, 70),
    Color::rgb(42, 157, 143),
    Color::rgb(233, 196, 106),
    Color::rgb(69, 123, 157),
    Color::rgb(155, 93, 229),
];

/// Where an image comes from. Hosted images are fetched by the caller and handed over as
/// bytes, labelled with their origin.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Path(PathBuf),
    DataUrl(String),
    Bytes { origin: String, bytes: Vec<u8> },
}

impl ImageSource {
    pub fn origin(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::DataUrl(url) => {
                let header = url.split(',').next().unwrap_or("data:");
                format!("{header},…")
            }
            ImageSource::Bytes { origin, .. } => origin.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub origin: String,
    pub pixels: RgbaImage,
}

impl LoadedImage {
    pub fn new(origin: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            origin: origin.into(),
            pixels,
        }
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.pixels.width(), self.pixels.height())
    }
}

#[derive(Debug)]
pub enum AssetError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    InvalidDataUrl(String),
    Decode {
        origin: String,
        message: String,
    },
    EmptyImage {
        origin: String,
    },
    SlotOutOfRange {
        slot: usize,
        count: usize,
    },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Read { path, source } => {
                write!(f, "failed to read image {}: {source}", path.display())
            }
            AssetError::InvalidDataUrl(reason) => write!(f, "invalid data URL: {reason}"),
            AssetError::Decode { origin, message } => {
                write!(f, "failed to decode image {origin}: {message}")
            }
            AssetError::EmptyImage { origin } => write!(f, "image {origin} has no pixels"),
            AssetError::SlotOutOfRange { slot, count } => {
                write!(f, "slot {slot} is out of range (0..{count})")
            }
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Split a `data:<mime>;base64,<payload>` URL into its mime type and decoded bytes.
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>), AssetError> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| AssetError::InvalidDataUrl("missing `data:` prefix".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetError::InvalidDataUrl("missing `,` separator".into()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| AssetError::InvalidDataUrl("only base64 payloads are supported".into()))?;
    let bytes = general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|err| AssetError::InvalidDataUrl(err.to_string()))?;
    Ok((mime.to_string(), bytes))
}

pub fn decode_image_bytes(origin: &str, bytes: &[u8]) -> Result<LoadedImage, AssetError> {
    let decoded = image::load_from_memory(bytes).map_err(|err| AssetError::Decode {
        origin: origin.to_string(),
        message: err.to_string(),
    })?;
    let pixels = decoded.to_rgba8();
    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(AssetError::EmptyImage {
            origin: origin.to_string(),
        });
    }
    Ok(LoadedImage::new(origin, pixels))
}

/// Lossless PNG bytes for an RGBA raster.
pub fn encode_png(image: &RgbaImage) -> ImageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgba8,
    )?;
    Ok(bytes)
}

pub fn load_image(source: &ImageSource) -> Result<LoadedImage, AssetError> {
    let origin = source.origin();
    let loaded = match source {
        ImageSource::Path(path) => {
            let bytes = std::fs::read(path).map_err(|source| AssetError::Read {
                path: path.clone(),
                source,
            })?;
            decode_image_bytes(&origin, &bytes)?
        }
        ImageSource::DataUrl(url) => {
            let (_, bytes) = decode_data_url(url)?;
            decode_image_bytes(&origin, &bytes)?
        }
        ImageSource::Bytes { bytes, .. } => decode_image_bytes(&origin, bytes)?,
    };
    tracing::debug!(
        origin = %loaded.origin,
        width = loaded.pixels.width(),
        height = loaded.pixels.height(),
        "image loaded"
    );
    Ok(loaded)
}

/// Average color over a stride grid of at most 64×64 samples, skipping fully transparent
/// pixels. `None` when every sampled pixel is transparent.
pub fn suggest_dominant_color(image: &RgbaImage) -> Option<Color> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }
    let step_x = width.div_ceil(COLOR_SAMPLE_GRID).max(1);
    let step_y = height.div_ceil(COLOR_SAMPLE_GRID).max(1);

    let mut sum = [0u64; 3];
    let mut count = 0u64;
    for y in (0..height).step_by(step_y as usize) {
        for x in (0..width).step_by(step_x as usize) {
            let [r, g, b, a] = image.get_pixel(x, y).0;
            if a == 0 {
                continue;
            }
            sum[0] += r as u64;
            sum[1] += g as u64;
            sum[2] += b as u64;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    let avg = |channel: u64| ((channel + count / 2) / count) as u8;
    Some(Color::rgb(avg(sum[0]), avg(sum[1]), avg(sum[2])))
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialReference {
    pub image: LoadedImage,
    pub color: Color,
}

/// The fixed set of material reference images, each bound to the color used for
/// materiality fills.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSlots {
    slots: [Option<MaterialReference>; MATERIAL_SLOT_COUNT],
    palette: [Color; MATERIAL_SLOT_COUNT],
}

impl Default for MaterialSlots {
    fn default() -> Self {
        Self::with_palette(&DEFAULT_REFERENCE_PALETTE)
    }
}

impl MaterialSlots {
    /// Slots whose fallback colors come from `palette`, cycling if it is short.
    pub fn with_palette(palette: &[Color]) -> Self {
        let mut colors = DEFAULT_REFERENCE_PALETTE;
        if !palette.is_empty() {
            for (index, color) in colors.iter_mut().enumerate() {
                *color = palette[index % palette.len()];
            }
        }
        Self {
            slots: Default::default(),
            palette: colors,
        }
    }

    fn check(slot: usize) -> Result<(), AssetError> {
        if slot >= MATERIAL_SLOT_COUNT {
            return Err(AssetError::SlotOutOfRange {
                slot,
                count: MATERIAL_SLOT_COUNT,
            });
        }
        Ok(())
    }

    /// Put `image` into `slot`, replacing what was there. Without an explicit color the
    /// image's dominant color is used, falling back to the slot's palette entry.
    pub fn attach(
        &mut self,
        slot: usize,
        image: LoadedImage,
        color: Option<Color>,
    ) -> Result<Color, AssetError> {
        Self::check(slot)?;
        let color = color
            .or_else(|| suggest_dominant_color(&image.pixels))
            .unwrap_or(self.palette[slot]);
        tracing::debug!(slot, origin = %image.origin, %color, "material reference attached");
        self.slots[slot] = Some(MaterialReference { image, color });
        Ok(color)
    }

    pub fn set_color(&mut self, slot: usize, color: Color) -> Result<bool, AssetError> {
        Self::check(slot)?;
        Ok(match self.slots[slot].as_mut() {
            Some(reference) => {
                reference.color = color;
                true
            }
            None => false,
        })
    }

    pub fn clear(&mut self, slot: usize) -> Option<MaterialReference> {
        self.slots.get_mut(slot)?.take()
    }

    pub fn clear_all(&mut self) {
        self.slots = Default::default();
    }

    pub fn get(&self, slot: usize) -> Option<&MaterialReference> {
        self.slots.get(slot)?.as_ref()
    }

    pub fn color_for(&self, slot: usize) -> Option<Color> {
        self.get(slot).map(|reference| reference.color)
    }

    pub fn iter_populated(&self) -> impl Iterator<Item = (usize, &MaterialReference)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, reference)| reference.as_ref().map(|r| (slot, r)))
    }

    pub fn populated_count(&self) -> usize {
        self.iter_populated().count()
    }
}

/// Earlier generated renders passed along for visual consistency.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriorRenders {
    slots: [Option<LoadedImage>; MAX_PRIOR_RENDERS],
}

impl PriorRenders {
    pub fn attach(&mut self, slot: usize, image: LoadedImage) -> Result<(), AssetError> {
        let entry = self.slots.get_mut(slot).ok_or(AssetError::SlotOutOfRange {
            slot,
            count: MAX_PRIOR_RENDERS,
        })?;
        *entry = Some(image);
        Ok(())
    }

    pub fn get(&self, slot: usize) -> Option<&LoadedImage> {
        self.slots.get(slot)?.as_ref()
    }

    pub fn clear(&mut self, slot: usize) -> Option<LoadedImage> {
        self.slots.get_mut(slot)?.take()
    }

    pub fn clear_all(&mut self) {
        self.slots = Default::default();
    }

    pub fn iter_populated(&self) -> impl Iterator<Item = (usize, &LoadedImage)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, image)| image.as_ref().map(|i| (slot, i)))
    }

    pub fn populated_count(&self) -> usize {
        self.iter_populated().count()
    }
}
