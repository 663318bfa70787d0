use crate::draw::assets::encode_png;
use crate::draw::session::AnnotationSession;
use anyhow::{anyhow, Context, Result};
use chrono::Local;
use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};

pub const EXPORT_SUBDIR: &str = "exports";

/// Which raster is currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayedKind {
    Result,
    Base,
}

impl DisplayedKind {
    pub fn suffix(self) -> &'static str {
        match self {
            DisplayedKind::Result => "result",
            DisplayedKind::Base => "base",
        }
    }
}

pub fn exe_relative_output_folder_from_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(EXPORT_SUBDIR))
}

pub fn ensure_output_folder() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    let output = exe_relative_output_folder_from_path(&exe_path)?;
    fs::create_dir_all(&output)
        .with_context(|| format!("create export folder {}", output.display()))?;
    Ok(output)
}

pub fn timestamped_stem(now: chrono::DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

pub fn build_filename(stem: &str, suffix: &str) -> String {
    format!("{}_{}.png", stem, suffix)
}

/// Write `image` as PNG to `<dir>/<stamp>_<kind>.png`.
pub fn export_image(
    image: &RgbaImage,
    kind: DisplayedKind,
    dir: &Path,
    now: chrono::DateTime<Local>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create export folder {}", dir.display()))?;
    let path = dir.join(build_filename(&timestamped_stem(now), kind.suffix()));
    let bytes = encode_png(image).with_context(|| format!("encode PNG for {}", path.display()))?;
    fs::write(&path, bytes).with_context(|| format!("write export {}", path.display()))?;
    tracing::info!(path = %path.display(), kind = kind.suffix(), "image exported");
    Ok(path)
}

/// Export whatever the session currently displays: the generated result if there is one,
/// the base image otherwise.
pub fn export_displayed(
    session: &AnnotationSession,
    dir: &Path,
    now: chrono::DateTime<Local>,
) -> Result<PathBuf> {
    let (image, kind) = session
        .displayed()
        .ok_or_else(|| anyhow!("nothing to export: no base image loaded"))?;
    export_image(image, kind, dir, now)
}

/// [`export_displayed`] into the `exports` folder next to the running executable.
pub fn export_displayed_default(
    session: &AnnotationSession,
    now: chrono::DateTime<Local>,
) -> Result<PathBuf> {
    if session.displayed().is_none() {
        return Err(anyhow!("nothing to export: no base image loaded"));
    }
    let dir = ensure_output_folder()?;
    export_displayed(session, &dir, now)
}
