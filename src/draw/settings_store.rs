use crate::draw::settings::EngineSettings;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE_NAME: &str = "settings.json";

pub fn settings_path_from_exe_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(SETTINGS_FILE_NAME))
}

pub fn resolve_settings_path() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    settings_path_from_exe_path(&exe_path)
}

/// Settings next to the executable, or defaults when no file exists yet.
pub fn load() -> Result<EngineSettings> {
    let path = resolve_settings_path()?;
    match load_from_path(&path)? {
        Some(settings) => Ok(settings),
        None => {
            tracing::info!(path = %path.display(), "no settings file; using defaults");
            Ok(EngineSettings::default())
        }
    }
}

pub fn save(settings: &EngineSettings) -> Result<PathBuf> {
    let path = resolve_settings_path()?;
    save_to_path(&path, settings)?;
    Ok(path)
}

pub fn load_from_path(path: &Path) -> Result<Option<EngineSettings>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read settings file {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(Some(EngineSettings::default()));
    }

    let mut loaded: EngineSettings = serde_json::from_str(&content)
        .with_context(|| format!("deserialize settings file {}", path.display()))?;
    if loaded.sanitize() {
        tracing::warn!(path = %path.display(), "settings file had out-of-range values");
    }
    Ok(Some(loaded))
}

pub fn save_to_path(path: &Path, settings: &EngineSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create settings parent folder {}", parent.display()))?;
    }

    let mut sanitized = settings.clone();
    sanitized.sanitize();
    let json = serde_json::to_string_pretty(&sanitized).context("serialize settings")?;
    std::fs::write(path, json).with_context(|| format!("write settings file {}", path.display()))
}
