use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::settings;

pub(crate) fn resolve_tmp_dir(settings: &settings::Settings) -> Result<PathBuf> {
    let dir = match settings.server_tmp_dir.as_deref() {
        Some(dir) => PathBuf::from(dir),
        None => std::env::temp_dir().join("transcribe-translate"),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create tmp dir: {}", dir.display()))?;
    Ok(dir)
}
