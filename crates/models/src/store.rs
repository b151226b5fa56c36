//! JSON persistence for fitted models.
//!
//! Writes go to a `.tmp` sibling first and are renamed into place, so a
//! reader never observes a half-written model file.

use crate::error::{ModelError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub fn save_model<M: Serialize>(path: &Path, model: &M) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path);
    {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        serde_json::to_writer(&mut writer, model)?;
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;

    info!("Saved model to {:?}", path);
    Ok(())
}

pub fn load_model<M: DeserializeOwned>(path: &Path) -> Result<M> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ModelError::NotFound {
            path: path.display().to_string(),
        },
        _ => ModelError::Io(e),
    })?;

    let model = serde_json::from_reader(BufReader::new(file))?;
    info!("Loaded model from {:?}", path);
    Ok(model)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
