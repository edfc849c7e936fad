//! Sidecar weight data stored next to the scene it belongs to.
use std::{
    fs,
    path::{Path, PathBuf},
};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    instance::BrushRef,
};

pub const DATA_EXTENSION: &str = "navmeshweightdata";
pub const ASSET_FILE_NAME: &str = "NavMeshWeightAssets.asset";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    pub brush: BrushRef,
    pub position: Vec3,
    pub local_scale: Vec3,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightAssets {
    pub records: Vec<WeightRecord>,
}

impl WeightAssets {
    pub fn new(records: Vec<WeightRecord>) -> Self {
        Self { records }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NoDataFound(path.to_path_buf()));
        }

        let data = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Writes the asset, replacing any previous file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }

        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data).map_err(|e| Error::io(path, e))?;

        tracing::info!(path = %path.display(), records = self.records.len(), "saved weight data");
        Ok(())
    }
}

/// `<scene dir>/<scene name>.navmeshweightdata/`, or `None` for an unsaved scene
pub fn data_directory(scene_path: &Path) -> Option<PathBuf> {
    let name = scene_path.file_stem()?;
    if name.is_empty() {
        return None;
    }

    let mut dir_name = name.to_os_string();
    dir_name.push(".");
    dir_name.push(DATA_EXTENSION);

    let parent = scene_path.parent().unwrap_or_else(|| Path::new(""));
    Some(parent.join(dir_name))
}

pub fn asset_path(scene_path: &Path) -> Option<PathBuf> {
    data_directory(scene_path).map(|v| v.join(ASSET_FILE_NAME))
}
