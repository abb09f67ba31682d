use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{chart::Chart, render::Style};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    pub settings: Settings,
    pub charts: Vec<Box<dyn Chart>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory the charts' data paths are resolved against.
    pub data_root: PathBuf,
    /// Directory the charts' output files are written below.
    pub output_dir: PathBuf,
    #[serde(default)]
    pub style: Style,
}

impl Settings {
    pub fn data_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.data_root.join(rel)
    }

    pub fn out_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.output_dir.join(rel)
    }
}
