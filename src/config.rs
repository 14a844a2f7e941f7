use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::data::schema::ReactiveFlowSchema;
use crate::kernel::KernelSettings;
use crate::preprocess::{Centering, Scaling};

/// How the state matrix is normalised before any distance is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessSettings {
    pub centering: Centering,
    pub scaling: Scaling,
}

/// Top-level settings, read from a JSON file. Every field has a default.
///
/// ```json
/// {
///   "reactive_flow": { "labels": { "file_name": "labels.csv", "entries": 37 } },
///   "kernel": { "number_to_pick": 100, "sigma": 1.0, "rank": 30 },
///   "preprocess": { "centering": "mean", "scaling": "auto" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub reactive_flow: ReactiveFlowSchema,
    pub kernel: KernelSettings,
    pub preprocess: PreprocessSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!("settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Settings from `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Settings::default()), Settings::load)
    }
}
