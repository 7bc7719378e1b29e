use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::{Map, Value as JsonValue};
use tracing::warn;

pub const DEFAULT_EXPORT_DIR: &str = "exports";
pub const DEFAULT_INSTITUTION_HEADER: &str = "Somerset Academy Sky Pointe \u{2022} U.S. History 8";
pub const DEFAULT_AUDIT_COLUMNS: [&str; 2] = ["Last Updated (PT)", "Source Version"];

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_path: Option<PathBuf>,
    pub export_dir: PathBuf,
    pub sheet: Option<String>,
    pub institution_header: String,
    pub audit_columns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: None,
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            sheet: None,
            institution_header: DEFAULT_INSTITUTION_HEADER.to_string(),
            audit_columns: DEFAULT_AUDIT_COLUMNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Reads a JSON settings file. Unknown keys are ignored and keys with the
    /// wrong type keep their default.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.to_string_lossy()))?;
        let value: JsonValue = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse settings {}", path.to_string_lossy()))?;
        let obj = value
            .as_object()
            .with_context(|| format!("settings {} must be a JSON object", path.to_string_lossy()))?;
        Ok(Self::from_object(obj))
    }

    pub fn from_object(obj: &Map<String, JsonValue>) -> Self {
        let mut s = Self::default();

        if let Some(v) = obj.get("dataPath") {
            match non_empty_str(v) {
                Some(p) => s.data_path = Some(PathBuf::from(p)),
                None => warn!("settings: dataPath must be a non-empty string"),
            }
        }
        if let Some(v) = obj.get("exportDir") {
            match non_empty_str(v) {
                Some(p) => s.export_dir = PathBuf::from(p),
                None => warn!("settings: exportDir must be a non-empty string"),
            }
        }
        if let Some(v) = obj.get("sheet") {
            match non_empty_str(v) {
                Some(name) => s.sheet = Some(name),
                None => warn!("settings: sheet must be a non-empty string"),
            }
        }
        if let Some(v) = obj.get("institutionHeader") {
            match non_empty_str(v) {
                Some(h) => s.institution_header = h,
                None => warn!("settings: institutionHeader must be a non-empty string"),
            }
        }
        if let Some(v) = obj.get("auditColumns") {
            match v.as_array() {
                Some(arr) => {
                    s.audit_columns = arr
                        .iter()
                        .filter_map(|c| c.as_str())
                        .map(|c| c.trim().to_string())
                        .filter(|c| !c.is_empty())
                        .collect();
                }
                None => warn!("settings: auditColumns must be an array of strings"),
            }
        }
        s
    }

    /// Export directory for a dataset stored at `data_path`; relative paths
    /// are taken from the dataset's directory.
    pub fn export_root(&self, data_path: &Path) -> PathBuf {
        if self.export_dir.is_absolute() {
            return self.export_dir.clone();
        }
        data_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&self.export_dir)
    }
}

fn non_empty_str(v: &JsonValue) -> Option<String> {
    v.as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
