use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::fields::FieldKind;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub columns: ColumnNames,
    pub division: DivisionConfig,
    pub assets: AssetsConfig,
    pub uploads: UploadsConfig,
    pub photo: PhotoConfig,
    /// Explicit field lists that replace marker slicing for a section.
    pub sections: Vec<SectionOverride>,
    /// Explicit kind tags that replace name classification for a column.
    pub field_kinds: BTreeMap<String, FieldKind>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub table: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnNames {
    pub id: String,
    pub pin: String,
    pub full_name: String,
    pub photo: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DivisionConfig {
    pub default_option: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    pub stylesheet: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhotoConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionOverride {
    pub key: String,
    pub fields: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            columns: ColumnNames::default(),
            division: DivisionConfig::default(),
            assets: AssetsConfig::default(),
            uploads: UploadsConfig::default(),
            photo: PhotoConfig::default(),
            sections: Vec::new(),
            field_kinds: BTreeMap::new(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("database/employee_center.db"),
            table: "employee_center".to_string(),
        }
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            id: "Employee UID# (EUID#)".to_string(),
            pin: "PIN".to_string(),
            full_name: "Employee Full Name".to_string(),
            photo: "Photograph".to_string(),
        }
    }
}

impl Default for DivisionConfig {
    fn default() -> Self {
        Self {
            default_option: "Philocaly Spaces Pvt. Ltd.".to_string(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            stylesheet: PathBuf::from("assets/styles.css"),
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
        }
    }
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.to_string_lossy()))?;
        Self::from_toml(&text)
            .with_context(|| format!("invalid config {}", path.to_string_lossy()))
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(text)?;
        if cfg.store.table.trim().is_empty() {
            anyhow::bail!("store.table must not be empty");
        }
        if cfg.columns.id.trim().is_empty() {
            anyhow::bail!("columns.id must not be empty");
        }
        Ok(cfg)
    }

    pub fn section_override(&self, key: &str) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.fields.as_slice())
    }
}
