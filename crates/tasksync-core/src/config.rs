use crate::append::AppendConfig;
use crate::error::{Result, SyncError};
use crate::paths;
use crate::split::{ChildLayout, DEFAULT_SPLIT_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

/// Per-change settings, read from `tasksync.yaml` in the change directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_outline_file")]
    pub outline_file: String,
    #[serde(default = "default_output_file")]
    pub output_file: String,
    #[serde(default = "default_specs_dir")]
    pub specs_dir: String,
    #[serde(default = "default_capability_marker")]
    pub capability_marker: String,
    #[serde(default = "default_split_threshold")]
    pub split_threshold: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append: Option<AppendConfig>,
}

fn default_outline_file() -> String {
    paths::OUTLINE_FILE.to_string()
}

fn default_output_file() -> String {
    paths::TASKS_FILE.to_string()
}

fn default_specs_dir() -> String {
    paths::SPECS_DIR.to_string()
}

fn default_capability_marker() -> String {
    paths::CAPABILITY_MARKER.to_string()
}

fn default_split_threshold() -> usize {
    DEFAULT_SPLIT_THRESHOLD
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            outline_file: default_outline_file(),
            output_file: default_output_file(),
            specs_dir: default_specs_dir(),
            capability_marker: default_capability_marker(),
            split_threshold: default_split_threshold(),
            append: None,
        }
    }
}

impl SyncConfig {
    /// Load `tasksync.yaml` from `change_dir`, or defaults if absent.
    pub fn load(change_dir: &Path) -> Result<Self> {
        let path = paths::config_path(change_dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let config: SyncConfig = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    pub fn outline_path(&self, change_dir: &Path) -> PathBuf {
        change_dir.join(&self.outline_file)
    }

    pub fn output_path(&self, change_dir: &Path) -> PathBuf {
        change_dir.join(&self.output_file)
    }

    pub fn specs_path(&self, change_dir: &Path) -> PathBuf {
        change_dir.join(&self.specs_dir)
    }

    pub fn child_layout(&self) -> ChildLayout<'_> {
        ChildLayout {
            specs_dir: &self.specs_dir,
            file: &self.output_file,
        }
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        for (field, value) in [
            ("outline_file", &self.outline_file),
            ("output_file", &self.output_file),
            ("capability_marker", &self.capability_marker),
        ] {
            if value.trim().is_empty() {
                error(format!("{field} must not be empty"));
            } else if value.contains(&['/', '\\'][..]) {
                error(format!("{field} must be a plain file name, got '{value}'"));
            }
        }
        if self.specs_dir.trim().is_empty()
            || self.specs_dir.starts_with('/')
            || self.specs_dir.split('/').any(|s| s == "..")
        {
            error(format!(
                "specs_dir must be a relative path inside the change directory, got '{}'",
                self.specs_dir
            ));
        }
        if self.specs_dir.contains(&['*', '?'][..]) {
            error("specs_dir must not contain glob characters".to_string());
        }
        if self.split_threshold == 0 {
            error("split_threshold must be greater than zero".to_string());
        }

        if self.outline_file == self.output_file {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "outline_file and output_file must differ".to_string(),
            });
        }
        if !self.output_file.ends_with(".jsonc") && !self.output_file.ends_with(".json") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "output_file '{}' does not end in .jsonc or .json",
                    self.output_file
                ),
            });
        }
        if let Some(append) = &self.append {
            if append.tasks.iter().any(|t| t.contains('\n')) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "append tasks contain newlines; they are kept verbatim".to_string(),
                });
            }
        }
        warnings
    }

    /// Fail on the first error-level warning.
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(SyncError::InvalidConfig(w.message)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
