use crate::error::{Result, SyncError};
use crate::outline::{Outline, Section};
use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_APPEND_SECTION: &str = "Automated Tasks";

/// Extra tasks to synthesize after everything the outline defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendConfig {
    #[serde(default = "default_section")]
    pub section: String,
    #[serde(default)]
    pub tasks: Vec<String>,
}

fn default_section() -> String {
    DEFAULT_APPEND_SECTION.to_string()
}

impl Default for AppendConfig {
    fn default() -> Self {
        Self {
            section: default_section(),
            tasks: Vec::new(),
        }
    }
}

impl AppendConfig {
    pub fn new<I, S>(section: Option<String>, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            section: section
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(default_section),
            tasks: tasks.into_iter().map(Into::into).collect(),
        }
    }

    /// Read an append directive from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: AppendConfig = serde_yaml::from_str(&data)?;
        Ok(config)
    }
}

/// Append the configured tasks as a trailing section numbered one past the
/// highest section component of any existing ID. Returns the new IDs.
pub fn inject(outline: &mut Outline, config: &AppendConfig) -> Result<Vec<String>> {
    if config.tasks.is_empty() {
        return Ok(Vec::new());
    }
    let number = outline
        .next_section_number()
        .ok_or(SyncError::SectionNumberOverflow)?;
    let tasks: Vec<Task> = config
        .tasks
        .iter()
        .enumerate()
        .map(|(i, desc)| Task::new(format!("{number}.{}", i + 1), config.section.clone(), desc))
        .collect();
    let ids = tasks.iter().map(|t| t.id.clone()).collect();
    outline.sections.push(Section {
        name: config.section.clone(),
        number: number.to_string(),
        start_line: 0,
        end_line: 0,
        tasks,
    });
    tracing::debug!(section = %config.section, number, count = config.tasks.len(), "appended tasks");
    Ok(ids)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
