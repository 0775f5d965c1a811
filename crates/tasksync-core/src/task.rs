use crate::error::{Result, SyncError};
use crate::types::TaskStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const REF_PREFIX: &str = "$ref:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub section: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<String>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        section: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            section: section.into(),
            description: description.into(),
            status: TaskStatus::Pending,
            children: None,
        }
    }

    /// A root-document task pointing at a child document.
    pub fn reference(id: impl Into<String>, section: impl Into<String>, rel_path: &str) -> Self {
        let section = section.into();
        Self {
            id: id.into(),
            description: section.clone(),
            section,
            status: TaskStatus::Pending,
            children: Some(format!("{REF_PREFIX}{rel_path}")),
        }
    }

    pub fn is_reference(&self) -> bool {
        self.children.is_some()
    }

    /// Relative path of the child document, without the `$ref:` prefix.
    pub fn child_path(&self) -> Option<&str> {
        self.children
            .as_deref()
            .and_then(|c| c.strip_prefix(REF_PREFIX))
    }

    /// Copy suitable for a child document: no section, no reference.
    pub fn detached(&self) -> Self {
        Self {
            section: String::new(),
            children: None,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// ID helpers
// ---------------------------------------------------------------------------

/// Leading numeric component of a task ID ("4.2" -> 4, "7" -> 7).
pub fn section_component(id: &str) -> Option<u64> {
    id.split('.').next().and_then(|s| s.parse().ok())
}

/// ID with its last dot-component removed ("1.2.3" -> "1.2"). `None` for
/// single-component IDs.
pub fn parent_id(id: &str) -> Option<&str> {
    id.rsplit_once('.').map(|(head, _)| head)
}

/// Every ID that occurs more than once, sorted and deduplicated.
pub fn find_duplicate_ids<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for task in tasks {
        *counts.entry(task.id.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(id, _)| id.to_string())
        .collect()
}

pub fn validate_unique_ids<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Result<()> {
    let dups = find_duplicate_ids(tasks);
    if dups.is_empty() {
        Ok(())
    } else {
        Err(SyncError::DuplicateIds(dups))
    }
}

// ---------------------------------------------------------------------------
// Task list operations
// ---------------------------------------------------------------------------

/// Set the status of every task with the given ID. Returns how many matched.
pub fn set_status(tasks: &mut [Task], id: &str, status: TaskStatus) -> usize {
    let mut hits = 0;
    for task in tasks.iter_mut().filter(|t| t.id == id) {
        task.status = status;
        hits += 1;
    }
    hits
}

/// Human-readable summary: "3/5 completed, 1 in progress"
pub fn summarize(tasks: &[Task]) -> String {
    let total = tasks.len();
    let done = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count();
    let in_progress = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::InProgress)
        .count();
    format!("{done}/{total} completed, {in_progress} in progress")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
