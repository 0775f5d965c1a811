use crate::document::TasksDocument;
use crate::error::{Result, SyncError};
use crate::paths;
use crate::task::{self, Task};
use crate::types::TaskStatus;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// DocumentTree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedChild {
    pub path: PathBuf,
    pub parent: String,
    pub document: TasksDocument,
}

/// A child document whose `parent` is not a task in the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanChild {
    pub path: PathBuf,
    pub parent: String,
}

/// A file matched by `includes` that could not be used as a child document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedInclude {
    pub path: PathBuf,
    pub reason: String,
}

/// A root document plus every child document its `includes` resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTree {
    pub root_path: PathBuf,
    pub root: TasksDocument,
    pub children: Vec<LoadedChild>,
    pub orphans: Vec<OrphanChild>,
    pub skipped: Vec<SkippedInclude>,
}

impl DocumentTree {
    /// Load the tree rooted at `root_path`. Returns `Ok(None)` when there is
    /// no root document yet.
    pub fn load(root_path: &Path) -> Result<Option<Self>> {
        if !root_path.is_file() {
            return Ok(None);
        }
        let root = TasksDocument::load(root_path)?;
        let mut tree = DocumentTree {
            root_path: root_path.to_path_buf(),
            root,
            children: Vec::new(),
            orphans: Vec::new(),
            skipped: Vec::new(),
        };
        if matches!(tree.root, TasksDocument::Root { .. }) {
            tree.load_children()?;
        }
        Ok(Some(tree))
    }

    fn base_dir(&self) -> &Path {
        self.root_path.parent().unwrap_or(Path::new("."))
    }

    fn load_children(&mut self) -> Result<()> {
        let root_ids: BTreeSet<&str> = self.root.tasks().iter().map(|t| t.id.as_str()).collect();
        let mut seen: BTreeSet<PathBuf> = BTreeSet::new();
        let mut children = Vec::new();
        let mut orphans = Vec::new();
        let mut skipped = Vec::new();

        for pattern in self.root.includes() {
            for path in paths::resolve_includes(self.base_dir(), pattern)? {
                if path == self.root_path || !seen.insert(path.clone()) {
                    continue;
                }
                let document = match TasksDocument::load(&path) {
                    Ok(document) => document,
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "included file is not a readable task document; skipping"
                        );
                        skipped.push(SkippedInclude {
                            path,
                            reason: e.to_string(),
                        });
                        continue;
                    }
                };
                let Some(parent) = document.parent().map(str::to_string) else {
                    tracing::warn!(
                        path = %path.display(),
                        "included document is not a child document; skipping"
                    );
                    skipped.push(SkippedInclude {
                        path,
                        reason: format!(
                            "version {} document has no parent",
                            document.version()
                        ),
                    });
                    continue;
                };
                if !root_ids.contains(parent.as_str()) {
                    tracing::warn!(
                        path = %path.display(),
                        parent = %parent,
                        "child document references a parent task missing from the root; skipping"
                    );
                    orphans.push(OrphanChild { path, parent });
                    continue;
                }
                children.push(LoadedChild {
                    path,
                    parent,
                    document,
                });
            }
        }
        self.children = children;
        self.orphans = orphans;
        self.skipped = skipped;
        Ok(())
    }

    /// Tasks in reading order, with each reference task replaced by the
    /// tasks of the child document it points to (when that child loaded).
    pub fn tasks(&self) -> Vec<&Task> {
        let base = self.base_dir();
        let mut out = Vec::new();
        for t in self.root.tasks() {
            let child = t
                .child_path()
                .map(|rel| paths::join_rel(base, rel))
                .and_then(|p| self.children.iter().find(|c| c.path == p));
            match child {
                Some(child) => out.extend(child.document.tasks()),
                None => out.push(t),
            }
        }
        out
    }

    /// Set `id`'s status wherever it appears (a task and the reference
    /// mirroring it) and save the documents that changed.
    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> Result<Vec<PathBuf>> {
        let mut changed = Vec::new();
        if task::set_status(self.root.tasks_mut(), id, status) > 0 {
            self.root.save(&self.root_path)?;
            changed.push(self.root_path.clone());
        }
        for child in &mut self.children {
            if task::set_status(child.document.tasks_mut(), id, status) > 0 {
                child.document.save(&child.path)?;
                changed.push(child.path.clone());
            }
        }
        if changed.is_empty() {
            return Err(SyncError::TaskNotFound(id.to_string()));
        }
        tracing::info!(id, status = %status, files = changed.len(), "updated task status");
        Ok(changed)
    }
}

/// Load the tree rooted at `root_path`, failing if the root is missing.
pub fn load_tree(root_path: &Path) -> Result<DocumentTree> {
    DocumentTree::load(root_path)?
        .ok_or_else(|| SyncError::DocumentNotFound(root_path.to_path_buf()))
}

/// Set a task's status in the tree rooted at `root_path`.
pub fn set_task_status(root_path: &Path, id: &str, status: TaskStatus) -> Result<Vec<PathBuf>> {
    load_tree(root_path)?.set_status(id, status)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
