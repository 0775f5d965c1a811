use crate::document::TasksDocument;
use crate::error::Result;
use crate::task::Task;
use crate::tree::{DocumentTree, OrphanChild, SkippedInclude};
use crate::types::TaskStatus;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Recorded status per task ID.
pub type StatusMap = BTreeMap<String, TaskStatus>;

/// Statuses recovered from the previous generation of a document tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLoad {
    pub statuses: StatusMap,
    pub orphans: Vec<OrphanChild>,
    /// Included files that were not usable child documents.
    pub skipped: Vec<SkippedInclude>,
    /// Child documents of the previous generation that were attached to a
    /// root task. Orphans are listed in `orphans` instead.
    pub child_paths: Vec<PathBuf>,
}

/// Load statuses from the tree rooted at `root_path`.
///
/// A flat document contributes its own tasks. A hierarchical root
/// contributes its reference tasks first, then every child document, so a
/// child's record of a task wins over the mirroring reference. Orphaned
/// children are skipped and reported. A missing root yields an empty map.
pub fn load_statuses(root_path: &Path) -> Result<StatusLoad> {
    let Some(tree) = DocumentTree::load(root_path)? else {
        return Ok(StatusLoad::default());
    };

    let mut statuses = StatusMap::new();
    record(&mut statuses, tree.root.tasks());
    if let TasksDocument::Root { .. } = tree.root {
        for child in &tree.children {
            record(&mut statuses, child.document.tasks());
        }
    }
    tracing::debug!(
        path = %root_path.display(),
        version = tree.root.version(),
        statuses = statuses.len(),
        orphans = tree.orphans.len(),
        skipped = tree.skipped.len(),
        "loaded previous task statuses"
    );
    Ok(StatusLoad {
        statuses,
        child_paths: tree.children.iter().map(|c| c.path.clone()).collect(),
        orphans: tree.orphans,
        skipped: tree.skipped,
    })
}

fn record(statuses: &mut StatusMap, tasks: &[Task]) {
    for t in tasks {
        statuses.insert(t.id.clone(), t.status);
    }
}

/// Apply recorded statuses by exact ID. Tasks without a record keep their
/// current (default `pending`) status. Returns how many tasks matched.
pub fn apply_statuses(tasks: &mut [Task], statuses: &StatusMap) -> usize {
    let mut carried = 0;
    for t in tasks.iter_mut() {
        if let Some(status) = statuses.get(&t.id) {
            t.status = *status;
            carried += 1;
        }
    }
    carried
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
