use crate::append::{self, AppendConfig};
use crate::capability::{CapabilityLookup, FsCapabilities};
use crate::config::SyncConfig;
use crate::document::TasksDocument;
use crate::error::Result;
use crate::io;
use crate::merge::{self, StatusMap};
use crate::outline;
use crate::paths;
use crate::split::{self, OversizedSection};
use crate::task;
use crate::tree::{OrphanChild, SkippedInclude};
use crate::types::Layout;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// SyncOptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub change_dir: PathBuf,
    pub config: SyncConfig,
    /// Overrides `config.outline_file`.
    pub outline: Option<PathBuf>,
    /// Overrides `config.output_file`.
    pub output: Option<PathBuf>,
    /// Overrides `config.append`.
    pub append: Option<AppendConfig>,
    /// Statuses layered over whatever the previous tree recorded.
    pub statuses: Option<StatusMap>,
}

impl SyncOptions {
    /// Options for `change_dir` using its `tasksync.yaml` (or defaults).
    pub fn for_change(change_dir: impl Into<PathBuf>) -> Result<Self> {
        let change_dir = change_dir.into();
        let config = SyncConfig::load(&change_dir)?;
        Ok(Self::with_config(change_dir, config))
    }

    pub fn with_config(change_dir: impl Into<PathBuf>, config: SyncConfig) -> Self {
        Self {
            change_dir: change_dir.into(),
            config,
            outline: None,
            output: None,
            append: None,
            statuses: None,
        }
    }

    pub fn outline_path(&self) -> PathBuf {
        self.outline
            .clone()
            .unwrap_or_else(|| self.config.outline_path(&self.change_dir))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.config.output_path(&self.change_dir))
    }

    fn append_config(&self) -> Option<&AppendConfig> {
        self.append.as_ref().or(self.config.append.as_ref())
    }
}

// ---------------------------------------------------------------------------
// SyncReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub layout: Layout,
    pub root_path: PathBuf,
    pub child_paths: Vec<PathBuf>,
    pub task_count: usize,
    pub carried_statuses: usize,
    /// IDs seen for the first time in this generation.
    pub new_tasks: Vec<String>,
    pub appended: Vec<String>,
    pub orphans: Vec<OrphanChild>,
    /// Included files ignored because they are not child documents.
    pub skipped: Vec<SkippedInclude>,
    pub removed_children: Vec<PathBuf>,
    pub oversized_sections: Vec<OversizedSection>,
    pub summary: String,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Regenerate the task document tree for a change, matching capabilities
/// against `<change_dir>/<specs_dir>/<name>/<capability_marker>`.
pub fn sync(options: &SyncOptions) -> Result<SyncReport> {
    let lookup = FsCapabilities::new(
        options.config.specs_path(&options.change_dir),
        options.config.capability_marker.clone(),
    );
    sync_with(options, &lookup)
}

/// [`sync`] with an explicit capability lookup.
///
/// Parse, append, validate IDs, split, merge previous statuses, then
/// serialize and self-validate every document before anything is written.
pub fn sync_with(options: &SyncOptions, lookup: &dyn CapabilityLookup) -> Result<SyncReport> {
    options.config.ensure_valid()?;
    let outline_path = options.outline_path();
    let root_path = options.output_path();
    let threshold = options.config.split_threshold;

    let mut outline = outline::parse_outline_file(&outline_path)?;
    tracing::debug!(
        path = %outline_path.display(),
        lines = outline.line_count,
        sections = outline.sections.len(),
        tasks = outline.task_count(),
        "parsed outline"
    );

    let appended = match options.append_config() {
        Some(config) => append::inject(&mut outline, config)?,
        None => Vec::new(),
    };
    task::validate_unique_ids(outline.tasks())?;

    let previous = merge::load_statuses(&root_path)?;
    let mut statuses = previous.statuses;
    if let Some(extra) = &options.statuses {
        statuses.extend(extra.iter().map(|(id, s)| (id.clone(), *s)));
    }
    let new_tasks: Vec<String> = outline
        .tasks()
        .filter(|t| !statuses.contains_key(&t.id))
        .map(|t| t.id.clone())
        .collect();

    let layout = options.config.child_layout();
    let plan = split::split_sections(&outline, lookup, layout);
    let hierarchical = split::should_split(&outline, threshold, plan.has_hierarchy());
    let base_dir = root_path.parent().unwrap_or(Path::new("."));

    let mut documents: Vec<(PathBuf, TasksDocument)> = Vec::new();
    if hierarchical {
        documents.push((
            root_path.clone(),
            TasksDocument::Root {
                includes: vec![layout.include_glob()],
                tasks: plan.root_tasks,
            },
        ));
        for child in plan.children {
            tracing::debug!(
                capability = %child.capability,
                parent = %child.parent,
                tasks = child.tasks.len(),
                "splitting section into child document"
            );
            documents.push((
                paths::join_rel(base_dir, &child.rel_path),
                TasksDocument::Child {
                    parent: child.parent,
                    tasks: child.tasks,
                },
            ));
        }
    } else {
        documents.push((
            root_path.clone(),
            TasksDocument::Flat {
                tasks: split::flatten(&outline),
            },
        ));
    }

    // Reference tasks mirror a child task's ID; count each ID once.
    let mut carried_ids: BTreeSet<String> = BTreeSet::new();
    for (_, doc) in &mut documents {
        merge::apply_statuses(doc.tasks_mut(), &statuses);
        carried_ids.extend(
            doc.tasks()
                .iter()
                .filter(|t| statuses.contains_key(&t.id))
                .map(|t| t.id.clone()),
        );
    }

    let mut encoded = Vec::with_capacity(documents.len());
    for (path, doc) in &documents {
        encoded.push((path, doc.encode()?));
    }
    for (path, text) in &encoded {
        io::write_document(path, text.as_bytes())?;
        tracing::info!(path = %path.display(), "wrote task document");
    }

    let child_paths: Vec<PathBuf> = documents
        .iter()
        .skip(1)
        .map(|(path, _)| path.clone())
        .collect();
    let mut removed_children = Vec::new();
    for stale in previous
        .child_paths
        .into_iter()
        .filter(|p| !child_paths.contains(p))
    {
        if io::remove_if_exists(&stale)? {
            tracing::info!(path = %stale.display(), "removed stale child document");
            removed_children.push(stale);
        }
    }

    let mut summary_tasks: Vec<task::Task> = outline.tasks().cloned().collect();
    merge::apply_statuses(&mut summary_tasks, &statuses);

    Ok(SyncReport {
        layout: if hierarchical {
            Layout::Hierarchical
        } else {
            Layout::Flat
        },
        root_path,
        child_paths,
        task_count: summary_tasks.len(),
        carried_statuses: carried_ids.len(),
        new_tasks,
        appended,
        orphans: previous.orphans,
        skipped: previous.skipped,
        removed_children,
        oversized_sections: split::oversized_sections(&outline, threshold),
        summary: task::summarize(&summary_tasks),
    })
}

/// Parse a change's outline without writing anything.
pub fn sections(options: &SyncOptions) -> Result<outline::Outline> {
    outline::parse_outline_file(&options.outline_path())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
