use crate::output::{print_json, print_table};
use crate::root;
use anyhow::Context;
use std::path::Path;
use tasksync_core::config::SyncConfig;
use tasksync_core::task::{self, Task};
use tasksync_core::tree;

pub fn run(dir: &Path, output: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let root_path = match output {
        Some(path) => root::in_change_dir(dir, path),
        None => SyncConfig::load(dir)
            .context("failed to load tasksync.yaml")?
            .output_path(dir),
    };
    let tree = tree::load_tree(&root_path).context("failed to load task documents")?;

    let tasks: Vec<Task> = tree.tasks().into_iter().cloned().collect();
    let summary = task::summarize(&tasks);

    if json {
        print_json(&serde_json::json!({
            "root_path": tree.root_path,
            "version": tree.root.version(),
            "tasks": tasks,
            "orphans": tree.orphans,
            "skipped": tree.skipped,
            "summary": summary,
        }))?;
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks.");
    } else {
        let rows: Vec<Vec<String>> = tasks
            .iter()
            .map(|t| vec![t.id.clone(), t.status.to_string(), t.description.clone()])
            .collect();
        print_table(&["ID", "STATUS", "DESCRIPTION"], &rows);
    }
    for skipped in &tree.skipped {
        println!(
            "warning: ignored {}: {}",
            skipped.path.display(),
            skipped.reason
        );
    }
    for orphan in &tree.orphans {
        println!(
            "warning: {} references missing parent task {}",
            orphan.path.display(),
            orphan.parent
        );
    }
    println!("{summary}");
    Ok(())
}
