use crate::output::print_json;
use crate::root;
use anyhow::Context;
use std::path::Path;
use tasksync_core::config::SyncConfig;
use tasksync_core::tree;
use tasksync_core::types::TaskStatus;

pub fn run(
    dir: &Path,
    id: &str,
    status: &str,
    output: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let status: TaskStatus = status.parse()?;
    let root_path = match output {
        Some(path) => root::in_change_dir(dir, path),
        None => SyncConfig::load(dir)
            .context("failed to load tasksync.yaml")?
            .output_path(dir),
    };
    let changed = tree::set_task_status(&root_path, id, status)
        .with_context(|| format!("failed to set status of task '{id}'"))?;

    if json {
        print_json(&serde_json::json!({
            "id": id,
            "status": status,
            "files": changed,
        }))?;
    } else {
        println!("Task [{id}] is now {status}");
    }
    Ok(())
}
