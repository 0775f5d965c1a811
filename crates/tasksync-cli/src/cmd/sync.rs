use crate::output::{print_json, print_table};
use crate::root;
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use tasksync_core::append::AppendConfig;
use tasksync_core::sync::{self as pipeline, SyncOptions, SyncReport};

#[derive(Args)]
pub struct SyncArgs {
    /// Outline to read, relative to the change directory (default: tasks.md)
    #[arg(long)]
    outline: Option<PathBuf>,

    /// Root document to write, relative to the change directory
    /// (default: tasks.jsonc)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Task to append after the outline's last section (repeatable)
    #[arg(long = "append", value_name = "TASK")]
    append: Vec<String>,

    /// Section name for appended tasks
    #[arg(long)]
    append_section: Option<String>,

    /// YAML file with `section` and `tasks` to append, relative to the change
    /// directory
    #[arg(long)]
    append_file: Option<PathBuf>,
}

impl SyncArgs {
    fn append_config(&self, dir: &Path) -> anyhow::Result<Option<AppendConfig>> {
        let mut config = match &self.append_file {
            Some(path) => AppendConfig::load(&root::in_change_dir(dir, path))
                .with_context(|| format!("failed to read append file {}", path.display()))?,
            None if self.append.is_empty() => return Ok(None),
            None => AppendConfig::default(),
        };
        config.tasks.extend(self.append.iter().cloned());
        if let Some(section) = self.append_section.as_deref() {
            if !section.trim().is_empty() {
                config.section = section.to_string();
            }
        }
        Ok(Some(config))
    }
}

pub fn run(dir: &Path, args: SyncArgs, json: bool) -> anyhow::Result<()> {
    let mut options = SyncOptions::for_change(dir).context("failed to load tasksync.yaml")?;
    options.append = args.append_config(dir)?;
    options.outline = args.outline.map(|p| root::in_change_dir(dir, &p));
    options.output = args.output.map(|p| root::in_change_dir(dir, &p));

    let report = pipeline::sync(&options)?;

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    println!(
        "Wrote {} task document ({}): {}",
        report.layout,
        report.task_count,
        report.root_path.display()
    );
    if !report.child_paths.is_empty() {
        let rows: Vec<Vec<String>> = report
            .child_paths
            .iter()
            .map(|p| vec![p.display().to_string()])
            .collect();
        print_table(&["CHILD DOCUMENT"], &rows);
    }
    for path in &report.removed_children {
        println!("Removed stale child document: {}", path.display());
    }
    for skipped in &report.skipped {
        println!(
            "warning: ignored {}: {}",
            skipped.path.display(),
            skipped.reason
        );
    }
    for orphan in &report.orphans {
        println!(
            "warning: {} references missing parent task {}",
            orphan.path.display(),
            orphan.parent
        );
    }
    for section in &report.oversized_sections {
        println!(
            "note: section '{}' spans {} lines; {} subsection group(s)",
            section.name,
            section.line_count,
            section.groups.len()
        );
    }
    if !report.appended.is_empty() {
        println!("Appended: {}", report.appended.join(", "));
    }
    if !report.new_tasks.is_empty() {
        println!("New tasks: {}", report.new_tasks.join(", "));
    }
    println!("{}", report.summary);
}
