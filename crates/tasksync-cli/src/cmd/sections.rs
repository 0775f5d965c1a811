use crate::output::{print_json, print_table};
use anyhow::Context;
use serde::Serialize;
use std::path::Path;
use tasksync_core::capability::{match_section_to_capability, FsCapabilities};
use tasksync_core::split;
use tasksync_core::sync::{self as pipeline, SyncOptions};

#[derive(Serialize)]
struct SectionRow<'a> {
    number: &'a str,
    name: &'a str,
    lines: usize,
    tasks: usize,
    capability: Option<String>,
}

#[derive(Serialize)]
struct SectionsView<'a> {
    line_count: usize,
    loose_tasks: usize,
    would_split: bool,
    sections: Vec<SectionRow<'a>>,
}

pub fn run(dir: &Path, json: bool) -> anyhow::Result<()> {
    let options = SyncOptions::for_change(dir).context("failed to load tasksync.yaml")?;
    let outline = pipeline::sections(&options)?;
    let lookup = FsCapabilities::new(
        options.config.specs_path(dir),
        options.config.capability_marker.clone(),
    );

    let rows: Vec<SectionRow> = outline
        .sections
        .iter()
        .map(|s| SectionRow {
            number: &s.number,
            name: &s.name,
            lines: s.line_count(),
            tasks: s.tasks.len(),
            capability: match_section_to_capability(&s.name, &lookup),
        })
        .collect();
    let plan = split::split_sections(&outline, &lookup, options.config.child_layout());
    let view = SectionsView {
        line_count: outline.line_count,
        loose_tasks: outline.loose_tasks.len(),
        would_split: split::should_split(
            &outline,
            options.config.split_threshold,
            plan.has_hierarchy(),
        ),
        sections: rows,
    };

    if json {
        return print_json(&view);
    }
    if view.sections.is_empty() {
        println!("No sections.");
    } else {
        let table: Vec<Vec<String>> = view
            .sections
            .iter()
            .map(|r| {
                vec![
                    r.number.to_string(),
                    r.name.to_string(),
                    r.lines.to_string(),
                    r.tasks.to_string(),
                    r.capability.clone().unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();
        print_table(&["#", "SECTION", "LINES", "TASKS", "CAPABILITY"], &table);
    }
    println!(
        "{} lines, {} loose task(s), {}",
        view.line_count,
        view.loose_tasks,
        if view.would_split {
            "would split"
        } else {
            "stays flat"
        }
    );
    Ok(())
}
