use crate::capability::{self, CapabilityLookup};
use crate::outline::Outline;
use crate::paths;
use crate::task::{self, Task};
use serde::Serialize;
use std::collections::BTreeSet;

/// Outlines longer than this many lines are candidates for splitting.
pub const DEFAULT_SPLIT_THRESHOLD: usize = 100;

// ---------------------------------------------------------------------------
// SplitPlan
// ---------------------------------------------------------------------------

/// Tasks moved out of the root into their own document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildPlan {
    pub capability: String,
    pub section: String,
    /// ID of the root reference task, i.e. the section's first task.
    pub parent: String,
    /// Path relative to the root document's directory, `/`-separated.
    pub rel_path: String,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitPlan {
    pub root_tasks: Vec<Task>,
    pub children: Vec<ChildPlan>,
}

impl SplitPlan {
    pub fn has_hierarchy(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Where child documents live, relative to the root document.
#[derive(Debug, Clone, Copy)]
pub struct ChildLayout<'a> {
    pub specs_dir: &'a str,
    pub file: &'a str,
}

impl Default for ChildLayout<'_> {
    fn default() -> Self {
        Self {
            specs_dir: paths::SPECS_DIR,
            file: paths::TASKS_FILE,
        }
    }
}

impl ChildLayout<'_> {
    pub fn include_glob(&self) -> String {
        paths::include_glob(self.specs_dir, self.file)
    }
}

/// Partition the outline by capability.
///
/// Each section whose normalized name names an existing capability becomes a
/// reference task in the root plus a child document holding the section's
/// tasks. Everything else stays in the root in document order.
pub fn split_sections(
    outline: &Outline,
    lookup: &dyn CapabilityLookup,
    layout: ChildLayout<'_>,
) -> SplitPlan {
    let mut plan = SplitPlan {
        root_tasks: outline.loose_tasks.clone(),
        children: Vec::new(),
    };
    let mut claimed: BTreeSet<String> = BTreeSet::new();

    for section in &outline.sections {
        let matched = capability::match_section_to_capability(&section.name, lookup);
        let (Some(capability), Some(first)) = (matched, section.tasks.first()) else {
            plan.root_tasks.extend(section.tasks.iter().cloned());
            continue;
        };
        if !claimed.insert(capability.clone()) {
            tracing::warn!(
                section = %section.name,
                capability = %capability,
                "capability already claimed by an earlier section; keeping tasks in root"
            );
            plan.root_tasks.extend(section.tasks.iter().cloned());
            continue;
        }

        let rel_path = paths::child_rel_path(layout.specs_dir, &capability, layout.file);
        plan.root_tasks
            .push(Task::reference(first.id.clone(), section.name.clone(), &rel_path));
        plan.children.push(ChildPlan {
            capability,
            section: section.name.clone(),
            parent: first.id.clone(),
            rel_path,
            tasks: section.tasks.iter().map(Task::detached).collect(),
        });
    }
    plan
}

/// Every task in document order, for a flat document.
pub fn flatten(outline: &Outline) -> Vec<Task> {
    outline.tasks().cloned().collect()
}

/// Split only long outlines with at least two sections, one of which matched
/// a capability.
pub fn should_split(outline: &Outline, threshold: usize, has_hierarchy: bool) -> bool {
    has_hierarchy && outline.sections.len() >= 2 && outline.line_count > threshold
}

// ---------------------------------------------------------------------------
// Subsection grouping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubsectionGroup {
    /// Shared ID prefix; empty for single-component IDs.
    pub prefix: String,
    pub tasks: Vec<Task>,
}

/// Group consecutive tasks sharing the same parent ID ("1.2.3" -> "1.2").
pub fn group_by_parent_id(tasks: &[Task]) -> Vec<SubsectionGroup> {
    let mut groups: Vec<SubsectionGroup> = Vec::new();
    for t in tasks {
        let prefix = task::parent_id(&t.id).unwrap_or_default();
        match groups.last_mut() {
            Some(group) if group.prefix == prefix => group.tasks.push(t.clone()),
            _ => groups.push(SubsectionGroup {
                prefix: prefix.to_string(),
                tasks: vec![t.clone()],
            }),
        }
    }
    groups
}

/// A single section that is itself longer than the split threshold.
///
/// Report-only: the section still becomes exactly one child document (or
/// stays in the root). Outline task IDs are always `<section>.<n>`, so
/// `groups` holds a single group unless the tasks were built elsewhere with
/// deeper IDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OversizedSection {
    pub name: String,
    pub number: String,
    pub line_count: usize,
    pub groups: Vec<SubsectionGroup>,
}

/// Describe sections longer than `threshold`. Nothing is split further.
pub fn oversized_sections(outline: &Outline, threshold: usize) -> Vec<OversizedSection> {
    outline
        .sections
        .iter()
        .filter(|s| s.line_count() > threshold)
        .map(|s| OversizedSection {
            name: s.name.clone(),
            number: s.number.clone(),
            line_count: s.line_count(),
            groups: group_by_parent_id(&s.tasks),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::KnownCapabilities;
    use crate::outline::parse_outline;

    const TWO_SECTIONS: &str = "## 1. Foundation\n\
                                - [ ] Set up repo\n\
                                - [ ] Add CI\n\
                                ## 5. Support Aider\n\
                                - [ ] Detect aider\n\
                                - [ ] Write config\n\
                                - [ ] Document\n";

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn matched_section_becomes_reference_and_child() {
        let outline = parse_outline(TWO_SECTIONS);
        let known = KnownCapabilities::new(["support-aider"]);
        let plan = split_sections(&outline, &known, ChildLayout::default());

        assert!(plan.has_hierarchy());
        assert_eq!(ids(&plan.root_tasks), vec!["1.1", "1.2", "5.1"]);
        let reference = &plan.root_tasks[2];
        assert_eq!(
            reference.children.as_deref(),
            Some("$ref:specs/support-aider/tasks.jsonc")
        );
        assert_eq!(reference.section, "Support Aider");
        assert_eq!(plan.root_tasks[0].section, "Foundation");
        assert!(plan.root_tasks[0].children.is_none());

        let child = &plan.children[0];
        assert_eq!(child.capability, "support-aider");
        assert_eq!(child.parent, "5.1");
        assert_eq!(child.rel_path, "specs/support-aider/tasks.jsonc");
        assert_eq!(ids(&child.tasks), vec!["5.1", "5.2", "5.3"]);
        assert!(child
            .tasks
            .iter()
            .all(|t| t.section.is_empty() && t.children.is_none()));
        assert_eq!(child.tasks[1].description, "Write config");
    }

    #[test]
    fn reference_keeps_section_position() {
        let outline = parse_outline(
            "- [ ] loose\n## Alpha\n- [ ] a\n## Beta\n- [ ] b1\n- [ ] b2\n## Gamma\n- [ ] g\n",
        );
        let known = KnownCapabilities::new(["beta"]);
        let plan = split_sections(&outline, &known, ChildLayout::default());
        assert_eq!(ids(&plan.root_tasks), vec!["1", "1.1", "2.1", "3.1"]);
        assert!(plan.root_tasks[2].is_reference());
        assert!(!plan.root_tasks[3].is_reference());
    }

    #[test]
    fn no_match_keeps_everything_in_root() {
        let outline = parse_outline(TWO_SECTIONS);
        let plan = split_sections(&outline, &KnownCapabilities::default(), ChildLayout::default());
        assert!(!plan.has_hierarchy());
        assert_eq!(plan.root_tasks, flatten(&outline));
    }

    #[test]
    fn matched_section_without_tasks_emits_nothing() {
        let outline = parse_outline("## Empty Cap\n## Other\n- [ ] x\n");
        let known = KnownCapabilities::new(["empty-cap"]);
        let plan = split_sections(&outline, &known, ChildLayout::default());
        assert!(!plan.has_hierarchy());
        assert_eq!(ids(&plan.root_tasks), vec!["2.1"]);
    }

    #[test]
    fn second_section_with_same_capability_stays_in_root() {
        let outline = parse_outline("## Support Aider\n- [ ] a\n## support aider\n- [ ] b\n");
        let known = KnownCapabilities::new(["support-aider"]);
        let plan = split_sections(&outline, &known, ChildLayout::default());
        assert_eq!(plan.children.len(), 1);
        assert_eq!(ids(&plan.root_tasks), vec!["1.1", "2.1"]);
        assert!(!plan.root_tasks[1].is_reference());
    }

    #[test]
    fn custom_layout_shapes_paths() {
        let outline = parse_outline("## Cap\n- [ ] a\n## B\n- [ ] b\n");
        let layout = ChildLayout {
            specs_dir: "caps",
            file: "todo.jsonc",
        };
        let plan = split_sections(&outline, &KnownCapabilities::new(["cap"]), layout);
        assert_eq!(plan.children[0].rel_path, "caps/cap/todo.jsonc");
        assert_eq!(layout.include_glob(), "caps/*/todo.jsonc");
    }

    fn outline_with_lines(n: usize, sections: usize) -> Outline {
        let mut lines = Vec::new();
        for s in 0..sections {
            lines.push(format!("## Section {s}"));
            lines.push("- [ ] task".to_string());
        }
        while lines.len() < n {
            lines.push("filler".to_string());
        }
        parse_outline(&lines.join("\n"))
    }

    #[test]
    fn split_threshold_boundary() {
        let at = outline_with_lines(100, 2);
        assert_eq!(at.line_count, 100);
        assert!(!should_split(&at, DEFAULT_SPLIT_THRESHOLD, true));

        let over = outline_with_lines(101, 2);
        assert!(should_split(&over, DEFAULT_SPLIT_THRESHOLD, true));
        assert!(!should_split(&over, DEFAULT_SPLIT_THRESHOLD, false));
    }

    #[test]
    fn single_section_never_splits() {
        let long = outline_with_lines(500, 1);
        assert!(!should_split(&long, DEFAULT_SPLIT_THRESHOLD, true));
        let none = outline_with_lines(500, 0);
        assert!(!should_split(&none, DEFAULT_SPLIT_THRESHOLD, true));
    }

    #[test]
    fn groups_consecutive_parent_ids() {
        let tasks: Vec<Task> = ["1.1.1", "1.1.2", "1.2.1", "1.1.3", "2", "3"]
            .iter()
            .map(|id| Task::new(*id, "", "x"))
            .collect();
        let groups = group_by_parent_id(&tasks);
        let shape: Vec<(&str, usize)> = groups
            .iter()
            .map(|g| (g.prefix.as_str(), g.tasks.len()))
            .collect();
        assert_eq!(shape, vec![("1.1", 2), ("1.2", 1), ("1.1", 1), ("", 2)]);
    }

    #[test]
    fn oversized_sections_are_reported() {
        let mut text = String::from("## Small\n- [ ] a\n## Big\n");
        for i in 0..120 {
            text.push_str(&format!("- [ ] task {i}\n"));
        }
        let outline = parse_outline(&text);
        let big = oversized_sections(&outline, DEFAULT_SPLIT_THRESHOLD);
        assert_eq!(big.len(), 1);
        assert_eq!(big[0].name, "Big");
        assert_eq!(big[0].line_count, 121);
        assert_eq!(big[0].groups.len(), 1);
        assert_eq!(big[0].groups[0].prefix, "2");
        assert_eq!(big[0].groups[0].tasks.len(), 120);
    }

    #[test]
    fn oversized_section_is_not_subdivided() {
        let mut text = String::from("## Small\n- [ ] a\n## Big\n");
        for i in 0..120 {
            text.push_str(&format!("- [ ] task {i}\n"));
        }
        let outline = parse_outline(&text);
        let lookup = KnownCapabilities::new(["big"]);
        let plan = split_sections(&outline, &lookup, ChildLayout::default());
        assert_eq!(plan.children.len(), 1);
        assert_eq!(plan.children[0].tasks.len(), 120);
        assert_eq!(oversized_sections(&outline, DEFAULT_SPLIT_THRESHOLD).len(), 1);
    }
}
