use crate::error::{Result, SyncError};
use crate::io;
use crate::jsonc;
use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// TasksDocument
// ---------------------------------------------------------------------------

/// A persisted task document.
///
/// The wire format carries a numeric `version` plus optional `parent` and
/// `includes`; in memory the three legal shapes are distinct variants so a
/// flat document can never carry a parent and a child can never carry
/// includes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDocument", into = "RawDocument")]
pub enum TasksDocument {
    /// `version: 1`, everything in one file.
    Flat { tasks: Vec<Task> },
    /// `version: 2` root that pulls in child documents via `includes`.
    Root { includes: Vec<String>, tasks: Vec<Task> },
    /// `version: 2` document owned by the root task `parent`.
    Child { parent: String, tasks: Vec<Task> },
}

impl TasksDocument {
    pub fn version(&self) -> u32 {
        match self {
            TasksDocument::Flat { .. } => 1,
            TasksDocument::Root { .. } | TasksDocument::Child { .. } => 2,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        match self {
            TasksDocument::Flat { tasks }
            | TasksDocument::Root { tasks, .. }
            | TasksDocument::Child { tasks, .. } => tasks,
        }
    }

    pub fn tasks_mut(&mut self) -> &mut Vec<Task> {
        match self {
            TasksDocument::Flat { tasks }
            | TasksDocument::Root { tasks, .. }
            | TasksDocument::Child { tasks, .. } => tasks,
        }
    }

    pub fn parent(&self) -> Option<&str> {
        match self {
            TasksDocument::Child { parent, .. } => Some(parent),
            _ => None,
        }
    }

    pub fn includes(&self) -> &[String] {
        match self {
            TasksDocument::Root { includes, .. } => includes,
            _ => &[],
        }
    }

    /// Comment banner written ahead of the JSON value. Only child documents
    /// carry one; it is derived from the document so rewrites reproduce it.
    pub fn banner(&self) -> Option<String> {
        let parent = self.parent()?;
        Some(format!(
            "// Child task document for parent task {parent}.\n\
             // Generated by tasksync from the change outline; edit the outline and re-run sync.\n"
        ))
    }

    /// Serialize with banner, then prove the output reads back to `self`.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(self)?;
        let mut out = self.banner().unwrap_or_default();
        out.push_str(&json);
        out.push('\n');
        jsonc::validate_round_trip(&out, self)?;
        Ok(out)
    }

    pub fn decode(text: &str) -> Result<Self> {
        Ok(jsonc::parse_checked(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        jsonc::parse_checked(&text).map_err(|e| SyncError::InvalidDocument {
            path: path.to_path_buf(),
            reason: format!("{} ({})", e.message, e.kind),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.encode()?;
        io::write_document(path, text.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDocument {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    includes: Option<Vec<String>>,
    #[serde(default)]
    tasks: Vec<Task>,
}

impl TryFrom<RawDocument> for TasksDocument {
    type Error = String;

    fn try_from(raw: RawDocument) -> std::result::Result<Self, Self::Error> {
        let parent = raw.parent.filter(|p| !p.is_empty());
        match (raw.version, parent, raw.includes) {
            (1, None, None) => Ok(TasksDocument::Flat { tasks: raw.tasks }),
            (1, _, _) => Err("version 1 documents cannot have parent or includes".into()),
            (2, Some(_), Some(_)) => {
                Err("version 2 documents cannot have both parent and includes".into())
            }
            (2, Some(parent), None) => Ok(TasksDocument::Child {
                parent,
                tasks: raw.tasks,
            }),
            (2, None, includes) => Ok(TasksDocument::Root {
                includes: includes.unwrap_or_default(),
                tasks: raw.tasks,
            }),
            (v, _, _) => Err(format!("unsupported document version {v}")),
        }
    }
}

impl From<TasksDocument> for RawDocument {
    fn from(doc: TasksDocument) -> Self {
        let version = doc.version();
        match doc {
            TasksDocument::Flat { tasks } => RawDocument {
                version,
                parent: None,
                includes: None,
                tasks,
            },
            TasksDocument::Root { includes, tasks } => RawDocument {
                version,
                parent: None,
                includes: Some(includes),
                tasks,
            },
            TasksDocument::Child { parent, tasks } => RawDocument {
                version,
                parent: Some(parent),
                includes: None,
                tasks,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskStatus;
    use tempfile::TempDir;

    fn adversarial_descriptions() -> Vec<String> {
        vec![
            String::new(),
            "   \t  ".into(),
            "\u{0}\u{1}\u{7}\u{8}\u{b}\u{c}\u{1b}[31mred\u{7f}".into(),
            "zero\u{200b}width\u{200c}\u{200d}\u{feff} and \u{202e}rtl override\u{202c} \u{200f}".into(),
            "\"\"\"\\\\\\\"\\\"\"'''`".into(),
            "\\".repeat(64),
            "\"".repeat(64),
            "\", \"status\": \"completed\", \"id\": \"999".into(),
            "}]} {\"version\": 9".into(),
            "<script>alert('x')</script><img src=x onerror=alert(1)>".into(),
            "../../../../etc/passwd ..\\..\\windows\\system32".into(),
            "%s %d %n %x {0} ${HOME} $(rm -rf /)".into(),
            "// line comment\n/* block */ */ /* // \\// \\/* trailing //".into(),
            "multi\nline\r\nwith\ttabs".into(),
            "emoji 👨‍👩‍👧‍👦 combining e\u{301}\u{302} 中文 العربية".into(),
        ]
    }

    #[test]
    fn adversarial_descriptions_round_trip() {
        for desc in adversarial_descriptions() {
            let mut task = Task::new("1.1", "Section // with /* comment */", desc.clone());
            task.status = TaskStatus::InProgress;
            for doc in [
                TasksDocument::Flat {
                    tasks: vec![task.clone()],
                },
                TasksDocument::Child {
                    parent: "1.1".into(),
                    tasks: vec![task.detached()],
                },
            ] {
                let text = doc.encode().unwrap();
                let back = TasksDocument::decode(&text).unwrap();
                assert_eq!(back, doc, "round trip failed for {desc:?}");
                assert_eq!(back.tasks()[0].description, desc);
            }
        }
    }

    #[test]
    fn wire_shape_per_variant() {
        let flat = TasksDocument::Flat {
            tasks: vec![Task::new("1", "", "a")],
        };
        let v: serde_json::Value = serde_json::to_value(&flat).unwrap();
        assert_eq!(v["version"], 1);
        assert!(v.get("parent").is_none());
        assert!(v.get("includes").is_none());

        let root = TasksDocument::Root {
            includes: vec!["specs/*/tasks.jsonc".into()],
            tasks: vec![],
        };
        let v: serde_json::Value = serde_json::to_value(&root).unwrap();
        assert_eq!(v["version"], 2);
        assert_eq!(v["includes"][0], "specs/*/tasks.jsonc");
        assert!(v.get("parent").is_none());

        let child = TasksDocument::Child {
            parent: "5.1".into(),
            tasks: vec![],
        };
        let v: serde_json::Value = serde_json::to_value(&child).unwrap();
        assert_eq!(v["parent"], "5.1");
        assert!(v.get("includes").is_none());
    }

    #[test]
    fn encode_uses_two_space_indent_and_banner() {
        let child = TasksDocument::Child {
            parent: "5.1".into(),
            tasks: vec![Task::new("5.1", "", "a")],
        };
        let text = child.encode().unwrap();
        assert!(text.starts_with("// Child task document for parent task 5.1."));
        assert!(text.contains("\n{\n  \"version\": 2,\n  \"parent\": \"5.1\""));
        assert!(text.ends_with("}\n"));

        let flat = TasksDocument::Flat { tasks: vec![] };
        assert!(flat.encode().unwrap().starts_with('{'));
    }

    #[test]
    fn rejects_illegal_shapes() {
        for text in [
            r#"{"version": 1, "parent": "1", "tasks": []}"#,
            r#"{"version": 1, "includes": [], "tasks": []}"#,
            r#"{"version": 2, "parent": "1", "includes": [], "tasks": []}"#,
            r#"{"version": 3, "tasks": []}"#,
        ] {
            assert!(TasksDocument::decode(text).is_err(), "accepted {text}");
        }
    }

    #[test]
    fn empty_parent_reads_as_root() {
        let doc = TasksDocument::decode(r#"{"version": 2, "parent": "", "tasks": []}"#).unwrap();
        assert_eq!(
            doc,
            TasksDocument::Root {
                includes: vec![],
                tasks: vec![]
            }
        );
    }

    #[test]
    fn load_reports_path_on_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.jsonc");
        std::fs::write(&path, "{ not json").unwrap();
        match TasksDocument::load(&path) {
            Err(SyncError::InvalidDocument { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected InvalidDocument, got {other:?}"),
        }
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("specs/a/tasks.jsonc");
        let doc = TasksDocument::Child {
            parent: "2.1".into(),
            tasks: vec![Task::new("2.1", "", "x")],
        };
        doc.save(&path).unwrap();
        assert_eq!(TasksDocument::load(&path).unwrap(), doc);
    }
}
