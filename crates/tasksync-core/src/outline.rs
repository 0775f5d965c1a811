use crate::error::{Result, SyncError};
use crate::task::{self, Task};
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Section / Outline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub name: String,
    pub number: String,
    /// 1-indexed line of the `## ` header.
    pub start_line: usize,
    /// 1-indexed, inclusive.
    pub end_line: usize,
    pub tasks: Vec<Task>,
}

impl Section {
    pub fn line_count(&self) -> usize {
        if self.start_line == 0 || self.end_line < self.start_line {
            0
        } else {
            self.end_line - self.start_line + 1
        }
    }
}

/// Parsed outline: tasks that appear before any header, then every section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub loose_tasks: Vec<Task>,
    pub sections: Vec<Section>,
    pub line_count: usize,
}

impl Outline {
    /// Every task in document order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.loose_tasks
            .iter()
            .chain(self.sections.iter().flat_map(|s| s.tasks.iter()))
    }

    pub fn task_count(&self) -> usize {
        self.tasks().count()
    }

    pub fn is_empty(&self) -> bool {
        self.task_count() == 0
    }

    /// One past the highest section component of any task ID, or `None`
    /// when that would overflow.
    pub fn next_section_number(&self) -> Option<u64> {
        self.tasks()
            .filter_map(|t| task::section_component(&t.id))
            .max()
            .map_or(Some(1), |n| n.checked_add(1))
    }
}

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Header {
        explicit: Option<u64>,
        name: &'a str,
    },
    Task {
        description: &'a str,
    },
    Continuation(&'a str),
    Blank,
    Other,
}

/// Explicit header numbers above this are treated like unparseable ones: the
/// header is numbered implicitly and the digits stay in its name.
pub const MAX_SECTION_NUMBER: u64 = u32::MAX as u64;

static NUMBERED_NAME_RE: OnceLock<Regex> = OnceLock::new();
static TASK_RE: OnceLock<Regex> = OnceLock::new();
static ID_TOKEN_RE: OnceLock<Regex> = OnceLock::new();
static CONTINUATION_RE: OnceLock<Regex> = OnceLock::new();

fn numbered_name_re() -> &'static Regex {
    NUMBERED_NAME_RE.get_or_init(|| Regex::new(r"^(\d+)\.(?:\s+|$)").unwrap())
}

fn task_re() -> &'static Regex {
    TASK_RE.get_or_init(|| Regex::new(r"^- \[[ xX]\]").unwrap())
}

fn id_token_re() -> &'static Regex {
    ID_TOKEN_RE.get_or_init(|| Regex::new(r"^\d+(?:\.\d+)*\.?(?:\s+|$)").unwrap())
}

fn continuation_re() -> &'static Regex {
    CONTINUATION_RE.get_or_init(|| Regex::new(r"^[ \t]+(?:-|\d+\.)").unwrap())
}

fn classify(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    if let Some(rest) = line.strip_prefix("## ") {
        let rest = rest.trim();
        if let Some(caps) = numbered_name_re().captures(rest) {
            let explicit = caps[1]
                .parse::<u64>()
                .ok()
                .filter(|n| *n <= MAX_SECTION_NUMBER);
            if let Some(n) = explicit {
                let name = &rest[caps[0].len()..];
                return Line::Header {
                    explicit: Some(n),
                    name: name.trim_end(),
                };
            }
        }
        return Line::Header {
            explicit: None,
            name: rest,
        };
    }
    if let Some(m) = task_re().find(line) {
        let rest = line[m.end()..].trim_start();
        let description = match id_token_re().find(rest) {
            Some(token) => &rest[token.end()..],
            None => rest,
        };
        return Line::Task { description };
    }
    if continuation_re().is_match(line) {
        return Line::Continuation(line);
    }
    Line::Other
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ScanState {
    #[default]
    Idle,
    /// The previous line was a task or one of its continuation lines.
    Capturing,
}

#[derive(Debug, Default)]
struct Scan {
    outline: Outline,
    state: ScanState,
    max_section: u64,
}

impl Scan {
    fn step(mut self, line_no: usize, line: &str) -> Self {
        self.state = match (self.state, classify(line)) {
            (_, Line::Header { explicit, name }) => {
                self.open_section(line_no, explicit, name);
                ScanState::Idle
            }
            (_, Line::Task { description }) => {
                self.push_task(description);
                ScanState::Capturing
            }
            (ScanState::Capturing, Line::Continuation(text)) => {
                if let Some(task) = self.last_task_mut() {
                    task.description.push('\n');
                    task.description.push_str(text);
                }
                ScanState::Capturing
            }
            (_, Line::Continuation(_) | Line::Blank | Line::Other) => ScanState::Idle,
        };
        self
    }

    fn open_section(&mut self, line_no: usize, explicit: Option<u64>, name: &str) {
        if let Some(prev) = self.outline.sections.last_mut() {
            prev.end_line = line_no - 1;
        }
        let number = match explicit {
            Some(n) => n,
            None => self.max_section.saturating_add(1),
        };
        self.max_section = self.max_section.max(number);
        self.outline.sections.push(Section {
            name: name.to_string(),
            number: number.to_string(),
            start_line: line_no,
            end_line: line_no,
            tasks: Vec::new(),
        });
    }

    fn push_task(&mut self, description: &str) {
        match self.outline.sections.last_mut() {
            Some(section) => {
                let id = format!("{}.{}", section.number, section.tasks.len() + 1);
                let task = Task::new(id, section.name.clone(), description);
                section.tasks.push(task);
            }
            None => {
                let id = (self.outline.loose_tasks.len() + 1).to_string();
                self.outline.loose_tasks.push(Task::new(id, "", description));
            }
        }
    }

    fn last_task_mut(&mut self) -> Option<&mut Task> {
        match self.outline.sections.last_mut() {
            Some(section) => section.tasks.last_mut(),
            None => self.outline.loose_tasks.last_mut(),
        }
    }

    fn finish(mut self, line_count: usize) -> Outline {
        if let Some(last) = self.outline.sections.last_mut() {
            last.end_line = line_count.max(last.start_line);
        }
        self.outline.line_count = line_count;
        self.outline
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse outline text. Never fails: malformed ID tokens are discarded and
/// IDs are recomputed from structure.
pub fn parse_outline(text: &str) -> Outline {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let line_count = text.lines().count();
    text.lines()
        .enumerate()
        .fold(Scan::default(), |scan, (i, line)| scan.step(i + 1, line))
        .finish(line_count)
}

pub fn parse_outline_file(path: &Path) -> Result<Outline> {
    if !path.is_file() {
        return Err(SyncError::OutlineNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    Ok(parse_outline(&text))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
