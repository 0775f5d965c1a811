use crate::error::{Result, SyncError};
use regex::Regex;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File and directory names
// ---------------------------------------------------------------------------

pub const OUTLINE_FILE: &str = "tasks.md";
pub const TASKS_FILE: &str = "tasks.jsonc";
pub const SPECS_DIR: &str = "specs";
pub const CAPABILITY_MARKER: &str = "spec.md";
pub const CONFIG_FILE: &str = "tasksync.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(change_dir: &Path) -> PathBuf {
    change_dir.join(CONFIG_FILE)
}

/// `specs/<capability>/tasks.jsonc`, always `/`-separated since it is
/// written into `$ref:` pointers.
pub fn child_rel_path(specs_dir: &str, capability: &str, file: &str) -> String {
    format!("{specs_dir}/{capability}/{file}")
}

/// Glob published in a root document's `includes`; matches every
/// [`child_rel_path`] for the same `specs_dir` and `file`.
pub fn include_glob(specs_dir: &str, file: &str) -> String {
    format!("{specs_dir}/*/{file}")
}

/// Join a `/`-separated relative path onto `base`.
pub fn join_rel(base: &Path, rel: &str) -> PathBuf {
    rel.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .fold(base.to_path_buf(), |acc, seg| acc.join(seg))
}

// ---------------------------------------------------------------------------
// Include resolution
// ---------------------------------------------------------------------------

fn has_wildcard(segment: &str) -> bool {
    segment.contains(&['*', '?'][..])
}

fn segment_regex(segment: &str) -> Result<Regex> {
    let mut pattern = String::from("^");
    for c in segment.chars() {
        match c {
            '*' => pattern.push_str("[^/]*"),
            '?' => pattern.push_str("[^/]"),
            _ => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
        .map_err(|e| SyncError::InvalidConfig(format!("bad include pattern '{segment}': {e}")))
}

/// Resolve an `includes` glob relative to `base`, returning matching files in
/// sorted order. `*` and `?` match within a single path segment. Absolute
/// patterns and patterns that climb out of `base` match nothing.
pub fn resolve_includes(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let segments: Vec<&str> = pattern
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    if segments.is_empty() || pattern.starts_with('/') || segments.contains(&"..") {
        tracing::warn!(pattern, "ignoring include pattern outside the document tree");
        return Ok(Vec::new());
    }

    let mut candidates = vec![base.to_path_buf()];
    for segment in segments {
        let mut next = Vec::new();
        if has_wildcard(segment) {
            let re = segment_regex(segment)?;
            for dir in candidates.iter().filter(|d| d.is_dir()) {
                for entry in std::fs::read_dir(dir)? {
                    let entry = entry?;
                    let name = entry.file_name();
                    let Some(name) = name.to_str() else {
                        continue;
                    };
                    if name.starts_with('.') && !segment.starts_with('.') {
                        continue;
                    }
                    if re.is_match(name) {
                        next.push(entry.path());
                    }
                }
            }
        } else {
            next.extend(
                candidates
                    .iter()
                    .map(|d| d.join(segment))
                    .filter(|p| p.exists()),
            );
        }
        candidates = next;
    }

    let mut files: Vec<PathBuf> = candidates.into_iter().filter(|p| p.is_file()).collect();
    files.sort();
    files.dedup();
    Ok(files)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(base: &Path, rel: &str) {
        let path = join_rel(base, rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "{}").unwrap();
    }

    #[test]
    fn child_paths_match_published_glob() {
        assert_eq!(
            child_rel_path(SPECS_DIR, "support-aider", TASKS_FILE),
            "specs/support-aider/tasks.jsonc"
        );
        assert_eq!(include_glob(SPECS_DIR, TASKS_FILE), "specs/*/tasks.jsonc");
    }

    #[test]
    fn join_rel_splits_on_slash() {
        let p = join_rel(Path::new("/tmp/change"), "specs/a/./tasks.jsonc");
        assert_eq!(p, PathBuf::from("/tmp/change/specs/a/tasks.jsonc"));
    }

    #[test]
    fn resolves_star_segment_sorted() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "specs/zeta/tasks.jsonc");
        touch(dir.path(), "specs/alpha/tasks.jsonc");
        touch(dir.path(), "specs/alpha/other.jsonc");
        std::fs::create_dir_all(dir.path().join("specs/empty")).unwrap();
        touch(dir.path(), "specs/.hidden/tasks.jsonc");

        let found = resolve_includes(dir.path(), "specs/*/tasks.jsonc").unwrap();
        assert_eq!(
            found,
            vec![
                dir.path().join("specs/alpha/tasks.jsonc"),
                dir.path().join("specs/zeta/tasks.jsonc"),
            ]
        );
    }

    #[test]
    fn question_mark_matches_one_char() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a1.jsonc");
        touch(dir.path(), "a22.jsonc");
        let found = resolve_includes(dir.path(), "a?.jsonc").unwrap();
        assert_eq!(found, vec![dir.path().join("a1.jsonc")]);
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "x/a+b(1).jsonc");
        touch(dir.path(), "x/aab1.jsonc");
        let found = resolve_includes(dir.path(), "x/a+b(*).jsonc").unwrap();
        assert_eq!(found, vec![dir.path().join("x/a+b(1).jsonc")]);
    }

    #[test]
    fn traversal_patterns_match_nothing() {
        let dir = TempDir::new().unwrap();
        let inner = dir.path().join("change");
        std::fs::create_dir_all(&inner).unwrap();
        touch(dir.path(), "secret.jsonc");
        assert!(resolve_includes(&inner, "../*.jsonc").unwrap().is_empty());
        assert!(resolve_includes(&inner, "/etc/*").unwrap().is_empty());
        assert!(resolve_includes(&inner, "").unwrap().is_empty());
    }

    #[test]
    fn missing_directory_matches_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(resolve_includes(dir.path(), "specs/*/tasks.jsonc")
            .unwrap()
            .is_empty());
    }
}
