use std::path::{Path, PathBuf};
use tasksync_core::paths;

/// Resolve the change directory.
///
/// Priority:
/// 1. `--dir` flag / `TASKSYNC_DIR` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `tasks.md`
/// 3. Fall back to `cwd`
pub fn resolve_change_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_outline_dir(&cwd).unwrap_or(cwd)
}

/// Anchor a user-supplied path at the change directory. Absolute paths are
/// returned unchanged.
pub fn in_change_dir(dir: &Path, path: &Path) -> PathBuf {
    dir.join(path)
}

fn find_outline_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(paths::OUTLINE_FILE).is_file())
        .map(Path::to_path_buf)
}
